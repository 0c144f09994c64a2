//! Line-delimited JSON bridge
//!
//! One request per input line, one response per output line, in arrival
//! order. Requests run on the blocking pool since every command touches disk.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::commands::{self, CommandResult, FORCE_QUIT};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct Request {
    id: u64,
    command: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize)]
struct Response {
    id: u64,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Response {
    fn new(id: u64, result: CommandResult<Value>) -> Self {
        Self {
            id,
            success: result.success,
            data: result.data,
            error: result.error,
        }
    }
}

/// Serve requests until end of input or `force-quit`
pub async fn serve<R, W>(state: AppState, input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (response, quit) = match parse_request(line) {
            Ok(request) => {
                let Request { id, command, args } = request;
                let quit = command == FORCE_QUIT;
                let state = state.clone();
                let result =
                    tokio::task::spawn_blocking(move || commands::dispatch(&state, &command, args))
                        .await?;
                (Response::new(id, result), quit)
            }
            Err((id, error)) => {
                tracing::warn!(id, error = %error, "Malformed request");
                (Response::new(id, CommandResult::err(error)), false)
            }
        };

        let mut encoded = serde_json::to_vec(&response)?;
        encoded.push(b'\n');
        output.write_all(&encoded).await?;
        output.flush().await?;

        if quit {
            tracing::info!("Stopping bridge on request");
            break;
        }
    }

    Ok(())
}

/// Parse one line; on failure return the id if one could be recovered
fn parse_request(line: &str) -> std::result::Result<Request, (u64, String)> {
    let value: Value =
        serde_json::from_str(line).map_err(|e| (0, format!("Malformed request: {e}")))?;
    let id = value.get("id").and_then(Value::as_u64).unwrap_or(0);

    serde_json::from_value(value).map_err(|e| (id, format!("Malformed request: {e}")))
}
