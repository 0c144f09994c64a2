//! Shortcut Organizer - Privileged Host
//!
//! The UI process is unprivileged and stateless. It sends JSON requests on
//! our stdin; this process owns storage, the version stamp and launching.

mod bridge;
mod commands;
mod state;

use shortcut_core::Config;
use state::AppState;
use tokio::io::BufReader;

pub async fn run(config: Config) -> anyhow::Result<()> {
    // Initialize logging
    shortcut_core::init_logging();

    let state = tokio::task::spawn_blocking(move || AppState::new(config)).await?;
    tracing::info!("Shortcut Organizer host started");

    let stdin = BufReader::new(tokio::io::stdin());
    let result = bridge::serve(state.clone(), stdin, tokio::io::stdout()).await;

    tokio::task::spawn_blocking(move || state.shutdown()).await?;
    if let Err(e) = &result {
        tracing::error!(error = %e, "Bridge stopped with an error");
    }
    result
}
