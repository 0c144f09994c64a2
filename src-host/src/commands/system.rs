//! Process-level commands

use serde::Deserialize;

use super::CommandResult;

#[derive(Debug, Deserialize)]
pub struct LaunchArgs {
    pub path: String,
}

pub fn launch_app(args: LaunchArgs) -> CommandResult<()> {
    match shortcut_core::launch(&args.path) {
        Ok(_) => CommandResult::done(),
        Err(e) => {
            tracing::warn!(path = %args.path, error = %e, "Launch failed");
            CommandResult::err(e.to_string())
        }
    }
}

/// Acknowledged here; the bridge stops reading once the reply is written
pub fn force_quit() -> CommandResult<()> {
    tracing::info!("Force quit requested");
    CommandResult::done()
}
