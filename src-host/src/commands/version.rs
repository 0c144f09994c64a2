//! Version stamp commands

use shortcut_core::VersionStamp;

use super::CommandResult;
use crate::state::AppState;

pub fn get_info(state: &AppState) -> CommandResult<Option<VersionStamp>> {
    match state.with_context(|ctx| Ok(ctx.version_info())) {
        Ok(stamp) => CommandResult::ok(stamp),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

pub fn is_first_run(state: &AppState) -> CommandResult<bool> {
    match state.with_context(|ctx| Ok(ctx.is_first_run())) {
        Ok(first) => CommandResult::ok(first),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

/// Wipe this environment's data and start over as a fresh install
pub fn reset(state: &AppState) -> CommandResult<()> {
    match state.with_context(|ctx| Ok(ctx.reset_to_new_install())) {
        Ok(ok) => CommandResult::from_flag(ok, "reset to new install"),
        Err(e) => CommandResult::err(e.to_string()),
    }
}
