//! Settings commands

use serde::Deserialize;

use super::{CommandResult, KeyArgs};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SetSettingArgs {
    pub key: String,
    pub value: String,
}

pub fn get_setting(state: &AppState, args: KeyArgs) -> CommandResult<Option<String>> {
    match state.with_context(|ctx| Ok(ctx.storage().get_setting(&args.key))) {
        Ok(value) => CommandResult::ok(value),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

pub fn set_setting(state: &AppState, args: SetSettingArgs) -> CommandResult<()> {
    match state.with_context(|ctx| Ok(ctx.storage().set_setting(&args.key, &args.value))) {
        Ok(ok) => CommandResult::from_flag(ok, "set setting"),
        Err(e) => CommandResult::err(e.to_string()),
    }
}
