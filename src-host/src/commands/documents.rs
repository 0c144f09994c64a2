//! Raw document commands (`save-data`, `load-data`, `delete-data`)

use serde::Deserialize;
use serde_json::Value;

use super::{CommandResult, KeyArgs};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SaveArgs {
    pub key: String,
    pub data: Value,
}

pub fn save_data(state: &AppState, args: SaveArgs) -> CommandResult<()> {
    match state.with_context(|ctx| ctx.save_document(&args.key, &args.data)) {
        Ok(()) => CommandResult::done(),
        Err(e) => CommandResult::err(format!("Failed to save data: {e}")),
    }
}

pub fn load_data(state: &AppState, args: KeyArgs) -> CommandResult<Option<Value>> {
    match state.with_context(|ctx| ctx.load_document(&args.key)) {
        Ok(data) => CommandResult::ok(data),
        Err(e) => CommandResult::err(format!("Failed to load data: {e}")),
    }
}

pub fn delete_data(state: &AppState, args: KeyArgs) -> CommandResult<()> {
    match state.with_context(|ctx| ctx.delete_document(&args.key)) {
        Ok(true) => CommandResult::done(),
        Ok(false) => CommandResult::err(format!("Data file not found: {}", args.key)),
        Err(e) => CommandResult::err(format!("Failed to delete data: {e}")),
    }
}
