//! Shortcut commands

use serde::Deserialize;
use shortcut_core::Shortcut;

use super::{CommandResult, IdArgs};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryArgs {
    pub category_id: String,
}

pub fn get_shortcuts(state: &AppState) -> CommandResult<Vec<Shortcut>> {
    match state.with_context(|ctx| Ok(ctx.storage().shortcuts())) {
        Ok(shortcuts) => CommandResult::ok(shortcuts),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

pub fn get_shortcuts_by_category(
    state: &AppState,
    args: CategoryArgs,
) -> CommandResult<Vec<Shortcut>> {
    match state.with_context(|ctx| Ok(ctx.storage().shortcuts_by_category(&args.category_id))) {
        Ok(shortcuts) => CommandResult::ok(shortcuts),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

pub fn add_shortcut(state: &AppState, shortcut: Shortcut) -> CommandResult<()> {
    match state.with_context(|ctx| Ok(ctx.storage().add_shortcut(&shortcut))) {
        Ok(ok) => CommandResult::from_flag(ok, "add shortcut"),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

pub fn update_shortcut(state: &AppState, shortcut: Shortcut) -> CommandResult<()> {
    match state.with_context(|ctx| Ok(ctx.storage().update_shortcut(&shortcut))) {
        Ok(ok) => CommandResult::from_flag(ok, "update shortcut"),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

pub fn delete_shortcut(state: &AppState, args: IdArgs) -> CommandResult<()> {
    match state.with_context(|ctx| Ok(ctx.storage().delete_shortcut(&args.id))) {
        Ok(ok) => CommandResult::from_flag(ok, "delete shortcut"),
        Err(e) => CommandResult::err(e.to_string()),
    }
}
