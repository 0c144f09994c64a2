//! Category commands

use shortcut_core::Category;

use super::{CommandResult, IdArgs};
use crate::state::AppState;

pub fn get_categories(state: &AppState) -> CommandResult<Vec<Category>> {
    match state.with_context(|ctx| Ok(ctx.storage().categories())) {
        Ok(categories) => CommandResult::ok(categories),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

pub fn add_category(state: &AppState, category: Category) -> CommandResult<()> {
    match state.with_context(|ctx| Ok(ctx.storage().add_category(&category))) {
        Ok(ok) => CommandResult::from_flag(ok, "add category"),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

pub fn update_category(state: &AppState, category: Category) -> CommandResult<()> {
    match state.with_context(|ctx| Ok(ctx.storage().update_category(&category))) {
        Ok(ok) => CommandResult::from_flag(ok, "update category"),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

/// Removes the category's shortcuts as well
pub fn delete_category(state: &AppState, args: IdArgs) -> CommandResult<()> {
    match state.with_context(|ctx| Ok(ctx.storage().delete_category(&args.id))) {
        Ok(ok) => CommandResult::from_flag(ok, "delete category"),
        Err(e) => CommandResult::err(e.to_string()),
    }
}
