//! Bridge commands
//!
//! Each command is a plain function over [`AppState`] returning a
//! [`CommandResult`]. [`dispatch`] routes a command name and its JSON
//! arguments to the matching function.

pub mod categories;
pub mod documents;
pub mod settings;
pub mod shortcuts;
pub mod system;
pub mod version;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::AppState;

pub const FORCE_QUIT: &str = "force-quit";

#[derive(Debug, Clone, Serialize)]
pub struct CommandResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

impl CommandResult<()> {
    /// Success without a payload
    pub fn done() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }

    /// Map a façade status flag onto a result
    pub fn from_flag(ok: bool, action: &str) -> Self {
        if ok {
            Self::done()
        } else {
            Self::err(format!("Failed to {action}"))
        }
    }
}

impl<T: Serialize> CommandResult<T> {
    pub fn into_value(self) -> CommandResult<Value> {
        let data = match self.data.map(serde_json::to_value).transpose() {
            Ok(data) => data,
            Err(e) => return CommandResult::err(format!("Failed to encode response: {e}")),
        };

        CommandResult {
            success: self.success,
            data,
            error: self.error,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IdArgs {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct KeyArgs {
    pub key: String,
}

fn parse_args<T: DeserializeOwned>(command: &str, args: Value) -> Result<T, String> {
    serde_json::from_value(args).map_err(|e| format!("Invalid arguments for {command}: {e}"))
}

macro_rules! with_args {
    ($command:expr, $args:expr, $handler:expr) => {
        match parse_args($command, $args) {
            Ok(args) => $handler(args).into_value(),
            Err(e) => CommandResult::err(e),
        }
    };
}

/// Route one request. Blocking: call from a blocking-capable thread.
pub fn dispatch(state: &AppState, command: &str, args: Value) -> CommandResult<Value> {
    tracing::debug!(command = %command, "Dispatching command");

    match command {
        "db-get-categories" => categories::get_categories(state).into_value(),
        "db-add-category" => with_args!(command, args, |c| categories::add_category(state, c)),
        "db-update-category" => {
            with_args!(command, args, |c| categories::update_category(state, c))
        }
        "db-delete-category" => {
            with_args!(command, args, |a| categories::delete_category(state, a))
        }

        "db-get-shortcuts" => shortcuts::get_shortcuts(state).into_value(),
        "db-get-shortcuts-by-category" => {
            with_args!(command, args, |a| shortcuts::get_shortcuts_by_category(state, a))
        }
        "db-add-shortcut" => with_args!(command, args, |s| shortcuts::add_shortcut(state, s)),
        "db-update-shortcut" => {
            with_args!(command, args, |s| shortcuts::update_shortcut(state, s))
        }
        "db-delete-shortcut" => {
            with_args!(command, args, |a| shortcuts::delete_shortcut(state, a))
        }

        "db-get-setting" => with_args!(command, args, |a| settings::get_setting(state, a)),
        "db-set-setting" => with_args!(command, args, |a| settings::set_setting(state, a)),

        "save-data" => with_args!(command, args, |a| documents::save_data(state, a)),
        "load-data" => with_args!(command, args, |a| documents::load_data(state, a)),
        "delete-data" => with_args!(command, args, |a| documents::delete_data(state, a)),

        "version-get-info" => version::get_info(state).into_value(),
        "version-is-first-run" => version::is_first_run(state).into_value(),
        "version-reset" => version::reset(state).into_value(),

        "launch-app" => with_args!(command, args, system::launch_app),
        FORCE_QUIT => system::force_quit().into_value(),

        other => {
            tracing::warn!(command = %other, "Unknown command");
            CommandResult::err(format!("Unknown command: {other}"))
        }
    }
}
