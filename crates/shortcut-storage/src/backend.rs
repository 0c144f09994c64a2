//! Record store abstraction shared by both backends

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::records::{Category, Shortcut};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Embedded SQLite database
    Sqlite,
    /// One JSON file per collection
    Json,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Sqlite => "sqlite",
            BackendKind::Json => "json",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sql" | "db" => Ok(BackendKind::Sqlite),
            "json" | "file" | "flat-file" => Ok(BackendKind::Json),
            other => Err(format!("unknown storage backend: {other}")),
        }
    }
}

/// CRUD over categories, shortcuts and settings.
///
/// Implementations report failures as [`crate::StorageError`]; the
/// [`crate::Storage`] façade is where those get logged and swallowed.
pub trait RecordStore: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Whether deleting a category also removes its shortcuts
    fn cascades_deletes(&self) -> bool;

    fn categories(&self) -> Result<Vec<Category>>;
    fn add_category(&self, category: &Category) -> Result<()>;
    fn update_category(&self, category: &Category) -> Result<()>;
    fn delete_category(&self, category_id: &str) -> Result<()>;

    fn shortcuts(&self) -> Result<Vec<Shortcut>>;
    fn shortcuts_by_category(&self, category_id: &str) -> Result<Vec<Shortcut>>;
    fn add_shortcut(&self, shortcut: &Shortcut) -> Result<()>;
    fn update_shortcut(&self, shortcut: &Shortcut) -> Result<()>;
    fn delete_shortcut(&self, shortcut_id: &str) -> Result<()>;

    fn get_setting(&self, key: &str) -> Result<Option<String>>;
    fn set_setting(&self, key: &str, value: &str) -> Result<()>;

    /// Remove every category, shortcut and setting
    fn purge(&self) -> Result<()>;

    /// Push buffered writes to disk
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
