//! Shortcut Organizer Storage Layer
//!
//! Two interchangeable record stores behind [`RecordStore`]:
//! SQLite (primary) and one-JSON-file-per-collection (fallback).
//! [`Storage`] is the façade the rest of the application talks to.

mod backend;
mod database;
mod error;
mod file_store;
mod migrations;
mod records;
mod store;

pub use backend::{BackendKind, RecordStore};
pub use database::Database;
pub use error::StorageError;
pub use file_store::{FileStore, WriteOutcome, DEFAULT_DEBOUNCE, DEV_PREFIX};
pub use records::{Category, Shortcut};
pub use store::{Storage, StorageConfig};

pub type Result<T> = std::result::Result<T, StorageError>;

/// Setting key holding the last selected category id.
pub const ACTIVE_CATEGORY_KEY: &str = "activeCategory";
