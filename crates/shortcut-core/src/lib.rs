//! Shortcut Organizer Core
//!
//! Startup, version stamping and the application state layer.
//! The privileged side owns all persistent state; the UI only asks.
//!
//! [`Organizer`] is the state layer for a UI embedding this crate in-process.
//! The bridge host does not use it: its commands map one-to-one onto the
//! [`Storage`] façade, which already carries the category cascade.

mod config;
mod context;
mod error;
mod launcher;
mod organizer;
mod version;

pub use config::{Config, Environment};
pub use context::{AppContext, DEFAULT_CATEGORIES};
pub use error::CoreError;
pub use launcher::{clean_launch_path, launch};
pub use organizer::Organizer;
pub use version::{VersionCheck, VersionManager, VersionStamp};

// Re-export storage components
pub use shortcut_storage::{
    BackendKind, Category, Shortcut, Storage, StorageConfig, StorageError, ACTIVE_CATEGORY_KEY,
};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging on stderr; stdout is reserved for the bridge protocol
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if let Err(e) = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("Failed to initialize logging: {e}");
    }
}
