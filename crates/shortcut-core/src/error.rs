//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] shortcut_storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to persist {0}")]
    Persist(String),

    #[error("Failed to launch {path}: {reason}")]
    Launch { path: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Application not initialized")]
    NotInitialized,
}
