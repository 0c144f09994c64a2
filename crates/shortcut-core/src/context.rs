//! Application bootstrap
//!
//! Owns everything the privileged side needs for one run: configuration,
//! the version stamp, the record store and the raw document store.

use serde_json::Value;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use shortcut_storage::{Category, FileStore, Storage, DEV_PREFIX};

use crate::config::Config;
use crate::error::CoreError;
use crate::organizer::Organizer;
use crate::version::{VersionCheck, VersionManager, VersionStamp};
use crate::Result;

/// Seeded on a fresh install: (id, name, icon, color)
pub const DEFAULT_CATEGORIES: [(&str, &str, &str, &str); 3] = [
    ("default-1", "Everyday Apps", "fas fa-desktop", "#3B82F6"),
    ("default-2", "Developer Tools", "fas fa-code", "#10B981"),
    ("default-3", "Office", "fas fa-file-alt", "#F59E0B"),
];

pub struct AppContext {
    config: Config,
    version: VersionManager,
    startup: VersionCheck,
    storage: Storage,
    documents: Option<FileStore>,
}

impl AppContext {
    pub fn open(config: Config) -> Self {
        if let Err(e) = fs::create_dir_all(&config.data_dir) {
            tracing::error!(
                dir = %config.data_dir.display(),
                error = %e,
                "Failed to create data directory"
            );
        }

        let version = VersionManager::new(config.version_path(), config.app_version.clone());
        let startup = version.check_version();

        let documents = match FileStore::open(
            &config.data_dir,
            config.environment.file_prefix(),
            Duration::ZERO,
        ) {
            Ok(store) => Some(store),
            Err(e) => {
                tracing::error!(error = %e, "Document store unavailable");
                None
            }
        };

        if startup.is_new_install {
            remove_database_files(&config.database_path());
            if let Some(documents) = &documents {
                if let Err(e) = documents.clear_all_data() {
                    tracing::error!(error = %e, "Failed to clear data files");
                }
            }
        }

        let storage = Storage::open(&config.storage_config());
        let context = Self {
            config,
            version,
            startup,
            storage,
            documents,
        };

        if context.startup.is_new_install {
            context.seed_defaults();
        }

        tracing::info!(
            environment = ?context.config.environment,
            backend = ?context.storage.kind(),
            new_install = context.startup.is_new_install,
            update = context.startup.is_update,
            "Application context ready"
        );
        context
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// How this run was classified at startup
    pub fn startup(&self) -> &VersionCheck {
        &self.startup
    }

    pub fn version_info(&self) -> Option<VersionStamp> {
        self.version.stamp()
    }

    pub fn is_first_run(&self) -> bool {
        self.version.is_first_run()
    }

    /// A state layer hydrated from the current store contents
    pub fn organizer(&self) -> Organizer {
        Organizer::load(self.storage.clone())
    }

    /// Wipe this environment's records and documents, restamp, reseed
    pub fn reset_to_new_install(&self) -> bool {
        let purged = self.storage.purge();
        if let Some(documents) = &self.documents {
            if let Err(e) = documents.clear_all_data() {
                tracing::error!(error = %e, "Failed to clear data files");
            }
        }

        let check = self.version.reset_to_new_install();
        let seeded = self.seed_defaults();
        tracing::info!(purged, seeded, version = %check.stamp.version, "Reset to new install");
        purged && seeded
    }

    fn seed_defaults(&self) -> bool {
        let mut ok = true;
        for (id, name, icon, color) in DEFAULT_CATEGORIES {
            ok &= self.storage.add_category(&Category::new(id, name, icon, color));
        }
        if ok {
            tracing::info!(count = DEFAULT_CATEGORIES.len(), "Seeded default categories");
        }
        ok
    }

    // === Raw documents ===

    pub fn save_document(&self, key: &str, data: &Value) -> Result<()> {
        validate_key(key)?;
        self.documents()?.write_data(key, data)?;
        tracing::debug!(key = %key, "Saved document");
        Ok(())
    }

    pub fn load_document(&self, key: &str) -> Result<Option<Value>> {
        validate_key(key)?;
        Ok(self.documents()?.read_data(key)?)
    }

    /// `false` when no document existed under `key`
    pub fn delete_document(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        Ok(self.documents()?.delete_data(key)?)
    }

    fn documents(&self) -> Result<&FileStore> {
        self.documents
            .as_ref()
            .ok_or_else(|| CoreError::Persist("documents: store unavailable".to_string()))
    }

    /// Flush buffered writes; called on shutdown
    pub fn shutdown(&self) {
        if !self.storage.flush() {
            tracing::warn!("Pending writes could not be flushed");
        }
        tracing::info!("Application context closed");
    }
}

/// Keys that would alias a record collection, the version stamp or the
/// other environment's files
const RESERVED_KEYS: [&str; 3] = ["categories", "shortcuts", "settings"];

fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !key.contains("..");
    if !valid {
        return Err(CoreError::Validation(format!("invalid document key: {key:?}")));
    }

    let lowered = key.to_ascii_lowercase();
    if RESERVED_KEYS.contains(&lowered.as_str())
        || lowered.contains("version")
        || lowered.starts_with(DEV_PREFIX)
    {
        return Err(CoreError::Validation(format!("reserved document key: {key:?}")));
    }
    Ok(())
}

fn remove_database_files(path: &Path) {
    let base = path.to_string_lossy().to_string();
    for candidate in [base.clone(), format!("{base}-wal"), format!("{base}-shm")] {
        match fs::remove_file(&candidate) {
            Ok(()) => tracing::info!(file = %candidate, "Removed previous database file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::error!(file = %candidate, error = %e, "Failed to remove database file"),
        }
    }
}
