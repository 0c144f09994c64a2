//! Storage façade
//!
//! One handle over whichever backend could be opened. Nothing here returns
//! an error: failures are logged and reported as `false`, `None` or an
//! empty list, so a broken disk degrades to "looks empty" instead of a crash.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::backend::{BackendKind, RecordStore};
use crate::database::Database;
use crate::file_store::{FileStore, DEFAULT_DEBOUNCE};
use crate::records::{Category, Shortcut};
use crate::Result;

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Preferred backend; SQLite falls back to flat files when it cannot open
    pub backend: BackendKind,
    pub database_path: PathBuf,
    /// Directory holding the flat-file collections
    pub data_dir: PathBuf,
    /// Prefix applied to flat-file names (`dev-` for development)
    pub file_prefix: String,
    pub debounce: Duration,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf, database_file: &str) -> Self {
        Self {
            backend: BackendKind::Sqlite,
            database_path: data_dir.join(database_file),
            data_dir,
            file_prefix: String::new(),
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

#[derive(Clone)]
pub struct Storage {
    backend: Option<Arc<dyn RecordStore>>,
}

impl Storage {
    /// Open the preferred backend, falling back to flat files, then to
    /// degraded mode when neither can be opened.
    pub fn open(config: &StorageConfig) -> Self {
        let backend = match config.backend {
            BackendKind::Sqlite => match Database::open(&config.database_path) {
                Ok(db) => Some(Arc::new(db) as Arc<dyn RecordStore>),
                Err(e) => {
                    tracing::warn!(
                        path = %config.database_path.display(),
                        error = %e,
                        "SQLite unavailable, falling back to flat-file storage"
                    );
                    Self::open_file_store(config)
                }
            },
            BackendKind::Json => Self::open_file_store(config),
        };

        match &backend {
            Some(store) => tracing::info!(backend = %store.kind(), "Storage ready"),
            None => tracing::error!("No storage backend could be opened, running degraded"),
        }

        Self { backend }
    }

    fn open_file_store(config: &StorageConfig) -> Option<Arc<dyn RecordStore>> {
        match FileStore::open(&config.data_dir, &config.file_prefix, config.debounce) {
            Ok(store) => Some(Arc::new(store)),
            Err(e) => {
                tracing::error!(
                    dir = %config.data_dir.display(),
                    error = %e,
                    "Flat-file storage unavailable"
                );
                None
            }
        }
    }

    pub fn from_backend<S: RecordStore + 'static>(store: S) -> Self {
        Self {
            backend: Some(Arc::new(store)),
        }
    }

    /// A façade with no backend: reads are empty, writes fail
    pub fn unavailable() -> Self {
        Self { backend: None }
    }

    pub fn kind(&self) -> Option<BackendKind> {
        self.backend.as_ref().map(|b| b.kind())
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    pub fn cascades_deletes(&self) -> bool {
        self.backend
            .as_ref()
            .map(|b| b.cascades_deletes())
            .unwrap_or(false)
    }

    fn read<T: Default>(&self, what: &str, f: impl FnOnce(&dyn RecordStore) -> Result<T>) -> T {
        let Some(backend) = self.backend.as_deref() else {
            tracing::debug!(operation = what, "Storage unavailable, returning empty result");
            return T::default();
        };

        match f(backend) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(operation = what, error = %e, "Storage read failed");
                T::default()
            }
        }
    }

    fn write(&self, what: &str, f: impl FnOnce(&dyn RecordStore) -> Result<()>) -> bool {
        let Some(backend) = self.backend.as_deref() else {
            tracing::warn!(operation = what, "Storage unavailable, write dropped");
            return false;
        };

        match f(backend) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(operation = what, error = %e, "Storage write failed");
                false
            }
        }
    }

    // === Categories ===

    pub fn categories(&self) -> Vec<Category> {
        self.read("get categories", |b| b.categories())
    }

    pub fn add_category(&self, category: &Category) -> bool {
        self.write("add category", |b| b.add_category(category))
    }

    pub fn update_category(&self, category: &Category) -> bool {
        self.write("update category", |b| b.update_category(category))
    }

    /// Delete a category and its shortcuts on either backend. The flat-file
    /// cascade is two steps; shortcuts it fails to remove are logged and
    /// pruned the next time the store opens.
    pub fn delete_category(&self, category_id: &str) -> bool {
        if !self.write("delete category", |b| b.delete_category(category_id)) {
            return false;
        }
        if self.cascades_deletes() {
            return true;
        }

        for shortcut in self.shortcuts_by_category(category_id) {
            if !self.delete_shortcut(&shortcut.id) {
                tracing::warn!(
                    shortcut_id = %shortcut.id,
                    category_id = %category_id,
                    "Orphaned shortcut left behind, pruned on next open"
                );
            }
        }
        true
    }

    // === Shortcuts ===

    pub fn shortcuts(&self) -> Vec<Shortcut> {
        self.read("get shortcuts", |b| b.shortcuts())
    }

    pub fn shortcuts_by_category(&self, category_id: &str) -> Vec<Shortcut> {
        self.read("get shortcuts by category", |b| {
            b.shortcuts_by_category(category_id)
        })
    }

    pub fn add_shortcut(&self, shortcut: &Shortcut) -> bool {
        self.write("add shortcut", |b| b.add_shortcut(shortcut))
    }

    pub fn update_shortcut(&self, shortcut: &Shortcut) -> bool {
        self.write("update shortcut", |b| b.update_shortcut(shortcut))
    }

    pub fn delete_shortcut(&self, shortcut_id: &str) -> bool {
        self.write("delete shortcut", |b| b.delete_shortcut(shortcut_id))
    }

    // === Settings ===

    pub fn get_setting(&self, key: &str) -> Option<String> {
        self.read("get setting", |b| b.get_setting(key))
    }

    pub fn set_setting(&self, key: &str, value: &str) -> bool {
        self.write("set setting", |b| b.set_setting(key, value))
    }

    // === Maintenance ===

    pub fn purge(&self) -> bool {
        self.write("purge", |b| b.purge())
    }

    pub fn flush(&self) -> bool {
        self.write("flush", |b| b.flush())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn config(dir: &std::path::Path, backend: BackendKind) -> StorageConfig {
        StorageConfig {
            backend,
            database_path: dir.join("shortcuts.db"),
            data_dir: dir.to_path_buf(),
            file_prefix: String::new(),
            debounce: Duration::ZERO,
        }
    }

    fn exercise_cascade(storage: &Storage) {
        assert!(storage.add_category(&Category::new("c1", "Tools", "icon", "red")));
        assert!(storage.add_category(&Category::new("c2", "Office", "icon", "blue")));
        assert!(storage.add_shortcut(&Shortcut::new("s1", "Vim", "/usr/bin/vim", "icon", "c1")));
        assert!(storage.add_shortcut(&Shortcut::new("s2", "Calc", "/usr/bin/calc", "icon", "c2")));

        assert!(storage.delete_category("c1"));

        let categories = storage.categories();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].id, "c2");
        let shortcuts = storage.shortcuts();
        assert_eq!(shortcuts.len(), 1);
        assert_eq!(shortcuts[0].id, "s2");
    }

    #[test]
    fn test_sqlite_backend_selected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(&config(dir.path(), BackendKind::Sqlite));
        assert_eq!(storage.kind(), Some(BackendKind::Sqlite));
        assert!(storage.cascades_deletes());
        exercise_cascade(&storage);
    }

    #[test]
    fn test_json_backend_selected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(&config(dir.path(), BackendKind::Json));
        assert_eq!(storage.kind(), Some(BackendKind::Json));
        assert!(!storage.cascades_deletes());
        exercise_cascade(&storage);
    }

    #[test]
    fn test_falls_back_to_json_when_sqlite_cannot_open() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path(), BackendKind::Sqlite);
        cfg.database_path = dir.path().join("missing").join("nested").join("shortcuts.db");

        let storage = Storage::open(&cfg);
        assert_eq!(storage.kind(), Some(BackendKind::Json));
        assert!(storage.set_setting("activeCategory", "c1"));
        assert_eq!(storage.get_setting("activeCategory").as_deref(), Some("c1"));
    }

    #[test]
    fn test_degraded_when_nothing_opens() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "x").unwrap();

        let mut cfg = config(&blocker, BackendKind::Json);
        cfg.data_dir = blocker.clone();
        let storage = Storage::open(&cfg);

        assert!(!storage.is_available());
        assert!(storage.categories().is_empty());
        assert_eq!(storage.get_setting("activeCategory"), None);
        assert!(!storage.add_category(&Category::new("c1", "Tools", "icon", "red")));
        assert!(!storage.purge());
    }

    #[test]
    fn test_update_unknown_agrees_across_backends() {
        let dir = tempfile::tempdir().unwrap();
        let backends = [
            Storage::from_backend(Database::open_in_memory().unwrap()),
            Storage::open(&config(dir.path(), BackendKind::Json)),
        ];

        for storage in &backends {
            let ghost = Category::new("ghost", "Ghost", "icon", "gray");
            assert!(storage.update_category(&ghost));
            assert!(storage.update_shortcut(&Shortcut::new("s9", "Ghost", "/nowhere", "icon", "ghost")));
            assert!(storage.categories().is_empty());
            assert!(storage.shortcuts().is_empty());
        }
    }
}
