//! Flat-file record store
//!
//! One JSON document per collection (`categories`, `shortcuts`, `settings`),
//! rewritten whole on every mutation. Writes to the same file inside the
//! debounce window are coalesced: the payload is parked as *pending*, served
//! to readers, and written on the next physical write or on [`FileStore::flush`].

use chrono::Utc;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::backend::{BackendKind, RecordStore};
use crate::records::{Category, Shortcut};
use crate::Result;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// File-name prefix of the development data set
pub const DEV_PREFIX: &str = "dev-";

const CATEGORIES: &str = "categories";
const SHORTCUTS: &str = "shortcuts";
const SETTINGS: &str = "settings";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Data reached the disk
    Written,
    /// Arrived inside the debounce window; held as the pending value
    Coalesced,
}

#[derive(Default)]
struct WriteState {
    last_write: HashMap<String, Instant>,
    pending: HashMap<String, Value>,
}

pub struct FileStore {
    dir: PathBuf,
    prefix: String,
    debounce: Duration,
    state: Mutex<WriteState>,
    /// Serializes read-modify-write sequences
    mutation: Mutex<()>,
    writes: AtomicU64,
}

impl FileStore {
    pub fn open<P: AsRef<Path>>(dir: P, prefix: &str, debounce: Duration) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let store = Self {
            dir,
            prefix: prefix.to_string(),
            debounce,
            state: Mutex::new(WriteState::default()),
            mutation: Mutex::new(()),
            writes: AtomicU64::new(0),
        };

        let pruned = store.prune_orphaned_shortcuts()?;
        if pruned > 0 {
            tracing::warn!(pruned, "Removed shortcuts whose category no longer exists");
        }

        tracing::info!(dir = %store.dir.display(), prefix = %store.prefix, "Opened file store");
        Ok(store)
    }

    pub fn file_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}{}.json", self.prefix, name))
    }

    /// Number of physical file writes performed so far
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Read a document; missing or corrupt files read as `None`
    pub fn read_data<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let pending = self.state.lock().pending.get(name).cloned();
        if let Some(value) = pending {
            return Ok(Some(serde_json::from_value(value)?));
        }

        let path = self.file_path(name);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&contents) {
            Ok(data) => Ok(Some(data)),
            Err(e) => {
                quarantine(&path, &e);
                Ok(None)
            }
        }
    }

    pub fn write_data<T: Serialize + ?Sized>(&self, name: &str, data: &T) -> Result<WriteOutcome> {
        let value = serde_json::to_value(data)?;
        let mut state = self.state.lock();

        if let Some(last) = state.last_write.get(name) {
            if last.elapsed() < self.debounce {
                state.pending.insert(name.to_string(), value);
                tracing::trace!(file = %name, "Coalesced write inside debounce window");
                return Ok(WriteOutcome::Coalesced);
            }
        }

        self.write_file(name, &value)?;
        state.last_write.insert(name.to_string(), Instant::now());
        state.pending.remove(name);
        Ok(WriteOutcome::Written)
    }

    /// Write every pending document now, regardless of the debounce window
    pub fn flush(&self) -> Result<usize> {
        let mut state = self.state.lock();
        let names: Vec<String> = state.pending.keys().cloned().collect();

        for name in &names {
            if let Some(value) = state.pending.get(name) {
                self.write_file(name, value)?;
            }
            state.pending.remove(name);
            state.last_write.insert(name.clone(), Instant::now());
        }
        Ok(names.len())
    }

    /// Remove one document; `false` when there was nothing to remove
    pub fn delete_data(&self, name: &str) -> Result<bool> {
        {
            let mut state = self.state.lock();
            state.pending.remove(name);
            state.last_write.remove(name);
        }

        match fs::remove_file(self.file_path(name)) {
            Ok(()) => {
                tracing::debug!(file = %name, "Deleted data file");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete every JSON data file of this store's environment.
    /// Version stamp files are never touched.
    pub fn clear_all_data(&self) -> Result<usize> {
        {
            let mut state = self.state.lock();
            state.pending.clear();
            state.last_write.clear();
        }

        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().to_string();
            if !entry.file_type()?.is_file() || !self.owns_file(&file_name) {
                continue;
            }

            fs::remove_file(entry.path())?;
            tracing::debug!(file = %file_name, "Removed data file");
            removed += 1;
        }

        tracing::info!(removed, "Cleared data files");
        Ok(removed)
    }

    /// Drop shortcuts pointing at categories that no longer exist.
    /// Skipped when the categories document is missing or unreadable.
    pub fn prune_orphaned_shortcuts(&self) -> Result<usize> {
        let _guard = self.mutation.lock();

        let Some(categories) = self.read_data::<Vec<Category>>(CATEGORIES)? else {
            return Ok(0);
        };
        let mut shortcuts: Vec<Shortcut> = self.collection(SHORTCUTS)?;

        let before = shortcuts.len();
        shortcuts.retain(|s| categories.iter().any(|c| c.id == s.category_id));
        let pruned = before - shortcuts.len();

        if pruned > 0 {
            self.write_data(SHORTCUTS, &shortcuts)?;
        }
        Ok(pruned)
    }

    fn owns_file(&self, file_name: &str) -> bool {
        if !file_name.ends_with(".json") || file_name.contains("version") {
            return false;
        }
        if self.prefix.is_empty() {
            !file_name.starts_with(DEV_PREFIX)
        } else {
            file_name.starts_with(&self.prefix)
        }
    }

    fn write_file(&self, name: &str, value: &Value) -> Result<()> {
        let path = self.file_path(name);
        let tmp = path.with_extension("json.tmp");

        fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
        fs::rename(&tmp, &path)?;

        self.writes.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(file = %path.display(), "Wrote data file");
        Ok(())
    }

    fn collection<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>> {
        Ok(self.read_data(name)?.unwrap_or_default())
    }

    fn upsert<R: FileRecord>(&self, name: &str, record: &R) -> Result<()> {
        let _guard = self.mutation.lock();
        let mut records: Vec<R> = self.collection(name)?;

        let mut record = record.clone();
        match records.iter().position(|r| r.id() == record.id()) {
            Some(idx) => {
                record.restamp(&records[idx]);
                records[idx] = record;
            }
            None => records.push(record),
        }

        self.write_data(name, &records)?;
        Ok(())
    }

    /// Replace an existing record; unknown ids are left alone
    fn replace<R: FileRecord>(&self, name: &str, record: &R) -> Result<()> {
        let _guard = self.mutation.lock();
        let mut records: Vec<R> = self.collection(name)?;

        let Some(idx) = records.iter().position(|r| r.id() == record.id()) else {
            tracing::debug!(file = %name, id = %record.id(), "Update matched no record, nothing to do");
            return Ok(());
        };

        let mut record = record.clone();
        record.restamp(&records[idx]);
        records[idx] = record;

        self.write_data(name, &records)?;
        Ok(())
    }

    fn remove<R: FileRecord>(&self, name: &str, id: &str) -> Result<()> {
        let _guard = self.mutation.lock();
        let mut records: Vec<R> = self.collection(name)?;
        records.retain(|r| r.id() != id);

        self.write_data(name, &records)?;
        Ok(())
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::error!(error = %e, "Failed to flush pending writes");
        }
    }
}

impl RecordStore for FileStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Json
    }

    fn cascades_deletes(&self) -> bool {
        false
    }

    fn categories(&self) -> Result<Vec<Category>> {
        self.collection(CATEGORIES)
    }

    fn add_category(&self, category: &Category) -> Result<()> {
        self.upsert(CATEGORIES, category)
    }

    fn update_category(&self, category: &Category) -> Result<()> {
        self.replace(CATEGORIES, category)
    }

    fn delete_category(&self, category_id: &str) -> Result<()> {
        self.remove::<Category>(CATEGORIES, category_id)
    }

    fn shortcuts(&self) -> Result<Vec<Shortcut>> {
        self.collection(SHORTCUTS)
    }

    fn shortcuts_by_category(&self, category_id: &str) -> Result<Vec<Shortcut>> {
        let mut shortcuts: Vec<Shortcut> = self.collection(SHORTCUTS)?;
        shortcuts.retain(|s| s.category_id == category_id);
        Ok(shortcuts)
    }

    fn add_shortcut(&self, shortcut: &Shortcut) -> Result<()> {
        self.upsert(SHORTCUTS, shortcut)
    }

    fn update_shortcut(&self, shortcut: &Shortcut) -> Result<()> {
        self.replace(SHORTCUTS, shortcut)
    }

    fn delete_shortcut(&self, shortcut_id: &str) -> Result<()> {
        self.remove::<Shortcut>(SHORTCUTS, shortcut_id)
    }

    fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let settings: Option<BTreeMap<String, String>> = self.read_data(SETTINGS)?;
        Ok(settings.and_then(|mut s| s.remove(key)))
    }

    fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.mutation.lock();
        let mut settings: BTreeMap<String, String> =
            self.read_data(SETTINGS)?.unwrap_or_default();
        settings.insert(key.to_string(), value.to_string());

        self.write_data(SETTINGS, &settings)?;
        Ok(())
    }

    fn purge(&self) -> Result<()> {
        let _guard = self.mutation.lock();
        self.clear_all_data()?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        FileStore::flush(self)?;
        Ok(())
    }
}

/// Records kept in a JSON array, replaced by id
trait FileRecord: Clone + Serialize + DeserializeOwned {
    fn id(&self) -> &str;
    /// Carry the stored creation time over and mark the record updated
    fn restamp(&mut self, existing: &Self);
}

impl FileRecord for Category {
    fn id(&self) -> &str {
        &self.id
    }

    fn restamp(&mut self, existing: &Self) {
        self.created_at = existing.created_at;
        self.updated_at = Some(Utc::now());
    }
}

impl FileRecord for Shortcut {
    fn id(&self) -> &str {
        &self.id
    }

    fn restamp(&mut self, existing: &Self) {
        self.created_at = existing.created_at;
        self.updated_at = Some(Utc::now());
    }
}

/// Move an unparseable file aside so the next write cannot clobber it
fn quarantine(path: &Path, error: &serde_json::Error) {
    let target = path.with_extension("json.corrupt");
    match fs::rename(path, &target) {
        Ok(()) => tracing::warn!(
            file = %path.display(),
            moved_to = %target.display(),
            error = %error,
            "Corrupt data file, treating as empty"
        ),
        Err(e) => tracing::warn!(
            file = %path.display(),
            error = %error,
            rename_error = %e,
            "Corrupt data file could not be moved aside, treating as empty"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn store(dir: &Path) -> FileStore {
        FileStore::open(dir, "", Duration::ZERO).unwrap()
    }

    #[test]
    fn test_add_then_list_category() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let category = Category::new("c1", "Tools", "fas fa-code", "#10B981");

        store.add_category(&category).unwrap();

        let all = store.categories().unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].same_content(&category));
        assert!(dir.path().join("categories.json").exists());
    }

    #[test]
    fn test_update_preserves_created_at() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let original = Category::new("c1", "Tools", "fas fa-code", "#10B981");
        let other = Category::new("c2", "Office", "fas fa-file-alt", "blue");
        store.add_category(&original).unwrap();
        store.add_category(&other).unwrap();

        let mut edited = Category::new("c1", "Dev", "fas fa-terminal", "#000000");
        edited.created_at = original.created_at + chrono::Duration::days(1);
        store.update_category(&edited).unwrap();

        let all = store.categories().unwrap();
        assert_eq!(all.len(), 2);
        let updated = all.iter().find(|c| c.id == "c1").unwrap();
        assert_eq!(updated.name, "Dev");
        assert_eq!(updated.created_at, original.created_at);
        assert!(updated.updated_at.is_some());
        assert_eq!(all.iter().find(|c| c.id == "c2").unwrap(), &other);
    }

    #[test]
    fn test_update_unknown_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store
            .update_shortcut(&Shortcut::new("s1", "Vim", "/usr/bin/vim", "icon", "c1"))
            .unwrap();
        store
            .update_category(&Category::new("c1", "Tools", "icon", "red"))
            .unwrap();
        assert!(store.shortcuts().unwrap().is_empty());
        assert!(store.categories().unwrap().is_empty());
    }

    #[test]
    fn test_delete_category_does_not_cascade() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store
            .add_category(&Category::new("c1", "Tools", "icon", "red"))
            .unwrap();
        store
            .add_shortcut(&Shortcut::new("s1", "Vim", "/usr/bin/vim", "icon", "c1"))
            .unwrap();

        store.delete_category("c1").unwrap();

        assert!(store.categories().unwrap().is_empty());
        assert_eq!(store.shortcuts().unwrap().len(), 1);
        assert!(!store.cascades_deletes());
    }

    #[test]
    fn test_orphans_pruned_on_open() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = store(dir.path());
            store
                .add_category(&Category::new("c1", "Tools", "icon", "red"))
                .unwrap();
            store
                .add_shortcut(&Shortcut::new("s1", "Vim", "/usr/bin/vim", "icon", "c1"))
                .unwrap();
            store
                .add_shortcut(&Shortcut::new("s2", "Ghost", "/bin/ghost", "icon", "gone"))
                .unwrap();
        }

        let reopened = store(dir.path());
        let shortcuts = reopened.shortcuts().unwrap();
        assert_eq!(shortcuts.len(), 1);
        assert_eq!(shortcuts[0].id, "s1");
    }

    #[test]
    fn test_shortcuts_by_category_filters() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store
            .add_shortcut(&Shortcut::new("s1", "Vim", "/usr/bin/vim", "icon", "c1"))
            .unwrap();
        store
            .add_shortcut(&Shortcut::new("s2", "Writer", "/usr/bin/lowriter", "icon", "c2"))
            .unwrap();

        let in_c2 = store.shortcuts_by_category("c2").unwrap();
        assert_eq!(in_c2.len(), 1);
        assert_eq!(in_c2[0].id, "s2");
    }

    #[test]
    fn test_setting_upsert() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        assert_eq!(store.get_setting("activeCategory").unwrap(), None);
        store.set_setting("activeCategory", "c1").unwrap();
        assert_eq!(store.get_setting("activeCategory").unwrap().as_deref(), Some("c1"));
        store.set_setting("activeCategory", "c2").unwrap();
        assert_eq!(store.get_setting("activeCategory").unwrap().as_deref(), Some("c2"));

        let raw: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(dir.path().join("settings.json")).unwrap())
                .unwrap();
        assert_eq!(raw.len(), 1);
    }

    #[test]
    fn test_debounce_coalesces_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path(), "", Duration::from_secs(30)).unwrap();

        let first = store.write_data("notes", &vec!["a"]).unwrap();
        let second = store.write_data("notes", &vec!["a", "b"]).unwrap();

        assert_eq!(first, WriteOutcome::Written);
        assert_eq!(second, WriteOutcome::Coalesced);
        assert_eq!(store.write_count(), 1);

        // Readers see the coalesced payload before it hits the disk
        let seen: Vec<String> = store.read_data("notes").unwrap().unwrap();
        assert_eq!(seen, vec!["a", "b"]);
        let on_disk: Vec<String> =
            serde_json::from_str(&fs::read_to_string(store.file_path("notes")).unwrap()).unwrap();
        assert_eq!(on_disk, vec!["a"]);

        assert_eq!(store.flush().unwrap(), 1);
        assert_eq!(store.write_count(), 2);
        let on_disk: Vec<String> =
            serde_json::from_str(&fs::read_to_string(store.file_path("notes")).unwrap()).unwrap();
        assert_eq!(on_disk, vec!["a", "b"]);
    }

    #[test]
    fn test_debounce_is_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path(), "", Duration::from_secs(30)).unwrap();

        store.write_data("one", &1).unwrap();
        let other = store.write_data("two", &2).unwrap();
        assert_eq!(other, WriteOutcome::Written);
        assert_eq!(store.write_count(), 2);
    }

    #[test]
    fn test_write_after_window_hits_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path(), "", Duration::from_millis(20)).unwrap();

        store.write_data("notes", &1).unwrap();
        sleep(Duration::from_millis(60));
        assert_eq!(store.write_data("notes", &2).unwrap(), WriteOutcome::Written);
        assert_eq!(store.write_count(), 2);
    }

    #[test]
    fn test_drop_flushes_pending() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileStore::open(dir.path(), "", Duration::from_secs(30)).unwrap();
            store.write_data("notes", &1).unwrap();
            store.write_data("notes", &2).unwrap();
        }

        let contents = fs::read_to_string(dir.path().join("notes.json")).unwrap();
        assert_eq!(contents.trim(), "2");
    }

    #[test]
    fn test_corrupt_file_is_quarantined() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("categories.json"), "{not json").unwrap();

        let store = store(dir.path());
        assert!(store.categories().unwrap().is_empty());
        assert!(dir.path().join("categories.json.corrupt").exists());
        assert!(!dir.path().join("categories.json").exists());
    }

    #[test]
    fn test_clear_all_data_respects_environment() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "categories.json",
            "dev-categories.json",
            "version.json",
            "version-dev.json",
            "shortcuts.db",
        ] {
            fs::write(dir.path().join(name), "[]").unwrap();
        }

        let dev = FileStore::open(dir.path(), DEV_PREFIX, Duration::ZERO).unwrap();
        assert_eq!(dev.clear_all_data().unwrap(), 1);
        assert!(!dir.path().join("dev-categories.json").exists());
        assert!(dir.path().join("categories.json").exists());

        let prod = store(dir.path());
        assert_eq!(prod.clear_all_data().unwrap(), 1);
        assert!(!dir.path().join("categories.json").exists());
        assert!(dir.path().join("version.json").exists());
        assert!(dir.path().join("version-dev.json").exists());
        assert!(dir.path().join("shortcuts.db").exists());
    }

    #[test]
    fn test_delete_data() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.write_data("blob", &serde_json::json!({"a": 1})).unwrap();

        assert!(store.delete_data("blob").unwrap());
        assert!(!store.delete_data("blob").unwrap());
        assert_eq!(store.read_data::<Value>("blob").unwrap(), None);
    }
}
