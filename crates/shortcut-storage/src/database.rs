//! Database connection and operations

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;

use crate::backend::{BackendKind, RecordStore};
use crate::migrations::run_migrations;
use crate::records::{Category, Shortcut};
use crate::Result;

const CATEGORY_COLUMNS: &str = "id, name, icon, color, created_at, updated_at";
const SHORTCUT_COLUMNS: &str = "id, name, path, icon, category_id, created_at, updated_at";

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;

        // Enforce shortcuts.category_id -> categories.id cascade
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let _: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

        run_migrations(&conn)?;

        tracing::info!(path = %path.as_ref().display(), "Opened database");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}

impl RecordStore for Database {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    fn cascades_deletes(&self) -> bool {
        true
    }

    fn categories(&self) -> Result<Vec<Category>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY created_at ASC, rowid ASC"
            ))?;
            let categories = stmt
                .query_map([], category_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(categories)
        })
    }

    fn add_category(&self, category: &Category) -> Result<()> {
        let now = timestamp(Utc::now());
        self.with_connection(|conn| {
            // Upsert without DELETE so the shortcut cascade never fires
            conn.execute(
                "INSERT INTO categories (id, name, icon, color, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    icon = excluded.icon,
                    color = excluded.color,
                    updated_at = excluded.updated_at",
                rusqlite::params![
                    category.id,
                    category.name,
                    category.icon,
                    category.color,
                    now
                ],
            )?;
            Ok(())
        })?;

        tracing::debug!(category_id = %category.id, name = %category.name, "Saved category");
        Ok(())
    }

    fn update_category(&self, category: &Category) -> Result<()> {
        let now = timestamp(Utc::now());
        let changed = self.with_connection(|conn| {
            Ok(conn.execute(
                "UPDATE categories SET name = ?1, icon = ?2, color = ?3, updated_at = ?4
                 WHERE id = ?5",
                rusqlite::params![
                    category.name,
                    category.icon,
                    category.color,
                    now,
                    category.id
                ],
            )?)
        })?;

        if changed == 0 {
            tracing::debug!(category_id = %category.id, "Update matched no category, nothing to do");
        } else {
            tracing::debug!(category_id = %category.id, "Updated category");
        }
        Ok(())
    }

    fn delete_category(&self, category_id: &str) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute("DELETE FROM categories WHERE id = ?1", [category_id])?;
            Ok(())
        })?;

        tracing::debug!(category_id = %category_id, "Deleted category");
        Ok(())
    }

    fn shortcuts(&self) -> Result<Vec<Shortcut>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SHORTCUT_COLUMNS} FROM shortcuts ORDER BY created_at ASC, rowid ASC"
            ))?;
            let shortcuts = stmt
                .query_map([], shortcut_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(shortcuts)
        })
    }

    fn shortcuts_by_category(&self, category_id: &str) -> Result<Vec<Shortcut>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SHORTCUT_COLUMNS} FROM shortcuts WHERE category_id = ?1
                 ORDER BY created_at ASC, rowid ASC"
            ))?;
            let shortcuts = stmt
                .query_map([category_id], shortcut_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(shortcuts)
        })
    }

    fn add_shortcut(&self, shortcut: &Shortcut) -> Result<()> {
        let now = timestamp(Utc::now());
        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO shortcuts (id, name, path, icon, category_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    path = excluded.path,
                    icon = excluded.icon,
                    category_id = excluded.category_id,
                    updated_at = excluded.updated_at",
                rusqlite::params![
                    shortcut.id,
                    shortcut.name,
                    shortcut.path,
                    shortcut.icon,
                    shortcut.category_id,
                    now
                ],
            )?;
            Ok(())
        })?;

        tracing::debug!(shortcut_id = %shortcut.id, name = %shortcut.name, "Saved shortcut");
        Ok(())
    }

    fn update_shortcut(&self, shortcut: &Shortcut) -> Result<()> {
        let now = timestamp(Utc::now());
        let changed = self.with_connection(|conn| {
            Ok(conn.execute(
                "UPDATE shortcuts SET name = ?1, path = ?2, icon = ?3, category_id = ?4,
                    updated_at = ?5
                 WHERE id = ?6",
                rusqlite::params![
                    shortcut.name,
                    shortcut.path,
                    shortcut.icon,
                    shortcut.category_id,
                    now,
                    shortcut.id
                ],
            )?)
        })?;

        if changed == 0 {
            tracing::debug!(shortcut_id = %shortcut.id, "Update matched no shortcut, nothing to do");
        } else {
            tracing::debug!(shortcut_id = %shortcut.id, "Updated shortcut");
        }
        Ok(())
    }

    fn delete_shortcut(&self, shortcut_id: &str) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute("DELETE FROM shortcuts WHERE id = ?1", [shortcut_id])?;
            Ok(())
        })?;

        tracing::debug!(shortcut_id = %shortcut_id, "Deleted shortcut");
        Ok(())
    }

    fn get_setting(&self, key: &str) -> Result<Option<String>> {
        self.with_connection(|conn| {
            let value = conn
                .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(value)
        })
    }

    fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let updated_at = timestamp(Utc::now());
        self.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![key, value, updated_at],
            )?;
            Ok(())
        })
    }

    fn purge(&self) -> Result<()> {
        self.transaction(|conn| {
            conn.execute("DELETE FROM shortcuts", [])?;
            conn.execute("DELETE FROM categories", [])?;
            conn.execute("DELETE FROM settings", [])?;
            Ok(())
        })?;

        tracing::info!("Purged all database records");
        Ok(())
    }
}

/// Fixed-width RFC 3339 so lexical order matches chronological order
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(e) => {
            tracing::warn!(value = %value, error = %e, "Unparseable stored timestamp, using now");
            Utc::now()
        }
    }
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    let created: String = row.get(4)?;
    let updated: String = row.get(5)?;

    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        icon: row.get(2)?,
        color: row.get(3)?,
        created_at: parse_timestamp(&created),
        updated_at: Some(parse_timestamp(&updated)),
    })
}

fn shortcut_from_row(row: &Row<'_>) -> rusqlite::Result<Shortcut> {
    let created: String = row.get(5)?;
    let updated: String = row.get(6)?;

    Ok(Shortcut {
        id: row.get(0)?,
        name: row.get(1)?,
        path: row.get(2)?,
        icon: row.get(3)?,
        category_id: row.get(4)?,
        created_at: parse_timestamp(&created),
        updated_at: Some(parse_timestamp(&updated)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.add_category(&Category::new("c1", "Tools", "fas fa-code", "#10B981"))
            .unwrap();
        db.add_category(&Category::new("c2", "Office", "fas fa-file-alt", "blue"))
            .unwrap();
        db
    }

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        db.with_connection(|conn| {
            let count: i32 =
                conn.query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
            assert_eq!(count, 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_add_then_list_category() {
        let db = Database::open_in_memory().unwrap();
        let category = Category::new("c1", "Tools", "fas fa-code", "#10B981");
        db.add_category(&category).unwrap();

        let all = db.categories().unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].same_content(&category));
        assert!(all[0].updated_at.is_some());
    }

    #[test]
    fn test_categories_keep_insertion_order() {
        let db = seeded();
        db.add_category(&Category::new("c3", "Games", "fas fa-gamepad", "red"))
            .unwrap();
        let ids: Vec<String> = db.categories().unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn test_update_preserves_id_and_created_at() {
        let db = seeded();
        let before = db.categories().unwrap();
        let original = before.iter().find(|c| c.id == "c1").unwrap().clone();

        let mut edited = original.clone();
        edited.name = "Dev".to_string();
        edited.icon = "fas fa-terminal".to_string();
        edited.color = "#000000".to_string();
        db.update_category(&edited).unwrap();

        let after = db.categories().unwrap();
        let updated = after.iter().find(|c| c.id == "c1").unwrap();
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(updated.name, "Dev");
        assert_eq!(updated.icon, "fas fa-terminal");
        assert_eq!(updated.color, "#000000");

        let untouched_before = before.iter().find(|c| c.id == "c2").unwrap();
        let untouched_after = after.iter().find(|c| c.id == "c2").unwrap();
        assert_eq!(untouched_before, untouched_after);
    }

    #[test]
    fn test_update_unknown_is_noop() {
        let db = seeded();
        let before = db.categories().unwrap();

        db.update_category(&Category::new("missing", "Ghost", "icon", "gray"))
            .unwrap();
        db.update_shortcut(&Shortcut::new("s9", "Ghost", "/nowhere", "icon", "c1"))
            .unwrap();

        assert_eq!(db.categories().unwrap(), before);
        assert!(db.shortcuts().unwrap().is_empty());
    }

    #[test]
    fn test_unparseable_timestamp_falls_back() {
        let db = seeded();
        db.with_connection(|conn| {
            conn.execute("UPDATE categories SET created_at = 'garbage' WHERE id = 'c1'", [])?;
            Ok(())
        })
        .unwrap();

        let categories = db.categories().unwrap();
        assert_eq!(categories.len(), 2);
        assert!(categories.iter().any(|c| c.id == "c1"));
    }

    #[test]
    fn test_re_adding_category_does_not_cascade() {
        let db = seeded();
        db.add_shortcut(&Shortcut::new("s1", "Vim", "/usr/bin/vim", "icon", "c1"))
            .unwrap();

        let mut renamed = Category::new("c1", "Renamed", "fas fa-code", "#10B981");
        renamed.created_at = Utc::now();
        db.add_category(&renamed).unwrap();

        assert_eq!(db.shortcuts_by_category("c1").unwrap().len(), 1);
        assert_eq!(db.categories().unwrap()[0].name, "Renamed");
    }

    #[test]
    fn test_delete_category_cascades_to_shortcuts() {
        let db = seeded();
        db.add_shortcut(&Shortcut::new("s1", "Vim", "/usr/bin/vim", "icon", "c1"))
            .unwrap();
        db.add_shortcut(&Shortcut::new("s2", "Code", "/usr/bin/code", "icon", "c1"))
            .unwrap();
        db.add_shortcut(&Shortcut::new("s3", "Writer", "/usr/bin/lowriter", "icon", "c2"))
            .unwrap();

        db.delete_category("c1").unwrap();

        let categories = db.categories().unwrap();
        assert!(categories.iter().all(|c| c.id != "c1"));
        let shortcuts = db.shortcuts().unwrap();
        assert_eq!(shortcuts.len(), 1);
        assert_eq!(shortcuts[0].id, "s3");
    }

    #[test]
    fn test_shortcut_requires_existing_category() {
        let db = seeded();
        let orphan = Shortcut::new("s1", "Vim", "/usr/bin/vim", "icon", "nope");
        assert!(matches!(
            db.add_shortcut(&orphan),
            Err(StorageError::Sqlite(_))
        ));
    }

    #[test]
    fn test_shortcuts_by_category_filters() {
        let db = seeded();
        db.add_shortcut(&Shortcut::new("s1", "Vim", "/usr/bin/vim", "icon", "c1"))
            .unwrap();
        db.add_shortcut(&Shortcut::new("s2", "Writer", "/usr/bin/lowriter", "icon", "c2"))
            .unwrap();

        let in_c1 = db.shortcuts_by_category("c1").unwrap();
        assert_eq!(in_c1.len(), 1);
        assert_eq!(in_c1[0].id, "s1");
        assert!(db.shortcuts_by_category("c3").unwrap().is_empty());
    }

    #[test]
    fn test_setting_upsert() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.get_setting("activeCategory").unwrap(), None);

        db.set_setting("activeCategory", "c1").unwrap();
        assert_eq!(db.get_setting("activeCategory").unwrap().as_deref(), Some("c1"));

        db.set_setting("activeCategory", "c2").unwrap();
        assert_eq!(db.get_setting("activeCategory").unwrap().as_deref(), Some("c2"));

        let rows: i32 = db
            .with_connection(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM settings", [], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_purge_clears_everything() {
        let db = seeded();
        db.add_shortcut(&Shortcut::new("s1", "Vim", "/usr/bin/vim", "icon", "c1"))
            .unwrap();
        db.set_setting("activeCategory", "c1").unwrap();

        db.purge().unwrap();

        assert!(db.categories().unwrap().is_empty());
        assert!(db.shortcuts().unwrap().is_empty());
        assert_eq!(db.get_setting("activeCategory").unwrap(), None);
    }

    #[test]
    fn test_open_file_uses_wal() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("shortcuts.db")).unwrap();
        let mode: String = db
            .with_connection(|conn| {
                Ok(conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }
}
