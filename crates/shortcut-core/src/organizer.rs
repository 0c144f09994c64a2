//! In-memory state over the storage façade
//!
//! Loaded once, then kept in sync by applying each successful mutation to the
//! mirror. Adds are fire-and-log: a persistence failure is logged and the
//! record is not mirrored. Updates and deletes surface failures as errors.

use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use shortcut_storage::{Category, Shortcut, Storage, ACTIVE_CATEGORY_KEY};

use crate::error::CoreError;
use crate::Result;

pub struct Organizer {
    storage: Storage,
    categories: RwLock<Vec<Category>>,
    shortcuts: RwLock<Vec<Shortcut>>,
    active_category: RwLock<Option<String>>,
}

impl Organizer {
    pub fn load(storage: Storage) -> Self {
        let categories = storage.categories();
        let shortcuts = storage.shortcuts();
        let active_category = storage
            .get_setting(ACTIVE_CATEGORY_KEY)
            .filter(|id| categories.iter().any(|c| &c.id == id));

        tracing::debug!(
            categories = categories.len(),
            shortcuts = shortcuts.len(),
            "Loaded organizer state"
        );

        Self {
            storage,
            categories: RwLock::new(categories),
            shortcuts: RwLock::new(shortcuts),
            active_category: RwLock::new(active_category),
        }
    }

    // === Queries ===

    pub fn categories(&self) -> Vec<Category> {
        self.categories.read().clone()
    }

    pub fn category(&self, id: &str) -> Option<Category> {
        self.categories.read().iter().find(|c| c.id == id).cloned()
    }

    pub fn shortcuts(&self) -> Vec<Shortcut> {
        self.shortcuts.read().clone()
    }

    pub fn shortcuts_in_category(&self, category_id: &str) -> Vec<Shortcut> {
        self.shortcuts
            .read()
            .iter()
            .filter(|s| s.category_id == category_id)
            .cloned()
            .collect()
    }

    pub fn active_category(&self) -> Option<String> {
        self.active_category.read().clone()
    }

    /// Matches across every category; a blank query lists the active category
    pub fn search(&self, query: &str) -> Vec<Shortcut> {
        let query = query.trim();
        if query.is_empty() {
            return match self.active_category() {
                Some(id) => self.shortcuts_in_category(&id),
                None => Vec::new(),
            };
        }

        self.shortcuts
            .read()
            .iter()
            .filter(|s| s.matches(query))
            .cloned()
            .collect()
    }

    // === Categories ===

    pub fn add_category(&self, name: &str, icon: &str, color: &str) -> Result<Option<Category>> {
        let name = required("category name", name)?;
        let category = Category::new(Uuid::new_v4().to_string(), name, icon, color);

        if !self.storage.add_category(&category) {
            tracing::error!(name = %category.name, "Category was not persisted");
            return Ok(None);
        }

        let first = {
            let mut categories = self.categories.write();
            categories.push(category.clone());
            categories.len() == 1
        };
        if first {
            self.set_active_category(Some(&category.id));
        }

        tracing::info!(category_id = %category.id, name = %category.name, "Added category");
        Ok(Some(category))
    }

    pub fn update_category(&self, category: &Category) -> Result<Category> {
        let existing = self
            .category(&category.id)
            .ok_or_else(|| CoreError::NotFound(format!("category {}", category.id)))?;

        let mut updated = category.clone();
        updated.name = required("category name", &category.name)?.to_string();
        updated.created_at = existing.created_at;
        updated.updated_at = Some(Utc::now());

        if !self.storage.update_category(&updated) {
            return Err(CoreError::Persist(format!("category {}", updated.id)));
        }

        let mut categories = self.categories.write();
        if let Some(slot) = categories.iter_mut().find(|c| c.id == updated.id) {
            *slot = updated.clone();
        }
        tracing::info!(category_id = %updated.id, "Updated category");
        Ok(updated)
    }

    /// Delete a category and every shortcut it owns
    pub fn delete_category(&self, id: &str) -> Result<()> {
        if !self.storage.delete_category(id) {
            return Err(CoreError::Persist(format!("category {id}")));
        }

        self.categories.write().retain(|c| c.id != id);
        let removed = {
            let mut shortcuts = self.shortcuts.write();
            let before = shortcuts.len();
            shortcuts.retain(|s| s.category_id != id);
            before - shortcuts.len()
        };

        if self.active_category().as_deref() == Some(id) {
            self.set_active_category(None);
        }

        tracing::info!(category_id = %id, shortcuts = removed, "Deleted category");
        Ok(())
    }

    /// Persist the selection; an empty string clears it in storage
    pub fn set_active_category(&self, id: Option<&str>) {
        *self.active_category.write() = id.map(str::to_string);
        if !self.storage.set_setting(ACTIVE_CATEGORY_KEY, id.unwrap_or_default()) {
            tracing::warn!("Active category selection was not persisted");
        }
    }

    // === Shortcuts ===

    pub fn add_shortcut(
        &self,
        name: &str,
        icon: &str,
        path: &str,
        category_id: &str,
    ) -> Result<Option<Shortcut>> {
        let name = required("shortcut name", name)?;
        let path = required("shortcut path", path)?;
        if self.category(category_id).is_none() {
            return Err(CoreError::NotFound(format!("category {category_id}")));
        }

        let shortcut = Shortcut::new(Uuid::new_v4().to_string(), name, path, icon, category_id);
        if !self.storage.add_shortcut(&shortcut) {
            tracing::error!(name = %shortcut.name, "Shortcut was not persisted");
            return Ok(None);
        }

        self.shortcuts.write().push(shortcut.clone());
        tracing::info!(
            shortcut_id = %shortcut.id,
            category_id = %shortcut.category_id,
            "Added shortcut"
        );
        Ok(Some(shortcut))
    }

    pub fn update_shortcut(&self, shortcut: &Shortcut) -> Result<Shortcut> {
        let existing = self
            .shortcuts
            .read()
            .iter()
            .find(|s| s.id == shortcut.id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("shortcut {}", shortcut.id)))?;
        if self.category(&shortcut.category_id).is_none() {
            return Err(CoreError::NotFound(format!("category {}", shortcut.category_id)));
        }

        let mut updated = shortcut.clone();
        updated.created_at = existing.created_at;
        updated.updated_at = Some(Utc::now());

        if !self.storage.update_shortcut(&updated) {
            return Err(CoreError::Persist(format!("shortcut {}", updated.id)));
        }

        let mut shortcuts = self.shortcuts.write();
        if let Some(slot) = shortcuts.iter_mut().find(|s| s.id == updated.id) {
            *slot = updated.clone();
        }
        tracing::info!(shortcut_id = %updated.id, "Updated shortcut");
        Ok(updated)
    }

    pub fn delete_shortcut(&self, id: &str) -> Result<()> {
        if !self.storage.delete_shortcut(id) {
            return Err(CoreError::Persist(format!("shortcut {id}")));
        }

        self.shortcuts.write().retain(|s| s.id != id);
        tracing::info!(shortcut_id = %id, "Deleted shortcut");
        Ok(())
    }
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        Err(CoreError::Validation(format!("{field} must not be empty")))
    } else {
        Ok(value)
    }
}
