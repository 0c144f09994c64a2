//! Persisted record types
//!
//! Field names are camelCase both on disk (flat-file backend) and on the
//! bridge, matching what the UI sends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named, colored grouping of shortcuts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Opaque identifier, immutable once created
    pub id: String,
    pub name: String,
    /// Symbolic icon name (e.g. `fas fa-code`)
    pub icon: String,
    /// Themed token or literal color value, stored verbatim
    pub color: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Category {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        icon: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: icon.into(),
            color: color.into(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Compare the user-editable fields, ignoring store-assigned timestamps
    pub fn same_content(&self, other: &Category) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.icon == other.icon
            && self.color == other.color
    }
}

/// A named reference to an executable path, owned by one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shortcut {
    pub id: String,
    pub name: String,
    /// Filesystem path handed to the OS opener on launch
    pub path: String,
    pub icon: String,
    /// Foreign key into [`Category::id`]
    pub category_id: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Shortcut {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        path: impl Into<String>,
        icon: impl Into<String>,
        category_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            path: path.into(),
            icon: icon.into(),
            category_id: category_id.into(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn same_content(&self, other: &Shortcut) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.path == other.path
            && self.icon == other.icon
            && self.category_id == other.category_id
    }

    /// Case-insensitive match on name or path
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query) || self.path.to_lowercase().contains(&query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_json_is_camel_case() {
        let category = Category::new("c1", "Tools", "fas fa-code", "#10B981");
        let json = serde_json::to_value(&category).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_none());
    }

    #[test]
    fn test_shortcut_created_at_defaults_when_missing() {
        let shortcut: Shortcut = serde_json::from_str(
            r#"{"id":"s1","name":"Editor","path":"/usr/bin/vim","icon":"fas fa-code","categoryId":"c1"}"#,
        )
        .unwrap();
        assert_eq!(shortcut.category_id, "c1");
        assert!(shortcut.updated_at.is_none());
    }

    #[test]
    fn test_shortcut_matches_name_or_path() {
        let shortcut = Shortcut::new("s1", "Terminal", "/usr/bin/Alacritty", "icon", "c1");
        assert!(shortcut.matches("term"));
        assert!(shortcut.matches("alacritty"));
        assert!(!shortcut.matches("browser"));
    }
}
