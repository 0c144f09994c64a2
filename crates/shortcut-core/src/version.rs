//! Install/update detection
//!
//! A small JSON stamp next to the data records which version last ran. Its
//! absence means a fresh install; a version mismatch means an update.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionStamp {
    pub version: String,
    pub install_date: DateTime<Utc>,
    pub last_update_date: DateTime<Utc>,
    pub is_first_run: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_version: Option<String>,
}

impl VersionStamp {
    fn fresh(version: &str) -> Self {
        let now = Utc::now();
        Self {
            version: version.to_string(),
            install_date: now,
            last_update_date: now,
            is_first_run: true,
            previous_version: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionCheck {
    pub is_new_install: bool,
    pub is_update: bool,
    pub stamp: VersionStamp,
}

pub struct VersionManager {
    path: PathBuf,
    current_version: String,
}

impl VersionManager {
    pub fn new(path: impl Into<PathBuf>, current_version: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            current_version: current_version.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    /// Classify this start and rewrite the stamp accordingly
    pub fn check_version(&self) -> VersionCheck {
        let Some(mut stamp) = self.stamp() else {
            let stamp = VersionStamp::fresh(&self.current_version);
            self.save(&stamp);
            tracing::info!(version = %self.current_version, "New install detected");
            return VersionCheck {
                is_new_install: true,
                is_update: false,
                stamp,
            };
        };

        let is_update = stamp.version != self.current_version;
        if is_update {
            let previous = std::mem::replace(&mut stamp.version, self.current_version.clone());
            tracing::info!(
                from = %previous,
                to = %self.current_version,
                "Version update detected, keeping data"
            );
            stamp.previous_version = Some(previous);
            stamp.last_update_date = Utc::now();
        } else {
            tracing::debug!(version = %stamp.version, "Normal start");
        }
        stamp.is_first_run = false;
        self.save(&stamp);

        VersionCheck {
            is_new_install: false,
            is_update,
            stamp,
        }
    }

    /// The stored stamp; unreadable or malformed stamps count as absent
    pub fn stamp(&self) -> Option<VersionStamp> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read version stamp");
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(stamp) => Some(stamp),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Malformed version stamp");
                None
            }
        }
    }

    pub fn is_first_run(&self) -> bool {
        self.stamp().map(|s| s.is_first_run).unwrap_or(true)
    }

    /// Drop the stamp and classify again, which always yields a new install.
    /// Wiping the record data is up to the caller.
    pub fn reset_to_new_install(&self) -> VersionCheck {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove version stamp");
            }
        }
        self.check_version()
    }

    fn save(&self, stamp: &VersionStamp) {
        let result = serde_json::to_string_pretty(stamp)
            .map_err(io::Error::from)
            .and_then(|json| fs::write(&self.path, json));

        if let Err(e) = result {
            tracing::error!(path = %self.path.display(), error = %e, "Failed to save version stamp");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_install_then_normal_start() {
        let dir = tempfile::tempdir().unwrap();
        let manager = VersionManager::new(dir.path().join("version.json"), "1.0.0");

        assert!(manager.is_first_run());
        let first = manager.check_version();
        assert!(first.is_new_install);
        assert!(!first.is_update);
        assert!(first.stamp.is_first_run);
        assert!(manager.is_first_run());

        let second = manager.check_version();
        assert!(!second.is_new_install);
        assert!(!second.is_update);
        assert!(!second.stamp.is_first_run);
        assert_eq!(second.stamp.install_date, first.stamp.install_date);
        assert!(!manager.is_first_run());
    }

    #[test]
    fn test_update_records_previous_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("version.json");
        VersionManager::new(&path, "1.0.0").check_version();

        let check = VersionManager::new(&path, "1.1.0").check_version();
        assert!(!check.is_new_install);
        assert!(check.is_update);
        assert_eq!(check.stamp.version, "1.1.0");
        assert_eq!(check.stamp.previous_version.as_deref(), Some("1.0.0"));
        assert!(!check.stamp.is_first_run);

        let stored = VersionManager::new(&path, "1.1.0").stamp().unwrap();
        assert_eq!(stored, check.stamp);
    }

    #[test]
    fn test_malformed_stamp_is_new_install() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("version.json");
        fs::write(&path, "{ not json").unwrap();

        let manager = VersionManager::new(&path, "1.0.0");
        assert!(manager.stamp().is_none());
        assert!(manager.check_version().is_new_install);
        assert!(manager.stamp().is_some());
    }

    #[test]
    fn test_reset_to_new_install() {
        let dir = tempfile::tempdir().unwrap();
        let manager = VersionManager::new(dir.path().join("version.json"), "1.0.0");
        manager.check_version();
        manager.check_version();

        let check = manager.reset_to_new_install();
        assert!(check.is_new_install);
        assert!(manager.is_first_run());
    }

    #[test]
    fn test_stamp_json_shape() {
        let stamp = VersionStamp::fresh("0.0.1");
        let json = serde_json::to_value(&stamp).unwrap();
        assert_eq!(json["version"], "0.0.1");
        assert_eq!(json["isFirstRun"], true);
        assert!(json.get("installDate").is_some());
        assert!(json.get("previousVersion").is_none());
    }
}
