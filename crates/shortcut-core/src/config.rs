//! Application configuration
//!
//! Resolved once at startup. The environment picks distinct file names so a
//! development data set never collides with the production one.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use shortcut_storage::{BackendKind, StorageConfig, DEV_PREFIX};

use crate::error::CoreError;
use crate::Result;

pub const ENV_DATA_DIR: &str = "SHORTCUT_ORGANIZER_DATA_DIR";
pub const ENV_ENVIRONMENT: &str = "SHORTCUT_ORGANIZER_ENV";
pub const ENV_BACKEND: &str = "SHORTCUT_ORGANIZER_BACKEND";
pub const ENV_DEBOUNCE_MS: &str = "SHORTCUT_ORGANIZER_DEBOUNCE_MS";

const DATA_DIR_NAME: &str = ".shortcut-organizer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    pub fn database_file(&self) -> &'static str {
        match self {
            Environment::Development => "shortcuts-dev.db",
            Environment::Production => "shortcuts.db",
        }
    }

    pub fn version_file(&self) -> &'static str {
        match self {
            Environment::Development => "version-dev.json",
            Environment::Production => "version.json",
        }
    }

    pub fn file_prefix(&self) -> &'static str {
        match self {
            Environment::Development => DEV_PREFIX,
            Environment::Production => "",
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(CoreError::Config(format!("unknown environment: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Per-user application data directory
    pub data_dir: PathBuf,
    pub environment: Environment,
    /// Preferred record store
    pub backend: BackendKind,
    /// Flat-file write coalescing window; zero disables it
    pub debounce_ms: u64,
    /// Version written into the version stamp
    pub app_version: String,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            environment: Environment::Production,
            backend: BackendKind::Sqlite,
            debounce_ms: 100,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::home_dir()
            .map(|home| home.join(DATA_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(DATA_DIR_NAME))
    }

    /// Defaults overridden by `SHORTCUT_ORGANIZER_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = lookup(ENV_DATA_DIR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(Self::data_dir);
        let mut config = Self::new(data_dir);

        if let Some(env) = lookup(ENV_ENVIRONMENT) {
            config.environment = env.parse()?;
        }
        if let Some(backend) = lookup(ENV_BACKEND) {
            config.backend = backend.parse().map_err(CoreError::Config)?;
        }
        if let Some(ms) = lookup(ENV_DEBOUNCE_MS) {
            config.debounce_ms = ms
                .trim()
                .parse()
                .map_err(|_| CoreError::Config(format!("invalid debounce: {ms}")))?;
        }

        Ok(config)
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(self.environment.database_file())
    }

    pub fn version_path(&self) -> PathBuf {
        self.data_dir.join(self.environment.version_file())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig {
            backend: self.backend,
            database_path: self.database_path(),
            data_dir: self.data_dir.clone(),
            file_prefix: self.environment.file_prefix().to_string(),
            debounce: self.debounce(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}
