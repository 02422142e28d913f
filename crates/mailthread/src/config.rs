//! Configuration: which backend to use, where it lives, and the cap.
//!
//! Loaded from a TOML file, then overridden from `MAILTHREAD_*` environment
//! variables. Every key is optional:
//!
//! ```toml
//! [storage]
//! backend = "file"             # file | sql | memory
//! file_path = "email_threads.json"
//! sqlite_path = "email_threads.db"
//! max_history = 5
//!
//! [logging]
//! level = "info"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use mailthread_core::{RetentionPolicy, DEFAULT_MAX_HISTORY};

use crate::error::ConfigError;

pub const ENV_BACKEND: &str = "MAILTHREAD_BACKEND";
pub const ENV_FILE_PATH: &str = "MAILTHREAD_FILE_PATH";
pub const ENV_SQLITE_PATH: &str = "MAILTHREAD_SQLITE_PATH";
pub const ENV_MAX_HISTORY: &str = "MAILTHREAD_MAX_HISTORY";
pub const ENV_LOG: &str = "MAILTHREAD_LOG";

/// Which storage backend to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// One JSON document on disk.
    #[default]
    #[serde(alias = "json")]
    File,
    /// SQLite database.
    #[serde(alias = "sqlite")]
    Sql,
    /// Process memory only.
    #[serde(alias = "mock")]
    Memory,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::File => "file",
            BackendKind::Sql => "sql",
            BackendKind::Memory => "memory",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" | "json" => Ok(BackendKind::File),
            "sql" | "sqlite" => Ok(BackendKind::Sql),
            "memory" | "mock" => Ok(BackendKind::Memory),
            _ => Err(ConfigError::UnknownBackend(s.to_string())),
        }
    }
}

/// The `[storage]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: BackendKind,
    /// Document path for the file backend.
    pub file_path: PathBuf,
    /// Database path for the SQL backend.
    pub sqlite_path: PathBuf,
    /// Records kept per thread.
    pub max_history: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::File,
            file_path: PathBuf::from("email_threads.json"),
            sqlite_path: PathBuf::from("email_threads.db"),
            max_history: DEFAULT_MAX_HISTORY,
        }
    }
}

impl StoreConfig {
    /// The retention policy for the configured cap.
    pub fn retention_policy(&self) -> Result<RetentionPolicy, ConfigError> {
        RetentionPolicy::new(self.max_history)
            .map_err(|e| ConfigError::Invalid(format!("storage.max_history: {e}")))
    }

    /// Location of the active backend, `None` for memory.
    pub fn location(&self) -> Option<&Path> {
        match self.backend {
            BackendKind::File => Some(&self.file_path),
            BackendKind::Sql => Some(&self.sqlite_path),
            BackendKind::Memory => None,
        }
    }
}

/// The `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, e.g. `info` or `mailthread=debug`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StoreConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration: the file if given, then environment overrides,
    /// then validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file without applying overrides.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse TOML text without applying overrides.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `MAILTHREAD_*` overrides, reading variables through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_BACKEND) {
            self.storage.backend = value.parse()?;
        }
        if let Some(value) = lookup(ENV_FILE_PATH) {
            self.storage.file_path = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_SQLITE_PATH) {
            self.storage.sqlite_path = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_MAX_HISTORY) {
            self.storage.max_history = value.trim().parse().map_err(|_| ConfigError::Env {
                var: ENV_MAX_HISTORY,
                value,
            })?;
        }
        if let Some(value) = lookup(ENV_LOG) {
            self.logging.level = value;
        }
        Ok(())
    }

    /// Reject values that parsed but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.storage.retention_policy()?;
        if self.storage.backend == BackendKind::File && self.storage.file_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("storage.file_path is empty".to_string()));
        }
        if self.storage.backend == BackendKind::Sql && self.storage.sqlite_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("storage.sqlite_path is empty".to_string()));
        }
        Ok(())
    }
}
