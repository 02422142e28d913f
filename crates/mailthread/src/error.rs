//! Error types for the thread store façade and its configuration.

use std::path::PathBuf;

use mailthread_core::ValidationError;
use mailthread_store::StoreError;
use thiserror::Error;

/// Errors that can occur during thread store operations.
#[derive(Debug, Error)]
pub enum ThreadError {
    /// Input rejected before any backend call.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// The store could not be built from its configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has unknown values.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {var}")]
    Env { var: &'static str, value: String },

    /// Unknown backend name.
    #[error("unknown storage backend {0:?} (expected file, sql, or memory)")]
    UnknownBackend(String),

    /// A value parsed but is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for thread store operations.
pub type Result<T> = std::result::Result<T, ThreadError>;
