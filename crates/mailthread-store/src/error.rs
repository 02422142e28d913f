//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Thread document could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Database schema is missing or newer than this build understands.
    #[error("schema error: {0}")]
    Schema(String),

    /// Eviction could not bring a thread back within the cap.
    #[error("thread {thread} holds {len} records, cap is {cap}")]
    CapExceeded {
        thread: String,
        len: usize,
        cap: usize,
    },

    /// A previous holder of the store's lock panicked.
    #[error("store lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
