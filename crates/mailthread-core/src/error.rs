//! Error types for mailthread core.

use thiserror::Error;

/// Input rejected before any storage is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("thread key must not be empty")]
    EmptyThreadKey,

    #[error("max history must be at least 1, got {0}")]
    InvalidCap(usize),
}
