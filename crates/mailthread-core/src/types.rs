//! Strong type definitions for mailthread.
//!
//! Identifiers and instants are newtypes so a thread key can never be passed
//! where a sender or a timestamp is expected.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Identifier of a conversation thread.
///
/// Opaque and externally supplied (typically a mail provider's conversation
/// id). Never empty.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ThreadKey(String);

impl ThreadKey {
    /// Validate and wrap a thread key.
    ///
    /// Only the empty string is rejected; any other text, whitespace
    /// included, is a valid key.
    pub fn new(key: impl Into<String>) -> Result<Self, ValidationError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ValidationError::EmptyThreadKey);
        }
        Ok(Self(key))
    }

    /// Borrow the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the key and return the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for ThreadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ThreadKey({:?})", self.0)
    }
}

impl fmt::Display for ThreadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ThreadKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ThreadKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ThreadKey {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ThreadKey> for String {
    fn from(key: ThreadKey) -> Self {
        key.0
    }
}

/// An ISO-8601 instant stored as text.
///
/// New timestamps are written in the canonical fixed-width form
/// `YYYY-MM-DDTHH:MM:SS.ffffffZ`. Ordering is the lexicographic order of the
/// text, which is chronological for canonical values and matches the
/// comparison SQLite performs on the `timestamp` column.
///
/// Values read back from storage are kept verbatim, including legacy naive
/// timestamps without an offset.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    /// Canonical text for a UTC instant.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    /// Borrow the raw text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(at: DateTime<Utc>) -> Self {
        Self::from_datetime(at)
    }
}

/// Wraps stored text without validation, so reads stay field-for-field.
impl From<String> for Timestamp {
    fn from(text: String) -> Self {
        Self(text)
    }
}
