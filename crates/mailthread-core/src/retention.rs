//! Retention: the per-thread cap and age-based staleness.
//!
//! Every backend applies these rules identically. The file and memory
//! backends call them directly; the SQLite backend expresses the same rules
//! as queries and is tested for parity against them.

use chrono::{DateTime, Duration, Utc};

use crate::error::ValidationError;
use crate::record::{newest_timestamp, Record, ThreadMap};
use crate::types::Timestamp;

/// Cap used when configuration does not provide one.
pub const DEFAULT_MAX_HISTORY: usize = 5;

/// Per-thread retention rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    max_history: usize,
}

impl RetentionPolicy {
    /// Create a policy keeping at most `max_history` records per thread.
    pub fn new(max_history: usize) -> Result<Self, ValidationError> {
        if max_history == 0 {
            return Err(ValidationError::InvalidCap(max_history));
        }
        Ok(Self { max_history })
    }

    /// The cap `H`.
    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Evict the oldest records until `history` is within the cap.
    ///
    /// Eviction is by position, never by content. Returns the number of
    /// records removed.
    pub fn enforce(&self, history: &mut Vec<Record>) -> usize {
        let excess = history.len().saturating_sub(self.max_history);
        if excess > 0 {
            history.drain(..excess);
        }
        excess
    }

    /// The most recent records within the cap, oldest first.
    pub fn tail<'a>(&self, history: &'a [Record]) -> &'a [Record] {
        let start = history.len().saturating_sub(self.max_history);
        &history[start..]
    }

    /// Whether a thread has reached the cap.
    pub fn is_at_cap(&self, len: usize) -> bool {
        len >= self.max_history
    }

    /// Cut every thread to the cap and drop threads with no records.
    ///
    /// This is the shape every backend persists on a full save.
    pub fn normalize(&self, threads: &ThreadMap) -> ThreadMap {
        threads
            .iter()
            .filter(|(_, history)| !history.is_empty())
            .map(|(key, history)| (key.clone(), self.tail(history).to_vec()))
            .collect()
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
        }
    }
}

/// The instant `age_days` before `now`, clamped to the earliest
/// representable instant.
pub fn cutoff(now: DateTime<Utc>, age_days: u32) -> Timestamp {
    let at = now
        .checked_sub_signed(Duration::days(i64::from(age_days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    Timestamp::from_datetime(at)
}

/// Whether a whole thread is eligible for age-based cleanup.
///
/// A thread is stale when its newest record is strictly older than `cutoff`.
/// Threads are kept or removed as a whole; an empty thread is always stale.
pub fn is_stale(history: &[Record], cutoff: &Timestamp) -> bool {
    match newest_timestamp(history) {
        Some(newest) => newest < cutoff,
        None => true,
    }
}
