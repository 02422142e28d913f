//! ThreadStorage trait: the abstract interface for thread persistence.
//!
//! This trait keeps callers storage-agnostic. Implementations include a JSON
//! document on disk, SQLite, and in-memory (for tests and ephemeral runs).

use std::path::PathBuf;

use serde::Serialize;

use mailthread_core::{
    retention, Clock, Record, RetentionPolicy, SystemClock, ThreadCounts, ThreadKey, ThreadMap,
    Timestamp,
};

use crate::error::Result;

/// Result of appending a record to a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    /// Records in the thread after the append and any eviction.
    pub len: usize,
    /// Oldest records evicted to keep the thread within the cap.
    pub evicted: usize,
}

/// Backend-specific identification reported alongside the counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum BackendInfo {
    File {
        path: PathBuf,
        exists: bool,
        size_bytes: u64,
    },
    Sqlite {
        /// `None` for an in-memory database.
        path: Option<PathBuf>,
        exists: bool,
        size_bytes: u64,
    },
    Memory {
        /// Storage calls served since construction.
        operations: u64,
    },
}

impl BackendInfo {
    /// Short provider name for logs.
    pub fn provider(&self) -> &'static str {
        match self {
            BackendInfo::File { .. } => "file",
            BackendInfo::Sqlite { .. } => "sqlite",
            BackendInfo::Memory { .. } => "memory",
        }
    }
}

/// Aggregate statistics for monitoring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreStats {
    pub backend: BackendInfo,
    pub counts: ThreadCounts,
}

/// The ThreadStorage trait: synchronous interface for thread persistence.
///
/// Every operation is atomic on its own and every backend enforces the same
/// retention rules, so backends are interchangeable.
///
/// # Design Notes
///
/// - **Cap**: after any append a thread holds at most
///   [`RetentionPolicy::max_history`] records; the oldest are evicted first,
///   in the same atomic unit as the insert.
/// - **Ordering**: records come back in append order, oldest first.
/// - **Copies**: every read returns owned data; nothing aliases stored state.
/// - **Whole-thread cleanup**: a thread is removed only when its newest
///   record is older than the cutoff, and then entirely.
pub trait ThreadStorage: Send + Sync {
    /// Snapshot of every thread. An empty or missing store yields an empty map.
    fn load_all(&self) -> Result<ThreadMap>;

    /// Replace the entire persisted state.
    ///
    /// Threads are cut to the cap and empty threads are dropped before
    /// writing. Readers observe either the old state or the new one.
    fn save_all(&self, threads: &ThreadMap) -> Result<()>;

    /// Up to the cap's worth of the most recent records, oldest first.
    /// Unknown threads yield an empty history.
    fn history(&self, key: &ThreadKey) -> Result<Vec<Record>>;

    /// Append one record and enforce the cap, all or nothing.
    fn append(&self, key: &ThreadKey, record: Record) -> Result<AppendOutcome>;

    /// Remove every thread whose newest record is older than `cutoff`,
    /// plus any thread with no records. Returns the number of threads removed.
    fn cleanup_before(&self, cutoff: &Timestamp) -> Result<usize>;

    /// Aggregate counters plus backend identification.
    fn stats(&self) -> Result<StoreStats>;

    /// The retention rules this backend enforces.
    fn policy(&self) -> &RetentionPolicy;

    /// Remove threads idle for more than `age_days`, measured from the
    /// system clock.
    fn cleanup_older_than(&self, age_days: u32) -> Result<usize> {
        self.cleanup_before(&retention::cutoff(SystemClock.now(), age_days))
    }
}

impl<S: ThreadStorage + ?Sized> ThreadStorage for Box<S> {
    fn load_all(&self) -> Result<ThreadMap> {
        (**self).load_all()
    }

    fn save_all(&self, threads: &ThreadMap) -> Result<()> {
        (**self).save_all(threads)
    }

    fn history(&self, key: &ThreadKey) -> Result<Vec<Record>> {
        (**self).history(key)
    }

    fn append(&self, key: &ThreadKey, record: Record) -> Result<AppendOutcome> {
        (**self).append(key, record)
    }

    fn cleanup_before(&self, cutoff: &Timestamp) -> Result<usize> {
        (**self).cleanup_before(cutoff)
    }

    fn stats(&self) -> Result<StoreStats> {
        (**self).stats()
    }

    fn policy(&self) -> &RetentionPolicy {
        (**self).policy()
    }
}
