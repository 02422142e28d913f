//! In-memory implementation of the ThreadStorage trait.
//!
//! Same semantics as the persistent backends, nothing survives the process.
//! Used by tests and for ephemeral runs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use mailthread_core::{is_stale, Record, RetentionPolicy, ThreadCounts, ThreadKey, ThreadMap, Timestamp};

use crate::error::{Result, StoreError};
use crate::traits::{AppendOutcome, BackendInfo, StoreStats, ThreadStorage};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    threads: RwLock<ThreadMap>,
    policy: RetentionPolicy,
    operations: AtomicU64,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new(policy: RetentionPolicy) -> Self {
        Self {
            threads: RwLock::new(ThreadMap::new()),
            policy,
            operations: AtomicU64::new(0),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, ThreadMap>> {
        self.operations.fetch_add(1, Ordering::Relaxed);
        self.threads
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, ThreadMap>> {
        self.operations.fetch_add(1, Ordering::Relaxed);
        self.threads
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(RetentionPolicy::default())
    }
}

impl ThreadStorage for MemoryStore {
    fn load_all(&self) -> Result<ThreadMap> {
        Ok(self.read()?.clone())
    }

    fn save_all(&self, threads: &ThreadMap) -> Result<()> {
        let normalized = self.policy.normalize(threads);
        *self.write()? = normalized;
        Ok(())
    }

    fn history(&self, key: &ThreadKey) -> Result<Vec<Record>> {
        let threads = self.read()?;
        Ok(threads
            .get(key)
            .map(|history| self.policy.tail(history).to_vec())
            .unwrap_or_default())
    }

    fn append(&self, key: &ThreadKey, record: Record) -> Result<AppendOutcome> {
        let mut threads = self.write()?;
        let history = threads.entry(key.clone()).or_default();
        history.push(record);
        let evicted = self.policy.enforce(history);
        let len = history.len();
        drop(threads);

        if evicted > 0 {
            tracing::debug!(thread = %key, evicted, "trimmed in-memory thread to cap");
        }
        Ok(AppendOutcome { len, evicted })
    }

    fn cleanup_before(&self, cutoff: &Timestamp) -> Result<usize> {
        let mut threads = self.write()?;
        let before = threads.len();
        threads.retain(|_, history| !is_stale(history, cutoff));
        let removed = before - threads.len();
        drop(threads);

        tracing::info!(threads = removed, cutoff = %cutoff, "cleaned up stale in-memory threads");
        Ok(removed)
    }

    fn stats(&self) -> Result<StoreStats> {
        let threads = self.read()?;
        let counts = ThreadCounts::tally(&threads, &self.policy);
        drop(threads);
        Ok(StoreStats {
            backend: BackendInfo::Memory {
                operations: self.operations.load(Ordering::Relaxed),
            },
            counts,
        })
    }

    fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }
}
