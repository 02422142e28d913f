//! The ThreadStore: the single entry point for thread history.
//!
//! Wraps one backend, chosen once at construction. Validates thread keys
//! before any backend call and stamps every record with a timestamp from its
//! own clock, so all backends see the same time semantics.

use std::sync::Arc;

use mailthread_core::{
    retention, Clock, Record, RetentionPolicy, SystemClock, ThreadKey, ThreadMap, Timestamp,
    TimestampSequence,
};
use mailthread_store::{
    AppendOutcome, JsonFileStore, MemoryStore, SqliteStore, StoreStats, ThreadStorage,
};

use crate::config::{BackendKind, StoreConfig};
use crate::error::Result;
use crate::transcript::format_transcript;

/// A message to append. The timestamp is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub sender: String,
    pub subject: String,
    pub body: String,
    /// Upstream mail id, when the message came from a mailbox.
    pub external_id: Option<i64>,
    /// Whether this is a reply the system sent.
    pub is_reply: bool,
}

impl NewMessage {
    /// A message received from a correspondent.
    pub fn inbound(
        sender: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            subject: subject.into(),
            body: body.into(),
            external_id: None,
            is_reply: false,
        }
    }

    /// A reply sent by the system.
    pub fn reply(
        sender: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            is_reply: true,
            ..Self::inbound(sender, subject, body)
        }
    }

    /// Set the upstream mail id.
    pub fn external_id(mut self, id: i64) -> Self {
        self.external_id = Some(id);
        self
    }

    fn into_record(self, timestamp: Timestamp) -> Record {
        Record {
            external_id: self.external_id,
            sender: self.sender,
            subject: self.subject,
            body: self.body,
            timestamp,
            is_reply: self.is_reply,
        }
    }
}

/// Build the backend a configuration selects.
pub fn open_backend(config: &StoreConfig) -> Result<Box<dyn ThreadStorage>> {
    let policy = config.retention_policy()?;
    let backend: Box<dyn ThreadStorage> = match config.backend {
        BackendKind::File => Box::new(JsonFileStore::new(&config.file_path, policy)),
        BackendKind::Sql => Box::new(SqliteStore::open(&config.sqlite_path, policy)?),
        BackendKind::Memory => Box::new(MemoryStore::new(policy)),
    };
    Ok(backend)
}

/// The thread store façade.
///
/// Two method families:
/// - `try_*` return the failure cause as a [`ThreadError`](crate::ThreadError).
/// - The plain methods never fail: they log the cause and return `false`,
///   an empty value, or `None`.
pub struct ThreadStore {
    backend: Box<dyn ThreadStorage>,
    timestamps: TimestampSequence<Arc<dyn Clock>>,
}

impl ThreadStore {
    /// Build the configured backend on the system clock.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let backend = open_backend(config)?;
        tracing::info!(
            backend = %config.backend,
            location = ?config.location(),
            max_history = config.max_history,
            "thread store opened"
        );
        Ok(Self::new(backend))
    }

    /// Wrap an existing backend, on the system clock.
    pub fn new(backend: Box<dyn ThreadStorage>) -> Self {
        Self::with_clock(backend, Arc::new(SystemClock))
    }

    /// Wrap an existing backend with a custom clock.
    pub fn with_clock(backend: Box<dyn ThreadStorage>, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            timestamps: TimestampSequence::new(clock),
        }
    }

    /// The active backend.
    pub fn backend(&self) -> &dyn ThreadStorage {
        self.backend.as_ref()
    }

    /// The retention policy the backend enforces.
    pub fn policy(&self) -> &RetentionPolicy {
        self.backend.policy()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Fallible Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Append a message to a thread, stamping it with the current time.
    ///
    /// An empty key is rejected before the backend is touched.
    pub fn try_append(&self, key: &str, message: NewMessage) -> Result<AppendOutcome> {
        let key = ThreadKey::new(key)?;
        let record = message.into_record(self.timestamps.next());
        let kind = if record.is_reply { "reply" } else { "inbound" };
        tracing::info!(thread = %key, kind, "adding record to thread");
        Ok(self.backend.append(&key, record)?)
    }

    /// Up to the cap's worth of the most recent records, oldest first.
    pub fn try_history(&self, key: &str) -> Result<Vec<Record>> {
        let key = ThreadKey::new(key)?;
        Ok(self.backend.history(&key)?)
    }

    /// The thread's history rendered by [`format_transcript`].
    pub fn try_transcript(&self, key: &str) -> Result<String> {
        let history = self.try_history(key)?;
        tracing::debug!(thread = key, records = history.len(), "formatting transcript");
        Ok(format_transcript(&history))
    }

    /// Snapshot of every thread.
    pub fn try_load_all(&self) -> Result<ThreadMap> {
        Ok(self.backend.load_all()?)
    }

    /// Replace the entire persisted state.
    pub fn try_save_all(&self, threads: &ThreadMap) -> Result<()> {
        Ok(self.backend.save_all(threads)?)
    }

    /// Remove threads whose newest record is more than `age_days` old,
    /// measured from this store's clock.
    pub fn try_cleanup_older_than(&self, age_days: u32) -> Result<usize> {
        let cutoff = retention::cutoff(self.timestamps.clock().now(), age_days);
        Ok(self.backend.cleanup_before(&cutoff)?)
    }

    /// Aggregate counters plus backend identification.
    pub fn try_stats(&self) -> Result<StoreStats> {
        Ok(self.backend.stats()?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Infallible Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Append a message; `false` on any failure.
    pub fn append(&self, key: &str, message: NewMessage) -> bool {
        match self.try_append(key, message) {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(thread = key, error = %e, "failed to append record");
                false
            }
        }
    }

    /// Thread history; empty on any failure.
    pub fn history(&self, key: &str) -> Vec<Record> {
        self.try_history(key).unwrap_or_else(|e| {
            tracing::error!(thread = key, error = %e, "failed to read thread history");
            Vec::new()
        })
    }

    /// Rendered transcript; empty on any failure.
    pub fn transcript(&self, key: &str) -> String {
        format_transcript(&self.history(key))
    }

    /// Snapshot of every thread; empty on any failure.
    pub fn load_all(&self) -> ThreadMap {
        self.try_load_all().unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to load threads");
            ThreadMap::new()
        })
    }

    /// Replace the entire persisted state; `false` on any failure.
    pub fn save_all(&self, threads: &ThreadMap) -> bool {
        match self.try_save_all(threads) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "failed to save threads");
                false
            }
        }
    }

    /// Remove stale threads; `0` on any failure.
    pub fn cleanup_older_than(&self, age_days: u32) -> usize {
        self.try_cleanup_older_than(age_days).unwrap_or_else(|e| {
            tracing::error!(age_days, error = %e, "failed to clean up threads");
            0
        })
    }

    /// Store statistics; `None` on any failure.
    pub fn stats(&self) -> Option<StoreStats> {
        match self.try_stats() {
            Ok(stats) => Some(stats),
            Err(e) => {
                tracing::error!(error = %e, "failed to compute thread stats");
                None
            }
        }
    }
}
