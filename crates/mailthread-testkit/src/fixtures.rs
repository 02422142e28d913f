//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;

use mailthread_core::{Clock, Record, RetentionPolicy, ThreadKey, Timestamp};
use mailthread_store::{JsonFileStore, MemoryStore, SqliteStore, ThreadStorage};

/// The instant fixtures are anchored to: 2024-06-01T12:00:00Z.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// A clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(at),
        }
    }

    /// Jump to `at`, forwards or backwards.
    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap() = at;
    }

    /// Move forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now = *now + by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(fixed_now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Parse a thread key, panicking on invalid input.
pub fn thread_key(key: &str) -> ThreadKey {
    ThreadKey::new(key).unwrap()
}

/// An inbound record labelled `label`, timestamped `at`.
///
/// The label shows up in sender, subject, and body so histories are easy to
/// compare in assertion output.
pub fn record(label: &str, at: DateTime<Utc>) -> Record {
    Record {
        external_id: None,
        sender: format!("{label}@example.com"),
        subject: format!("Subject {label}"),
        body: format!("Body {label}"),
        timestamp: Timestamp::from_datetime(at),
        is_reply: false,
    }
}

/// A reply record labelled `label`, timestamped `at`.
pub fn reply(label: &str, at: DateTime<Utc>) -> Record {
    Record {
        sender: "system@example.com".to_string(),
        is_reply: true,
        ..record(label, at)
    }
}

/// An inbound record timestamped `days` before `now`.
pub fn record_days_ago(label: &str, now: DateTime<Utc>, days: i64) -> Record {
    record(label, now - Duration::days(days))
}

/// All three backends with the same cap, the on-disk ones in a private
/// temporary directory that lives as long as the harness.
pub struct BackendHarness {
    dir: TempDir,
    pub file: JsonFileStore,
    pub sqlite: SqliteStore,
    pub memory: MemoryStore,
}

impl BackendHarness {
    pub fn new(max_history: usize) -> Self {
        let policy = RetentionPolicy::new(max_history).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let file = JsonFileStore::new(dir.path().join("threads.json"), policy);
        let sqlite = SqliteStore::open(dir.path().join("threads.db"), policy).unwrap();
        Self {
            dir,
            file,
            sqlite,
            memory: MemoryStore::new(policy),
        }
    }

    /// The temporary directory holding the on-disk backends.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Every backend, labelled for assertion messages.
    pub fn backends(&self) -> [(&'static str, &dyn ThreadStorage); 3] {
        [
            ("file", &self.file),
            ("sqlite", &self.sqlite),
            ("memory", &self.memory),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::default();
        assert_eq!(clock.now(), fixed_now());

        clock.advance(Duration::days(2));
        assert_eq!(clock.now(), fixed_now() + Duration::days(2));

        clock.set(fixed_now() - Duration::days(1));
        assert_eq!(clock.now(), fixed_now() - Duration::days(1));
    }

    #[test]
    fn test_record_days_ago() {
        let r = record_days_ago("old", fixed_now(), 40);
        assert_eq!(r.timestamp, Timestamp::from_datetime(fixed_now() - Duration::days(40)));
        assert!(!r.is_reply);
        assert!(reply("r", fixed_now()).is_reply);
    }

    #[test]
    fn test_harness_backends_start_empty() {
        let harness = BackendHarness::new(3);
        for (name, backend) in harness.backends() {
            assert!(backend.load_all().unwrap().is_empty(), "{name}");
            assert_eq!(backend.policy().max_history(), 3, "{name}");
        }
        assert!(harness.dir().join("threads.db").exists());
    }
}
