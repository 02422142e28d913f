//! # Mailthread Core
//!
//! Pure primitives for the mailthread store: thread keys, message records,
//! timestamps, and the retention policy every backend applies.
//!
//! This crate contains no I/O, no storage, no logging. It is plain data and
//! the rules over it.
//!
//! ## Key Types
//!
//! - [`ThreadKey`] - Validated, opaque conversation identifier
//! - [`Record`] - One stored message in a thread
//! - [`Timestamp`] - ISO-8601 instant whose string order is chronological
//! - [`ThreadMap`] - Full snapshot of a store: thread key to ordered records
//! - [`RetentionPolicy`] - Per-thread cap and age-based staleness rules
//! - [`ThreadCounts`] - Aggregate counters reported by every backend
//!
//! ## Time
//!
//! Record timestamps are assigned by the caller-facing façade, never by a
//! backend. [`TimestampSequence`] hands out strictly increasing timestamps
//! from any [`Clock`].

pub mod clock;
pub mod error;
pub mod record;
pub mod retention;
pub mod stats;
pub mod types;

pub use clock::{Clock, SystemClock, TimestampSequence};
pub use error::ValidationError;
pub use record::{newest_timestamp, Record, ThreadMap};
pub use retention::{cutoff, is_stale, RetentionPolicy, DEFAULT_MAX_HISTORY};
pub use stats::ThreadCounts;
pub use types::{ThreadKey, Timestamp};
