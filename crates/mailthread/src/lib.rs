//! # Mailthread
//!
//! Per-thread conversation history for a mail-processing pipeline: the
//! messages received on each conversation and the replies sent, capped at a
//! fixed number per thread and purged when a conversation goes quiet.
//!
//! ## Overview
//!
//! [`ThreadStore`] is the only entry point. It selects a backend once, from
//! [`StoreConfig`], then:
//!
//! - **Validates** thread keys before any backend call
//! - **Timestamps** every record from its own clock
//! - **Formats** a thread as a transcript for downstream prompting
//! - **Delegates** everything else to the backend
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mailthread::{Config, NewMessage, ThreadStore};
//!
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(None)?;
//!     let store = ThreadStore::open(&config.storage)?;
//!
//!     store.append(
//!         "thread-42",
//!         NewMessage::inbound("alice@example.com", "Order status", "Where is my order?")
//!             .external_id(1017),
//!     );
//!     println!("{}", store.transcript("thread-42"));
//!
//!     let removed = store.cleanup_older_than(30);
//!     println!("removed {removed} stale threads");
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `mailthread::core` - Records, thread keys, timestamps, retention
//! - `mailthread::storage` - The storage trait and its backends

pub mod config;
pub mod error;
pub mod logging;
pub mod store;
pub mod transcript;

// Re-export component crates
pub use mailthread_core as core;
pub use mailthread_store as storage;

// Re-export main types for convenience
pub use config::{BackendKind, Config, LoggingConfig, StoreConfig};
pub use error::{ConfigError, Result, ThreadError};
pub use store::{open_backend, NewMessage, ThreadStore};
pub use transcript::format_transcript;

// Re-export commonly used core types
pub use mailthread_core::{Clock, Record, RetentionPolicy, SystemClock, ThreadKey, ThreadMap, Timestamp};
pub use mailthread_store::{AppendOutcome, BackendInfo, StoreStats, ThreadStorage};
