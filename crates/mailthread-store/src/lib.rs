//! # Mailthread Store
//!
//! Storage abstraction for mailthread. Provides a trait-based interface for
//! per-thread message history with JSON file, SQLite, and in-memory
//! implementations.
//!
//! ## Overview
//!
//! Callers hold a [`ThreadStorage`] and never care which backend is behind
//! it. All three backends enforce the same [`RetentionPolicy`] cap and the
//! same whole-thread cleanup rule, and are tested for parity.
//!
//! ## Key Types
//!
//! - [`ThreadStorage`] - The trait for all storage operations
//! - [`JsonFileStore`] - One JSON document, rewritten atomically
//! - [`SqliteStore`] - One row per record in SQLite
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`AppendOutcome`] - Result of appending a record
//! - [`StoreStats`] - Counters plus backend identification
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mailthread_core::{RetentionPolicy, ThreadKey};
//! use mailthread_store::{SqliteStore, ThreadStorage};
//!
//! fn example() -> mailthread_store::Result<()> {
//!     let store = SqliteStore::open("email_threads.db", RetentionPolicy::new(5).unwrap())?;
//!
//!     let key = ThreadKey::new("thread-42").unwrap();
//!     for record in store.history(&key)? {
//!         println!("{}: {}", record.role(), record.body);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! [`RetentionPolicy`]: mailthread_core::RetentionPolicy

pub mod codec;
pub mod error;
pub mod file;
pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{AppendOutcome, BackendInfo, StoreStats, ThreadStorage};
