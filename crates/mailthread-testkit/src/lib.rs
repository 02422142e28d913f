//! # Mailthread Testkit
//!
//! Testing utilities for mailthread.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a settable clock, record builders, and a harness holding
//!   all three backends side by side
//! - **Generators**: Proptest strategies for property-based testing
//!
//! ## Backend Parity
//!
//! Drive every backend with the same calls and compare:
//!
//! ```rust
//! use mailthread_store::ThreadStorage;
//! use mailthread_testkit::fixtures::{fixed_now, record, thread_key, BackendHarness};
//!
//! let harness = BackendHarness::new(2);
//! for (name, backend) in harness.backends() {
//!     backend.append(&thread_key("t1"), record("a", fixed_now())).unwrap();
//!     assert_eq!(backend.history(&thread_key("t1")).unwrap().len(), 1, "{name}");
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use mailthread_testkit::generators::append_ops;
//!
//! proptest! {
//!     #[test]
//!     fn cap_holds(ops in append_ops(3, 20)) {
//!         // apply ops, check every thread is within the cap
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{
    fixed_now, record, record_days_ago, reply, thread_key, BackendHarness, ManualClock,
};
pub use generators::{append_ops, record_at, thread_name, AppendOp};
