//! Proptest generators for property-based testing.

use chrono::Duration;
use proptest::prelude::*;

use mailthread_core::{Record, Timestamp};

use crate::fixtures::fixed_now;

/// A thread name drawn from a small alphabet so generated appends collide
/// on the same threads often.
pub fn thread_name(threads: usize) -> impl Strategy<Value = String> {
    (0..threads.max(1)).prop_map(|n| format!("thread-{n}"))
}

/// Generate a record timestamped `minutes` after the fixture anchor.
pub fn record_at(minutes: i64) -> impl Strategy<Value = Record> {
    (
        prop::option::of(0i64..1_000_000),
        "[a-z]{1,8}",
        "[ -~]{0,24}",
        "[ -~\\n]{0,64}",
        any::<bool>(),
    )
        .prop_map(move |(external_id, user, subject, body, is_reply)| Record {
            external_id,
            sender: format!("{user}@example.com"),
            subject,
            body,
            timestamp: Timestamp::from_datetime(fixed_now() + Duration::minutes(minutes)),
            is_reply,
        })
}

/// One append in a generated sequence.
#[derive(Debug, Clone)]
pub struct AppendOp {
    pub thread: String,
    pub record: Record,
}

/// A sequence of up to `max_ops` appends spread over `threads` threads.
///
/// Timestamps strictly increase along the sequence, as they do when the
/// façade assigns them.
pub fn append_ops(threads: usize, max_ops: usize) -> impl Strategy<Value = Vec<AppendOp>> {
    prop::collection::vec(thread_name(threads), 0..=max_ops).prop_flat_map(|names| {
        names
            .into_iter()
            .enumerate()
            .map(|(i, thread)| {
                record_at(i as i64).prop_map(move |record| AppendOp {
                    thread: thread.clone(),
                    record,
                })
            })
            .collect::<Vec<_>>()
    })
}
