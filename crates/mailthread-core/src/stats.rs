//! Aggregate counters over a store's contents.

use serde::{Deserialize, Serialize};

use crate::record::ThreadMap;
use crate::retention::RetentionPolicy;

/// Backend-independent counters.
///
/// Two backends holding the same logical contents report equal counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreadCounts {
    pub total_threads: u64,
    pub total_records: u64,
    /// Threads holding more than one record.
    pub threads_with_history: u64,
    /// Rounded to one decimal place.
    pub avg_records_per_thread: f64,
    /// Threads whose record count has reached the cap.
    pub threads_at_cap: u64,
    pub reply_records: u64,
    pub inbound_records: u64,
}

impl ThreadCounts {
    /// Count a full snapshot.
    pub fn tally(threads: &ThreadMap, policy: &RetentionPolicy) -> Self {
        let mut counts = Self {
            total_threads: threads.len() as u64,
            ..Self::default()
        };

        for history in threads.values() {
            counts.total_records += history.len() as u64;
            if history.len() > 1 {
                counts.threads_with_history += 1;
            }
            if policy.is_at_cap(history.len()) {
                counts.threads_at_cap += 1;
            }
            let replies = history.iter().filter(|r| r.is_reply).count() as u64;
            counts.reply_records += replies;
            counts.inbound_records += history.len() as u64 - replies;
        }

        counts.avg_records_per_thread = average(counts.total_records, counts.total_threads);
        counts
    }
}

/// Records per thread, rounded to one decimal place.
pub fn average(total_records: u64, total_threads: u64) -> f64 {
    if total_threads == 0 {
        return 0.0;
    }
    let avg = total_records as f64 / total_threads as f64;
    (avg * 10.0).round() / 10.0
}
