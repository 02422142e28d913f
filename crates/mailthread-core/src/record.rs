//! Record: one stored message in a conversation thread.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{ThreadKey, Timestamp};

/// A full snapshot of a store, keyed by thread.
///
/// Within each thread, records are in append order (oldest first).
pub type ThreadMap = BTreeMap<ThreadKey, Vec<Record>>;

/// One message in a thread.
///
/// Records are immutable once appended. Field order here is the field order
/// written to the file backend's document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Identifier from the upstream mail system; `None` for locally
    /// synthesized messages such as outgoing replies.
    #[serde(default, alias = "uid")]
    pub external_id: Option<i64>,

    pub sender: String,

    pub subject: String,

    pub body: String,

    /// Assigned when the record is appended.
    pub timestamp: Timestamp,

    /// `true` for replies generated by this system, `false` for inbound mail.
    #[serde(default, alias = "is_bot_reply")]
    pub is_reply: bool,
}

impl Record {
    /// Role label used when rendering a transcript: `system` for our own
    /// replies, the sender otherwise.
    pub fn role(&self) -> &str {
        if self.is_reply {
            "system"
        } else {
            &self.sender
        }
    }
}

/// Newest timestamp in a sequence of records.
pub fn newest_timestamp(records: &[Record]) -> Option<&Timestamp> {
    records.iter().map(|r| &r.timestamp).max()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ts: &str, is_reply: bool) -> Record {
        Record {
            external_id: None,
            sender: "alice@example.com".into(),
            subject: "Hello".into(),
            body: "Body".into(),
            timestamp: Timestamp::from(ts.to_string()),
            is_reply,
        }
    }

    #[test]
    fn test_role_label() {
        assert_eq!(record("2024-01-01T00:00:00.000000Z", false).role(), "alice@example.com");
        assert_eq!(record("2024-01-01T00:00:00.000000Z", true).role(), "system");
    }

    #[test]
    fn test_field_order_on_disk() {
        let json = serde_json::to_string(&record("2024-01-01T00:00:00.000000Z", false)).unwrap();
        let positions: Vec<usize> = ["external_id", "sender", "subject", "body", "timestamp", "is_reply"]
            .iter()
            .map(|field| json.find(field).unwrap())
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn test_reads_legacy_field_names() {
        let legacy = r#"{
            "uid": 101,
            "sender": "customer@test.com",
            "subject": "Product Question",
            "body": "What are your specs?",
            "timestamp": "2024-05-01T09:00:00.123456",
            "is_bot_reply": false
        }"#;
        let record: Record = serde_json::from_str(legacy).unwrap();
        assert_eq!(record.external_id, Some(101));
        assert!(!record.is_reply);
        assert_eq!(record.timestamp.as_str(), "2024-05-01T09:00:00.123456");
    }

    #[test]
    fn test_newest_timestamp() {
        let records = vec![
            record("2024-01-02T00:00:00.000000Z", false),
            record("2024-01-03T00:00:00.000000Z", true),
            record("2024-01-01T00:00:00.000000Z", false),
        ];
        assert_eq!(
            newest_timestamp(&records).map(Timestamp::as_str),
            Some("2024-01-03T00:00:00.000000Z")
        );
        assert!(newest_timestamp(&[]).is_none());
    }
}
