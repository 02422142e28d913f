//! Record codec: how a [`Record`] maps onto each backend's native form.
//!
//! ## File document
//!
//! A single JSON object mapping thread keys to arrays of records:
//!
//! ```text
//! {
//!   "<thread key>": [
//!     { "external_id": 101, "sender": "...", "subject": "...",
//!       "body": "...", "timestamp": "...", "is_reply": false }
//!   ]
//! }
//! ```
//!
//! Keys are sorted, fields keep the struct's declaration order, output is
//! indented by two spaces, and non-ASCII text is written as UTF-8 rather
//! than escaped, so the file stays diffable.
//!
//! ## SQLite row
//!
//! One row per record in `thread_messages`; `is_reply` is stored as 0/1 and
//! `external_id` as a nullable integer.

use std::io::Write;

use mailthread_core::{Record, ThreadMap, Timestamp};

use crate::error::Result;

/// Columns selected when reading records back from SQLite, in
/// [`row_to_record`] order.
pub const RECORD_COLUMNS: &str = "external_id, sender, subject, body, timestamp, is_reply";

/// Write a thread document.
pub fn write_document<W: Write>(mut writer: W, threads: &ThreadMap) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, threads)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Encode a thread document to bytes.
pub fn encode_document(threads: &ThreadMap) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_document(&mut buf, threads)?;
    Ok(buf)
}

/// Decode a thread document.
pub fn decode_document(bytes: &[u8]) -> Result<ThreadMap> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Helper to convert a row to Record.
pub fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<Record> {
    let timestamp: String = row.get(4)?;
    Ok(Record {
        external_id: row.get(0)?,
        sender: row.get(1)?,
        subject: row.get(2)?,
        body: row.get(3)?,
        timestamp: Timestamp::from(timestamp),
        is_reply: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailthread_core::ThreadKey;

    fn sample() -> ThreadMap {
        let mut threads = ThreadMap::new();
        threads.insert(
            ThreadKey::new("zeta").unwrap(),
            vec![Record {
                external_id: None,
                sender: "bot@company.com".into(),
                subject: "Re: Grüße".into(),
                body: "Danke schön ✓".into(),
                timestamp: Timestamp::from("2024-01-02T00:00:00.000000Z".to_string()),
                is_reply: true,
            }],
        );
        threads.insert(
            ThreadKey::new("alpha").unwrap(),
            vec![Record {
                external_id: Some(7),
                sender: "customer@test.com".into(),
                subject: "Hi".into(),
                body: "Line one\nLine two".into(),
                timestamp: Timestamp::from("2024-01-01T00:00:00.000000Z".to_string()),
                is_reply: false,
            }],
        );
        threads
    }

    #[test]
    fn test_document_is_human_readable() {
        let text = String::from_utf8(encode_document(&sample()).unwrap()).unwrap();

        // Non-ASCII written verbatim.
        assert!(text.contains("Grüße"));
        assert!(text.contains("✓"));
        // Sorted keys.
        assert!(text.find("\"alpha\"").unwrap() < text.find("\"zeta\"").unwrap());
        // Two-space indentation.
        assert!(text.starts_with("{\n  \"alpha\": ["));
    }

    #[test]
    fn test_document_decodes_to_same_records() {
        let threads = sample();
        let decoded = decode_document(&encode_document(&threads).unwrap()).unwrap();
        assert_eq!(decoded, threads);
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(decode_document(b"{ not json").is_err());
        assert!(decode_document(b"[1, 2, 3]").is_err());
        assert!(decode_document(b"").is_err());
    }
}
