//! SQLite schema for the thread store.
//!
//! The schema is created idempotently on open. Its version is stamped into
//! `PRAGMA user_version`; a database stamped by a newer build is refused
//! rather than guessed at.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Table holding one row per record.
pub const TABLE: &str = "thread_messages";

/// Create the schema if needed and check its version.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn initialize(conn: &mut Connection) -> Result<()> {
    let current: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if current > SCHEMA_VERSION {
        return Err(StoreError::Schema(format!(
            "database schema version {} is newer than supported version {}",
            current, SCHEMA_VERSION
        )));
    }

    let tx = conn.transaction()?;
    tx.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS thread_messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            thread_key TEXT NOT NULL,
            external_id INTEGER,                  -- upstream mail id, NULL for local replies
            sender TEXT NOT NULL,
            subject TEXT NOT NULL,
            body TEXT NOT NULL,
            timestamp TEXT NOT NULL,              -- ISO-8601, assigned at append
            is_reply INTEGER NOT NULL DEFAULT 0,  -- 1 for system-generated replies
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX IF NOT EXISTS idx_thread_messages_thread_key ON thread_messages(thread_key);
        CREATE INDEX IF NOT EXISTS idx_thread_messages_timestamp ON thread_messages(timestamp);
        "#,
    )?;
    if current < SCHEMA_VERSION {
        tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    }
    tx.commit()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_creates_table_and_indexes() {
        let mut conn = Connection::open_in_memory().unwrap();
        initialize(&mut conn).unwrap();

        let names: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE tbl_name = ?1 ORDER BY name")
            .unwrap()
            .query_map([TABLE], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(names.contains(&"thread_messages".to_string()));
        assert!(names.contains(&"idx_thread_messages_thread_key".to_string()));
        assert!(names.contains(&"idx_thread_messages_timestamp".to_string()));
    }

    #[test]
    fn test_initialize_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        initialize(&mut conn).unwrap();
        initialize(&mut conn).unwrap(); // Should not error

        let version: u32 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_newer_schema_refused() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .unwrap();

        let err = initialize(&mut conn).unwrap_err();
        assert!(matches!(err, StoreError::Schema(_)));
    }
}
