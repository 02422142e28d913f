//! SQLite implementation of the ThreadStorage trait.
//!
//! One row per record in a single table. Appends insert and evict inside one
//! transaction, so a thread never exceeds the cap and an append that cannot
//! evict leaves nothing behind.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use rusqlite::{params, Connection};

use mailthread_core::{
    stats, Record, RetentionPolicy, ThreadCounts, ThreadKey, ThreadMap, Timestamp,
};

use crate::codec::{row_to_record, RECORD_COLUMNS};
use crate::error::{Result, StoreError};
use crate::schema;
use crate::traits::{AppendOutcome, BackendInfo, StoreStats, ThreadStorage};

const INSERT_RECORD: &str = "INSERT INTO thread_messages (
        thread_key, external_id, sender, subject, body, timestamp, is_reply
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

/// Threads whose newest record is older than ?1.
const STALE_THREADS: &str = "SELECT thread_key FROM thread_messages
     GROUP BY thread_key
     HAVING MAX(timestamp) < ?1";

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Mutex<Connection>,
    /// Database file, `None` for an in-memory database.
    path: Option<PathBuf>,
    policy: RetentionPolicy,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and the schema if they don't exist.
    pub fn open(path: impl AsRef<Path>, policy: RetentionPolicy) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut conn = Connection::open(path)?;
        schema::initialize(&mut conn)?;
        tracing::info!(path = %path.display(), cap = policy.max_history(), "SQLite thread store opened");
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
            policy,
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory(policy: RetentionPolicy) -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        schema::initialize(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
            policy,
        })
    }

    /// Database file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Execute an operation on the connection.
    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        f(&conn)
    }

    /// Execute an operation that needs mutable access (transactions).
    fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        f(&mut conn)
    }

    fn backend_info(&self, conn: &Connection) -> Result<BackendInfo> {
        let (exists, size_bytes) = match &self.path {
            Some(path) => match std::fs::metadata(path) {
                Ok(meta) => (true, meta.len()),
                Err(_) => (false, 0),
            },
            None => {
                let pages: i64 = conn.query_row("PRAGMA page_count", [], |row| row.get(0))?;
                let page_size: i64 = conn.query_row("PRAGMA page_size", [], |row| row.get(0))?;
                (true, (pages * page_size) as u64)
            }
        };
        Ok(BackendInfo::Sqlite {
            path: self.path.clone(),
            exists,
            size_bytes,
        })
    }
}

fn insert_record(conn: &Connection, key: &ThreadKey, record: &Record) -> rusqlite::Result<usize> {
    conn.execute(
        INSERT_RECORD,
        params![
            key.as_str(),
            record.external_id,
            record.sender,
            record.subject,
            record.body,
            record.timestamp.as_str(),
            record.is_reply,
        ],
    )
}

fn count_thread(conn: &Connection, key: &ThreadKey) -> rusqlite::Result<usize> {
    conn.query_row(
        "SELECT COUNT(*) FROM thread_messages WHERE thread_key = ?1",
        params![key.as_str()],
        |row| row.get::<_, i64>(0).map(|n| n as usize),
    )
}

fn count(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> rusqlite::Result<u64> {
    conn.query_row(sql, params, |row| row.get::<_, i64>(0).map(|n| n as u64))
}

impl ThreadStorage for SqliteStore {
    fn load_all(&self) -> Result<ThreadMap> {
        let started = Instant::now();
        let threads = self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS}, thread_key FROM thread_messages
                 ORDER BY thread_key, id"
            ))?;

            let mut threads = ThreadMap::new();
            let rows = stmt.query_map([], |row| {
                let key: String = row.get(6)?;
                Ok((key, row_to_record(row)?))
            })?;
            for row in rows {
                let (key, record) = row?;
                match ThreadKey::new(key) {
                    Ok(key) => threads.entry(key).or_default().push(record),
                    Err(e) => tracing::warn!(error = %e, "skipping row with invalid thread key"),
                }
            }
            Ok(threads)
        })?;

        tracing::debug!(
            threads = threads.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "loaded threads from SQLite"
        );
        Ok(threads)
    }

    fn save_all(&self, threads: &ThreadMap) -> Result<()> {
        let threads = self.policy.normalize(threads);
        tracing::warn!(
            threads = threads.len(),
            "rewriting the entire SQLite thread table"
        );

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM thread_messages", [])?;
            for (key, history) in &threads {
                for record in history {
                    insert_record(&tx, key, record)?;
                }
            }
            tx.commit()?;
            Ok(())
        })
    }

    fn history(&self, key: &ThreadKey) -> Result<Vec<Record>> {
        let cap = self.policy.max_history() as i64;
        let history = self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM (
                     SELECT id, {RECORD_COLUMNS} FROM thread_messages
                     WHERE thread_key = ?1
                     ORDER BY id DESC
                     LIMIT ?2
                 )
                 ORDER BY id"
            ))?;

            let history = stmt
                .query_map(params![key.as_str(), cap], row_to_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(history)
        })?;

        tracing::debug!(thread = %key, records = history.len(), "read SQLite thread history");
        Ok(history)
    }

    fn append(&self, key: &ThreadKey, record: Record) -> Result<AppendOutcome> {
        let cap = self.policy.max_history();
        let started = Instant::now();

        let outcome = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            insert_record(&tx, key, &record)?;

            // Keep the newest `cap` rows of this thread; the rest go.
            let evicted = tx.execute(
                "DELETE FROM thread_messages
                 WHERE thread_key = ?1
                   AND id NOT IN (
                       SELECT id FROM thread_messages
                       WHERE thread_key = ?1
                       ORDER BY id DESC
                       LIMIT ?2
                   )",
                params![key.as_str(), cap as i64],
            )?;

            let len = count_thread(&tx, key)?;
            if len > cap {
                // Dropping the transaction rolls back the insert.
                return Err(StoreError::CapExceeded {
                    thread: key.to_string(),
                    len,
                    cap,
                });
            }

            tx.commit()?;
            Ok(AppendOutcome { len, evicted })
        })?;

        if outcome.evicted > 0 {
            tracing::info!(thread = %key, evicted = outcome.evicted, cap, "trimmed SQLite thread to cap");
        }
        tracing::debug!(
            thread = %key,
            len = outcome.len,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "appended record to SQLite thread"
        );
        Ok(outcome)
    }

    fn cleanup_before(&self, cutoff: &Timestamp) -> Result<usize> {
        let (threads, rows) = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let threads = count(
                &tx,
                &format!("SELECT COUNT(*) FROM ({STALE_THREADS})"),
                params![cutoff.as_str()],
            )? as usize;

            let rows = if threads > 0 {
                tx.execute(
                    &format!("DELETE FROM thread_messages WHERE thread_key IN ({STALE_THREADS})"),
                    params![cutoff.as_str()],
                )?
            } else {
                0
            };

            tx.commit()?;
            Ok((threads, rows))
        })?;

        if threads > 0 {
            tracing::info!(threads, records = rows, cutoff = %cutoff, "cleaned up stale SQLite threads");
        } else {
            tracing::info!(cutoff = %cutoff, "no stale SQLite threads to clean up");
        }
        Ok(threads)
    }

    fn stats(&self) -> Result<StoreStats> {
        let cap = self.policy.max_history() as i64;
        self.with_conn(|conn| {
            let total_threads = count(
                conn,
                "SELECT COUNT(DISTINCT thread_key) FROM thread_messages",
                [],
            )?;
            let total_records = count(conn, "SELECT COUNT(*) FROM thread_messages", [])?;
            let threads_with_history = count(
                conn,
                "SELECT COUNT(*) FROM (
                     SELECT thread_key FROM thread_messages
                     GROUP BY thread_key
                     HAVING COUNT(*) > 1
                 )",
                [],
            )?;
            let threads_at_cap = count(
                conn,
                "SELECT COUNT(*) FROM (
                     SELECT thread_key FROM thread_messages
                     GROUP BY thread_key
                     HAVING COUNT(*) >= ?1
                 )",
                params![cap],
            )?;
            let reply_records = count(
                conn,
                "SELECT COUNT(*) FROM thread_messages WHERE is_reply = 1",
                [],
            )?;

            Ok(StoreStats {
                backend: self.backend_info(conn)?,
                counts: ThreadCounts {
                    total_threads,
                    total_records,
                    threads_with_history,
                    avg_records_per_thread: stats::average(total_records, total_threads),
                    threads_at_cap,
                    reply_records,
                    inbound_records: total_records - reply_records,
                },
            })
        })
    }

    fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }
}
