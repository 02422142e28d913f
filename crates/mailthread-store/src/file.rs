//! JSON document implementation of the ThreadStorage trait.
//!
//! The whole store is one JSON document (see [`crate::codec`]). Every call
//! re-reads the file; nothing is cached between calls, so external edits are
//! picked up. Writes go to a temporary file in the same directory, are synced,
//! then renamed over the target: a reader sees the old document or the new
//! one, never a partial write.
//!
//! A document that fails to parse is moved aside to `<file>.backup_<secs>`
//! and the store starts empty.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use tempfile::NamedTempFile;

use mailthread_core::{is_stale, Record, RetentionPolicy, ThreadCounts, ThreadKey, ThreadMap, Timestamp};

use crate::codec;
use crate::error::{Result, StoreError};
use crate::traits::{AppendOutcome, BackendInfo, StoreStats, ThreadStorage};

/// File-backed store holding every thread in one JSON document.
pub struct JsonFileStore {
    path: PathBuf,
    policy: RetentionPolicy,
    /// Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Create a store over `path`. The file is not touched until first use.
    pub fn new(path: impl Into<PathBuf>, policy: RetentionPolicy) -> Self {
        let path = path.into();
        tracing::info!(path = %path.display(), cap = policy.max_history(), "JSON thread store ready");
        Self {
            path,
            policy,
            lock: Mutex::new(()),
        }
    }

    /// The document path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn locked<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        f()
    }

    /// Read the document. Missing means empty; unparseable is quarantined.
    fn read_document(&self) -> Result<ThreadMap> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ThreadMap::new()),
            Err(e) => return Err(e.into()),
        };

        match codec::decode_document(&bytes) {
            Ok(threads) => Ok(threads),
            Err(e) => {
                let backup = quarantine(&self.path)?;
                tracing::warn!(
                    path = %self.path.display(),
                    backup = %backup.display(),
                    error = %e,
                    "thread document is corrupt; moved aside and starting empty"
                );
                Ok(ThreadMap::new())
            }
        }
    }

    fn write_document(&self, threads: &ThreadMap) -> Result<()> {
        write_atomic_with(&self.path, |file| {
            let mut writer = BufWriter::new(file);
            codec::write_document(&mut writer, threads)?;
            writer.flush()?;
            Ok(())
        })
    }
}

/// Write `path` atomically: `write` fills a temporary sibling file, which is
/// synced and renamed over `path` only if `write` succeeds.
///
/// On failure the temporary file is removed and `path` is left untouched.
pub(crate) fn write_atomic_with<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    write(tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Rename a corrupt document to `<name>.backup_<unix secs>`, adding `_<n>`
/// when that name is taken.
fn quarantine(path: &Path) -> Result<PathBuf> {
    let secs = chrono::Utc::now().timestamp();
    let base = format!("{}.backup_{}", path.display(), secs);

    let mut backup = PathBuf::from(&base);
    let mut n = 1;
    while backup.exists() {
        backup = PathBuf::from(format!("{base}_{n}"));
        n += 1;
    }

    fs::rename(path, &backup)?;
    Ok(backup)
}

impl ThreadStorage for JsonFileStore {
    fn load_all(&self) -> Result<ThreadMap> {
        let started = Instant::now();
        let threads = self.locked(|| self.read_document())?;
        tracing::debug!(
            threads = threads.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "loaded thread document"
        );
        Ok(threads)
    }

    fn save_all(&self, threads: &ThreadMap) -> Result<()> {
        let threads = self.policy.normalize(threads);
        self.locked(|| self.write_document(&threads))?;
        tracing::debug!(threads = threads.len(), path = %self.path.display(), "saved thread document");
        Ok(())
    }

    fn history(&self, key: &ThreadKey) -> Result<Vec<Record>> {
        let threads = self.locked(|| self.read_document())?;
        Ok(threads
            .get(key)
            .map(|history| self.policy.tail(history).to_vec())
            .unwrap_or_default())
    }

    fn append(&self, key: &ThreadKey, record: Record) -> Result<AppendOutcome> {
        let outcome = self.locked(|| {
            let mut threads = self.read_document()?;
            let history = threads.entry(key.clone()).or_default();
            history.push(record);
            let evicted = self.policy.enforce(history);
            let len = history.len();
            self.write_document(&threads)?;
            Ok(AppendOutcome { len, evicted })
        })?;

        if outcome.evicted > 0 {
            tracing::info!(
                thread = %key,
                evicted = outcome.evicted,
                cap = self.policy.max_history(),
                "trimmed thread to cap"
            );
        }
        tracing::debug!(thread = %key, len = outcome.len, "appended record to thread document");
        Ok(outcome)
    }

    fn cleanup_before(&self, cutoff: &Timestamp) -> Result<usize> {
        let removed = self.locked(|| {
            let mut threads = self.read_document()?;
            let before = threads.len();
            threads.retain(|_, history| !is_stale(history, cutoff));
            let removed = before - threads.len();
            if removed > 0 {
                self.write_document(&threads)?;
            }
            Ok(removed)
        })?;

        if removed > 0 {
            tracing::info!(threads = removed, cutoff = %cutoff, "cleaned up stale threads");
        } else {
            tracing::info!(cutoff = %cutoff, "no stale threads to clean up");
        }
        Ok(removed)
    }

    fn stats(&self) -> Result<StoreStats> {
        let threads = self.locked(|| self.read_document())?;
        let (exists, size_bytes) = match fs::metadata(&self.path) {
            Ok(meta) => (true, meta.len()),
            Err(_) => (false, 0),
        };
        Ok(StoreStats {
            backend: BackendInfo::File {
                path: self.path.clone(),
                exists,
                size_bytes,
            },
            counts: ThreadCounts::tally(&threads, &self.policy),
        })
    }

    fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }
}
