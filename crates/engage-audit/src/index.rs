// index.rs — Cross-session index (`audit-index.json`).
//
// One JSON object keyed by session id. Every session read-modify-writes it
// exactly once, at shutdown. Several sessions may finish against the same
// engagement at once, so the update runs under an exclusive advisory lock on
// a sibling lock file.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuditError;
use crate::layout::AuditLayout;

/// Summary of one completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionIndexEntry {
    pub started: DateTime<Utc>,
    pub ended: DateTime<Utc>,
    pub commands: u64,
    /// Structured log path, relative to the audit directory.
    pub jsonl_file: String,
    /// Transcript path, relative to the audit directory.
    pub transcript_file: String,
}

/// Session id → summary, ordered by id.
pub type SessionIndex = BTreeMap<String, SessionIndexEntry>;

/// Read the index. A missing file is an empty index.
pub fn read_index(path: &Path) -> Result<SessionIndex, AuditError> {
    if !path.exists() {
        return Ok(SessionIndex::new());
    }
    let json = fs::read_to_string(path).map_err(|source| AuditError::OpenFailed {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&json)?)
}

/// Insert (or replace) one session's entry under the index lock.
pub fn record_session(
    layout: &AuditLayout,
    session_id: &str,
    entry: SessionIndexEntry,
) -> Result<(), AuditError> {
    let _lock = IndexLock::acquire(&layout.index_lock_path())?;
    let path = layout.index_path();

    let mut index = match read_index(&path) {
        Ok(index) => index,
        Err(AuditError::Serialization(e)) => {
            // Keep the unreadable copy for inspection rather than silently
            // dropping every other session's summary.
            let backup = path.with_extension("json.corrupt");
            tracing::warn!(
                path = %path.display(),
                backup = %backup.display(),
                error = %e,
                "session index unreadable, starting a fresh one"
            );
            fs::rename(&path, &backup).map_err(|e| AuditError::write(&backup, e))?;
            SessionIndex::new()
        }
        Err(e) => return Err(e),
    };

    index.insert(session_id.to_string(), entry);
    let json = serde_json::to_string_pretty(&index)?;

    // Write-then-rename so readers never see a half-written index.
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|e| AuditError::write(&tmp, e))?;
    fs::rename(&tmp, &path).map_err(|e| AuditError::write(&path, e))?;

    tracing::debug!(session_id, path = %path.display(), "session index updated");
    Ok(())
}

/// Exclusive advisory lock held for the duration of an index update.
struct IndexLock {
    file: File,
    path: PathBuf,
}

impl IndexLock {
    fn acquire(path: &Path) -> Result<Self, AuditError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|source| AuditError::IndexLock {
                path: path.to_path_buf(),
                source,
            })?;

        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            // Blocking: a concurrent shutdown holds it only for one rewrite.
            let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) };
            if rc != 0 {
                return Err(AuditError::IndexLock {
                    path: path.to_path_buf(),
                    source: std::io::Error::last_os_error(),
                });
            }
        }

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }
}

impl Drop for IndexLock {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            let rc = unsafe { libc::flock(self.file.as_raw_fd(), libc::LOCK_UN) };
            if rc != 0 {
                tracing::warn!(path = %self.path.display(), "failed to release index lock");
            }
        }
    }
}
