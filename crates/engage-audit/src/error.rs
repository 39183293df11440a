// error.rs — Error types for the audit logging subsystem.
//
// Uses `thiserror` to derive the standard Rust `Error` trait automatically.
// Each variant maps to a specific failure mode in the logging pipeline.
// `is_fatal()` separates "the audit trail cannot exist" from hiccups that a
// caller may log and carry on from.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during audit logging operations.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The engagement directory (or its audit layout) could not be created
    /// or written. A session cannot start without an audit trail.
    #[error("engagement directory {path} is not usable for audit logging: {source}")]
    EngagementUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to open a log, transcript, or artifact file.
    #[error("failed to open {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write to a log, transcript, or artifact file.
    #[error("failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to serialize or deserialize a record (malformed JSON).
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to read a file for hashing.
    #[error("failed to hash file at {path}: {source}")]
    HashFileFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The engagement's audit.toml could not be parsed.
    #[error("invalid audit settings in {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    /// The cross-session index lock could not be acquired.
    #[error("failed to lock session index {path}: {source}")]
    IndexLock {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The persistence thread is gone; records can no longer be queued.
    #[error("audit persistence pipeline for session {session_id} is closed")]
    PipelineClosed { session_id: String },
}

impl AuditError {
    /// True when the session cannot (or can no longer) produce a valid audit
    /// trail. Everything else is a recoverable, reportable hiccup.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AuditError::EngagementUnavailable { .. } | AuditError::PipelineClosed { .. }
        )
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AuditError::WriteFailed {
            path: path.into(),
            source,
        }
    }
}
