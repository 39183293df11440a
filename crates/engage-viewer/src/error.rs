// error.rs — Error types for reading an engagement's audit trail.

use std::path::PathBuf;

use engage_audit::AuditError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewerError {
    /// The engagement has no `audit-logs` directory.
    #[error("no audit logs found in {path}")]
    NoAuditLogs { path: PathBuf },

    /// The audit directory exists but holds no sessions.
    #[error("no audit sessions found in {path}")]
    NoSessions { path: PathBuf },

    #[error("session not found: {session_id}")]
    SessionNotFound { session_id: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Unknown output format name.
    #[error("invalid format '{0}' (expected table, json, or transcript)")]
    InvalidFormat(String),
}

impl ViewerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ViewerError::Io {
            path: path.into(),
            source,
        }
    }
}

/// The viewer only calls the read side of `engage-audit`, so every error it
/// can get back is an I/O or parse failure.
impl From<AuditError> for ViewerError {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::OpenFailed { path, source }
            | AuditError::WriteFailed { path, source }
            | AuditError::HashFileFailed { path, source }
            | AuditError::IndexLock { path, source }
            | AuditError::EngagementUnavailable { path, source } => ViewerError::Io { path, source },
            AuditError::Serialization(e) => ViewerError::Serialization(e),
            other => ViewerError::Io {
                path: PathBuf::new(),
                source: std::io::Error::other(other.to_string()),
            },
        }
    }
}
