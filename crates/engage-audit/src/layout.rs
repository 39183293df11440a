// layout.rs — Where an engagement's audit files live.
//
// Every path the logger writes and the viewer reads is derived here, so the
// two sides agree on the on-disk layout without sharing any live state:
//
//   <engagement>/audit-logs/
//     README.md, audit-config.json, audit-index.json, audit-index.lock
//     sessions/<session>.jsonl, sessions/<session>.txt
//     sessions/<session>-outputs/
//     compliance/timeline-<session>.md

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuditError;
use crate::settings::Verbosity;

pub const AUDIT_DIR: &str = "audit-logs";
pub const SESSIONS_DIR: &str = "sessions";
pub const COMPLIANCE_DIR: &str = "compliance";
pub const INDEX_FILE: &str = "audit-index.json";
pub const INDEX_LOCK_FILE: &str = "audit-index.lock";
pub const CONFIG_FILE: &str = "audit-config.json";
pub const README_FILE: &str = "README.md";

/// Engagement-wide audit paths.
#[derive(Debug, Clone)]
pub struct AuditLayout {
    pub engagement_dir: PathBuf,
    pub audit_dir: PathBuf,
    pub sessions_dir: PathBuf,
    pub compliance_dir: PathBuf,
}

impl AuditLayout {
    pub fn for_engagement(engagement_dir: impl AsRef<Path>) -> Self {
        let engagement_dir = engagement_dir.as_ref().to_path_buf();
        let audit_dir = engagement_dir.join(AUDIT_DIR);
        Self {
            sessions_dir: audit_dir.join(SESSIONS_DIR),
            compliance_dir: audit_dir.join(COMPLIANCE_DIR),
            audit_dir,
            engagement_dir,
        }
    }

    /// Final component of the engagement directory, used as its display name.
    pub fn engagement_name(&self) -> String {
        self.engagement_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.engagement_dir.display().to_string())
    }

    pub fn index_path(&self) -> PathBuf {
        self.audit_dir.join(INDEX_FILE)
    }

    pub fn index_lock_path(&self) -> PathBuf {
        self.audit_dir.join(INDEX_LOCK_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.audit_dir.join(CONFIG_FILE)
    }

    pub fn readme_path(&self) -> PathBuf {
        self.audit_dir.join(README_FILE)
    }

    pub fn session(&self, session_id: &str) -> SessionPaths {
        SessionPaths {
            jsonl: self.sessions_dir.join(format!("{}.jsonl", session_id)),
            transcript: self.sessions_dir.join(format!("{}.txt", session_id)),
            outputs_dir: self.sessions_dir.join(format!("{}-outputs", session_id)),
            timeline: self
                .compliance_dir
                .join(format!("timeline-{}.md", session_id)),
        }
    }

    /// Path relative to the audit directory, for index entries and reports.
    pub fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.audit_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    /// Claim a session id for a session starting at `started`.
    ///
    /// Ids are second-resolution timestamps; a numeric suffix keeps two
    /// sessions started in the same second from sharing files. The claim is
    /// the creation of the session's outputs directory, so concurrent
    /// loggers on one engagement never receive the same id.
    pub fn reserve_session_id(&self, started: DateTime<Utc>) -> Result<String, AuditError> {
        let base = format!("session-{}", started.format("%Y%m%d-%H%M%S"));
        let mut candidate = base.clone();
        let mut n = 2;
        loop {
            let paths = self.session(&candidate);
            if !paths.has_logs() {
                match fs::create_dir(&paths.outputs_dir) {
                    Ok(()) => return Ok(candidate),
                    Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                    Err(source) => {
                        return Err(AuditError::EngagementUnavailable {
                            path: paths.outputs_dir,
                            source,
                        })
                    }
                }
            }
            candidate = format!("{}-{}", base, n);
            n += 1;
        }
    }

    /// Create the directory tree and first-use documents.
    ///
    /// Any failure is fatal: an engagement without an audit trail is not a
    /// valid state.
    pub(crate) fn prepare(&self, verbosity: Verbosity) -> Result<(), AuditError> {
        for dir in [&self.audit_dir, &self.sessions_dir, &self.compliance_dir] {
            fs::create_dir_all(dir).map_err(|source| AuditError::EngagementUnavailable {
                path: dir.clone(),
                source,
            })?;
        }

        let config_path = self.config_path();
        if !config_path.exists() {
            let record = AuditConfigRecord {
                enabled: true,
                verbosity,
                created: Utc::now(),
                engagement: self.engagement_name(),
                description: "Audit logging for compliance and legal defense".to_string(),
            };
            let json = serde_json::to_string_pretty(&record)?;
            fs::write(&config_path, json).map_err(|source| AuditError::EngagementUnavailable {
                path: config_path.clone(),
                source,
            })?;
        }

        let readme_path = self.readme_path();
        if !readme_path.exists() {
            fs::write(&readme_path, self.readme()).map_err(|source| {
                AuditError::EngagementUnavailable {
                    path: readme_path.clone(),
                    source,
                }
            })?;
        }

        Ok(())
    }

    fn readme(&self) -> String {
        format!(
            "# Audit Logs - {name}\n\
             \n\
             This directory holds the audit trail for this engagement: every tool\n\
             execution, its target, timing, exit status, and captured output.\n\
             \n\
             Used for compliance evidence (SOC 2, ISO 27001, PCI DSS), legal defense,\n\
             correlating testing activity with client-observed events, and\n\
             post-engagement methodology review.\n\
             \n\
             ## Structure\n\
             \n\
             ```\n\
             audit-logs/\n\
             ├── README.md               (this file)\n\
             ├── audit-config.json       (audit configuration)\n\
             ├── audit-index.json        (one summary per completed session)\n\
             ├── sessions/\n\
             │   ├── session-*.jsonl     (structured log, one record per line)\n\
             │   ├── session-*.txt       (human-readable transcript)\n\
             │   └── session-*-outputs/  (raw tool outputs)\n\
             └── compliance/\n\
             \x20   └── timeline-*.md       (client-facing timeline)\n\
             ```\n\
             \n\
             ## Integrity\n\
             \n\
             Every output file is fingerprinted with SHA-256 in the structured log.\n\
             Re-check them with `engage --engagement <dir> verify` or\n\
             `sha256sum audit-logs/sessions/session-*-outputs/*`.\n\
             \n\
             ## Retention\n\
             \n\
             Keep all logs while the engagement is active, archive after final\n\
             report delivery, retain for 7 years.\n\
             \n\
             ## Sensitive content\n\
             \n\
             Outputs may contain credentials, tokens, or session identifiers.\n\
             Redact before sharing and encrypt before transmitting.\n\
             \n\
             ---\n\
             \n\
             **Generated**: {generated}\n\
             **Engagement**: {name}\n",
            name = self.engagement_name(),
            generated = Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        )
    }
}

/// Files belonging to one session.
#[derive(Debug, Clone)]
pub struct SessionPaths {
    pub jsonl: PathBuf,
    pub transcript: PathBuf,
    pub outputs_dir: PathBuf,
    pub timeline: PathBuf,
}

impl SessionPaths {
    fn has_logs(&self) -> bool {
        self.jsonl.exists() || self.transcript.exists()
    }
}

/// Static record written to `audit-config.json` the first time an engagement
/// is logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfigRecord {
    pub enabled: bool,
    pub verbosity: Verbosity,
    pub created: DateTime<Utc>,
    pub engagement: String,
    pub description: String,
}
