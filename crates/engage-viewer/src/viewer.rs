// viewer.rs — Read-only access to an engagement's audit sessions.
//
// Everything here works from files on disk: the viewer never talks to a live
// logger and never modifies anything except the compliance report it is
// asked to export.

use std::fs;
use std::path::{Path, PathBuf};

use engage_audit::{
    read_index, read_records, AuditLayout, CommandEntry, LogRecord, SessionIndex, SkippedLine,
};

use crate::compliance::{self, ComplianceContext};
use crate::error::ViewerError;
use crate::integrity::{self, IntegrityReport};
use crate::render::{self, ViewFormat};

/// One session's records, in file order.
#[derive(Debug, Clone)]
pub struct LoadedSession {
    pub session_id: String,
    pub records: Vec<LogRecord>,
    /// Lines that failed to parse and were left out of `records`.
    pub skipped: Vec<SkippedLine>,
}

impl LoadedSession {
    pub fn commands(&self) -> impl Iterator<Item = &CommandEntry> {
        self.records.iter().filter_map(LogRecord::as_command)
    }
}

/// Field matched by a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Target,
    Tool,
}

/// A command record that matched a search.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub session_id: String,
    pub entry: CommandEntry,
}

pub struct AuditViewer {
    layout: AuditLayout,
}

impl AuditViewer {
    /// Open the audit trail of `engagement_dir`.
    pub fn open(engagement_dir: impl AsRef<Path>) -> Result<Self, ViewerError> {
        let engagement_dir = engagement_dir.as_ref();
        let resolved = engagement_dir
            .canonicalize()
            .unwrap_or_else(|_| engagement_dir.to_path_buf());
        let layout = AuditLayout::for_engagement(resolved);
        if !layout.audit_dir.is_dir() {
            return Err(ViewerError::NoAuditLogs {
                path: layout.engagement_dir,
            });
        }
        Ok(Self { layout })
    }

    pub fn layout(&self) -> &AuditLayout {
        &self.layout
    }

    /// Session ids with a structured log, oldest first.
    pub fn list_sessions(&self) -> Result<Vec<String>, ViewerError> {
        let dir = &self.layout.sessions_dir;
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut sessions = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| ViewerError::io(dir, e))? {
            let path = entry.map_err(|e| ViewerError::io(dir, e))?.path();
            if path.extension().is_some_and(|ext| ext == "jsonl") {
                if let Some(stem) = path.file_stem() {
                    sessions.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        sessions.sort_by(|a, b| session_order(a).cmp(&session_order(b)));
        Ok(sessions)
    }

    /// The session whose structured log was modified most recently.
    pub fn latest_session(&self) -> Result<String, ViewerError> {
        let mut latest: Option<(std::time::SystemTime, String)> = None;
        for id in self.list_sessions()? {
            let path = self.layout.session(&id).jsonl;
            let modified = fs::metadata(&path)
                .and_then(|m| m.modified())
                .map_err(|e| ViewerError::io(&path, e))?;
            // `>=` over ascending ids: equal times resolve to the larger id.
            if latest.as_ref().map_or(true, |(t, _)| modified >= *t) {
                latest = Some((modified, id));
            }
        }
        latest
            .map(|(_, id)| id)
            .ok_or_else(|| ViewerError::NoSessions {
                path: self.layout.sessions_dir.clone(),
            })
    }

    /// `session` if given, otherwise the latest session.
    pub fn resolve_session(&self, session: Option<&str>) -> Result<String, ViewerError> {
        match session {
            Some(id) => Ok(id.to_string()),
            None => self.latest_session(),
        }
    }

    pub fn load_session(&self, session_id: &str) -> Result<LoadedSession, ViewerError> {
        let path = self.layout.session(session_id).jsonl;
        if !path.is_file() {
            return Err(ViewerError::SessionNotFound {
                session_id: session_id.to_string(),
            });
        }
        let loaded = read_records(&path)?;
        Ok(LoadedSession {
            session_id: session_id.to_string(),
            records: loaded.records,
            skipped: loaded.skipped,
        })
    }

    /// The cross-session index; empty when no session has completed.
    pub fn read_index(&self) -> Result<SessionIndex, ViewerError> {
        Ok(read_index(&self.layout.index_path())?)
    }

    /// Render a session in `format`. Defaults to the latest session.
    pub fn view(&self, session: Option<&str>, format: ViewFormat) -> Result<String, ViewerError> {
        let session_id = self.resolve_session(session)?;
        match format {
            ViewFormat::Transcript => {
                let path = self.layout.session(&session_id).transcript;
                if !path.is_file() {
                    return Err(ViewerError::SessionNotFound { session_id });
                }
                let bytes = fs::read(&path).map_err(|e| ViewerError::io(&path, e))?;
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
            ViewFormat::Json => {
                let loaded = self.load_session(&session_id)?;
                Ok(serde_json::to_string_pretty(&loaded.records)?)
            }
            ViewFormat::Table => {
                let loaded = self.load_session(&session_id)?;
                Ok(render::session_table(&loaded))
            }
        }
    }

    /// Commands run against `target`, in one session or all of them.
    pub fn search_target(
        &self,
        target: &str,
        session: Option<&str>,
    ) -> Result<Vec<SearchHit>, ViewerError> {
        self.search(SearchField::Target, target, session)
    }

    /// Commands run with `tool`, in one session or all of them.
    pub fn search_tool(
        &self,
        tool: &str,
        session: Option<&str>,
    ) -> Result<Vec<SearchHit>, ViewerError> {
        self.search(SearchField::Tool, tool, session)
    }

    pub fn search(
        &self,
        field: SearchField,
        value: &str,
        session: Option<&str>,
    ) -> Result<Vec<SearchHit>, ViewerError> {
        let sessions = match session {
            Some(id) => vec![id.to_string()],
            None => self.list_sessions()?,
        };

        let mut hits = Vec::new();
        for session_id in sessions {
            let loaded = self.load_session(&session_id)?;
            hits.extend(
                loaded
                    .commands()
                    .filter(|entry| match field {
                        SearchField::Target => entry.target.as_deref() == Some(value),
                        SearchField::Tool => entry.tool == value,
                    })
                    .map(|entry| SearchHit {
                        session_id: session_id.clone(),
                        entry: entry.clone(),
                    }),
            );
        }
        tracing::debug!(?field, value, hits = hits.len(), "audit search");
        Ok(hits)
    }

    /// Re-hash every captured artifact of a session. Read-only.
    pub fn verify_integrity(&self, session: Option<&str>) -> Result<IntegrityReport, ViewerError> {
        let session_id = self.resolve_session(session)?;
        let loaded = self.load_session(&session_id)?;
        let report = integrity::verify(&loaded);
        if !report.passed() {
            tracing::warn!(
                session_id = %session_id,
                mismatched = report.mismatched(),
                missing = report.missing(),
                unreadable = report.unreadable(),
                "integrity verification failed"
            );
        }
        Ok(report)
    }

    /// Write a client-facing markdown report for a session to `output`.
    pub fn export_compliance_report(
        &self,
        output: impl AsRef<Path>,
        session: Option<&str>,
    ) -> Result<PathBuf, ViewerError> {
        let output = output.as_ref();
        let session_id = self.resolve_session(session)?;
        let loaded = self.load_session(&session_id)?;

        let engagement = self.layout.engagement_name();
        let ctx = ComplianceContext {
            engagement: &engagement,
            session_id: &session_id,
            generated: chrono::Utc::now(),
        };
        let report = compliance::render(&ctx, &loaded.records);

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ViewerError::io(parent, e))?;
        }
        fs::write(output, report).map_err(|e| ViewerError::io(output, e))?;

        tracing::info!(
            session_id = %session_id,
            path = %output.display(),
            "compliance report exported"
        );
        Ok(output.to_path_buf())
    }
}

/// Sort key for session ids: the timestamp part, then the same-second
/// suffix numerically (`-2` before `-10`). Unsuffixed ids sort first.
fn session_order(id: &str) -> (&str, u32) {
    match id.rsplit_once('-') {
        Some((base, n)) if base.matches('-').count() >= 2 => {
            (base, n.parse().unwrap_or(u32::MAX))
        }
        _ => (id, 1),
    }
}
