// logger.rs — SessionLogger: one audit logging session for an engagement.
//
// Lifecycle:
//   initialize → (log_command scope → record_output / record_exit_code)*
//              → shutdown (drain, timeline, transcript footer, index)
//
// A command record is built in memory while its scope is open and only
// leaves the logger, as one finished record, when the scope is dropped.
// The scope mutably borrows the logger, so at most one command is open at a
// time and sequence numbers are handed out in order.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::error::AuditError;
use crate::hasher;
use crate::index::{self, SessionIndexEntry};
use crate::layout::{AuditLayout, SessionPaths, AUDIT_DIR};
use crate::log::read_records;
use crate::record::{CommandEntry, LogRecord, ScopeVerificationEvent};
use crate::settings::{AuditSettings, Verbosity};
use crate::timeline::{self, TimelineContext};
use crate::transcript;
use crate::writer::{PersistenceLoop, WriterStats};

/// What the caller is about to run.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub tool: String,
    pub command: String,
    pub target: Option<String>,
    pub category: String,
    pub scope_verified: bool,
}

impl CommandSpec {
    pub fn new(tool: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            command: command.into(),
            target: None,
            category: "unknown".to_string(),
            scope_verified: false,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn scope_verified(mut self, verified: bool) -> Self {
        self.scope_verified = verified;
        self
    }
}

/// Result of a completed shutdown.
#[derive(Debug, Clone)]
pub struct ShutdownSummary {
    pub session_id: String,
    pub started: DateTime<Utc>,
    pub ended: DateTime<Utc>,
    /// Command scopes opened during the session.
    pub commands: u64,
    pub writer: WriterStats,
    pub timeline: Option<PathBuf>,
    /// Non-fatal problems hit while finalizing (timeline, footer, index).
    pub issues: Vec<String>,
}

/// State of an enabled session.
struct LiveSession {
    layout: AuditLayout,
    paths: SessionPaths,
    session_id: String,
    engagement: String,
    started: DateTime<Utc>,
    verbosity: Verbosity,
    sequence: u64,
    current: Option<OpenCommand>,
    /// `None` once the session has been shut down.
    writer: Option<PersistenceLoop>,
}

struct OpenCommand {
    entry: CommandEntry,
    started: Instant,
}

/// Owns one logging session. A disabled logger holds no state and every
/// operation on it is inert.
pub struct SessionLogger {
    live: Option<LiveSession>,
}

impl SessionLogger {
    /// Start a session for `engagement_dir`.
    ///
    /// With `enabled == false` nothing is created or written.
    pub fn initialize(
        engagement_dir: impl AsRef<Path>,
        enabled: bool,
        verbosity: Verbosity,
    ) -> Result<Self, AuditError> {
        Self::with_settings(engagement_dir, &AuditSettings::new(enabled, verbosity))
    }

    /// Start a session with explicit settings (see [`AuditSettings::load`]).
    pub fn with_settings(
        engagement_dir: impl AsRef<Path>,
        settings: &AuditSettings,
    ) -> Result<Self, AuditError> {
        let engagement_dir = engagement_dir.as_ref();
        if !settings.enabled {
            tracing::debug!(
                engagement = %engagement_dir.display(),
                "audit logging disabled, recording nothing"
            );
            return Ok(Self::disabled());
        }

        let fatal = |path: &Path, source: std::io::Error| AuditError::EngagementUnavailable {
            path: path.to_path_buf(),
            source,
        };
        fs::create_dir_all(engagement_dir).map_err(|e| fatal(engagement_dir, e))?;
        let engagement_dir = engagement_dir
            .canonicalize()
            .map_err(|e| fatal(engagement_dir, e))?;

        let layout = AuditLayout::for_engagement(&engagement_dir);
        layout.prepare(settings.verbosity)?;

        let started = Utc::now();
        let session_id = layout.reserve_session_id(started)?;
        let paths = layout.session(&session_id);
        let engagement = layout.engagement_name();

        let header = transcript::header(&engagement, &session_id, &started, settings.verbosity);
        fs::write(&paths.transcript, header).map_err(|e| fatal(&paths.transcript, e))?;

        let writer = PersistenceLoop::spawn(
            &session_id,
            &paths.jsonl,
            &paths.transcript,
            settings.verbosity,
            settings.queue_capacity,
            settings.poll_interval(),
        )?;

        tracing::info!(
            session_id = %session_id,
            engagement = %engagement,
            verbosity = %settings.verbosity,
            "audit session started"
        );

        Ok(Self {
            live: Some(LiveSession {
                layout,
                paths,
                session_id,
                engagement,
                started,
                verbosity: settings.verbosity,
                sequence: 0,
                current: None,
                writer: Some(writer),
            }),
        })
    }

    /// A logger that records nothing.
    pub fn disabled() -> Self {
        Self { live: None }
    }

    /// True while the session accepts records (enabled and not shut down).
    pub fn is_enabled(&self) -> bool {
        self.live.as_ref().is_some_and(|l| l.writer.is_some())
    }

    pub fn session_id(&self) -> Option<&str> {
        self.live.as_ref().map(|l| l.session_id.as_str())
    }

    pub fn session_paths(&self) -> Option<&SessionPaths> {
        self.live.as_ref().map(|l| &l.paths)
    }

    pub fn layout(&self) -> Option<&AuditLayout> {
        self.live.as_ref().map(|l| &l.layout)
    }

    /// Number of command scopes opened so far.
    pub fn commands_logged(&self) -> u64 {
        self.live.as_ref().map_or(0, |l| l.sequence)
    }

    /// Open a command scope. The record is finalized and queued when the
    /// returned scope is dropped, on every exit path.
    pub fn log_command(&mut self, spec: CommandSpec) -> CommandScope<'_> {
        let active = match self.live.as_mut() {
            Some(live) if live.writer.is_some() => {
                // A scope leaked with mem::forget would otherwise be lost.
                if live.current.is_some() {
                    live.finish_command();
                }
                live.sequence += 1;
                let entry = CommandEntry {
                    timestamp: Utc::now(),
                    session_id: live.session_id.clone(),
                    sequence: live.sequence,
                    command: spec.command,
                    tool: spec.tool,
                    category: spec.category,
                    target: spec.target,
                    scope_verified: spec.scope_verified,
                    working_dir: std::env::current_dir()
                        .map(|d| d.display().to_string())
                        .unwrap_or_default(),
                    engagement: live.engagement.clone(),
                    duration_ms: 0.0,
                    exit_code: None,
                    output_file: None,
                    output_hash: None,
                    output_size_bytes: None,
                };
                tracing::debug!(
                    session_id = %live.session_id,
                    sequence = entry.sequence,
                    tool = %entry.tool,
                    "command started"
                );
                live.current = Some(OpenCommand {
                    entry,
                    started: Instant::now(),
                });
                true
            }
            _ => false,
        };
        CommandScope {
            logger: self,
            active,
        }
    }

    /// Capture output for the open command as an artifact file.
    ///
    /// No-op when disabled or when no command is open. `filename` is reduced
    /// to its last path component; by default the artifact is named after
    /// the command's sequence number. Existing artifacts are never
    /// overwritten: a name already in use gets the command's prefix.
    pub fn record_output(
        &mut self,
        content: impl AsRef<[u8]>,
        filename: Option<&str>,
    ) -> Result<(), AuditError> {
        let Some(live) = self.live.as_mut() else {
            return Ok(());
        };
        let Some(open) = live.current.as_mut() else {
            return Ok(());
        };

        let prefix = format!("{}-cmd-{:03}", live.session_id, open.entry.sequence);
        let name = filename
            .and_then(|f| Path::new(f).file_name())
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}-output.txt", prefix));

        let content = content.as_ref();
        let (path, mut file) = create_artifact(&live.paths.outputs_dir, &name, &prefix)?;
        file.write_all(content)
            .and_then(|()| file.flush())
            .map_err(|e| AuditError::write(&path, e))?;

        open.entry.output_hash = Some(hasher::tagged(&hasher::hash_bytes(content)));
        open.entry.output_size_bytes = Some(content.len() as u64);
        open.entry.output_file = Some(path);
        Ok(())
    }

    /// Attach the tool's exit status to the open command. No-op when
    /// disabled or when no command is open.
    pub fn record_exit_code(&mut self, exit_code: i32) {
        if let Some(open) = self.live.as_mut().and_then(|l| l.current.as_mut()) {
            open.entry.exit_code = Some(exit_code);
        }
    }

    /// Record a scope-verification checkpoint. Independent of any open
    /// command and does not consume a sequence number.
    pub fn log_scope_verification(
        &self,
        target: &str,
        verified: bool,
        scope_line: Option<u32>,
    ) -> Result<(), AuditError> {
        let Some(live) = self.live.as_ref() else {
            return Ok(());
        };
        let Some(writer) = live.writer.as_ref() else {
            return Ok(());
        };
        tracing::info!(
            session_id = %live.session_id,
            scope_target = target,
            verified,
            "scope verification"
        );
        let event = ScopeVerificationEvent::new(&live.session_id, target, verified, scope_line);
        writer.enqueue(LogRecord::Scope(event))
    }

    /// Block until every record queued so far is on disk.
    pub fn flush(&self) -> Result<(), AuditError> {
        match self.live.as_ref().and_then(|l| l.writer.as_ref()) {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }

    /// Write `compliance/timeline-<session>.md` from the structured log and
    /// return its path. `None` when disabled.
    pub fn generate_timeline_report(&self) -> Result<Option<PathBuf>, AuditError> {
        let Some(live) = self.live.as_ref() else {
            return Ok(None);
        };
        if let Some(writer) = live.writer.as_ref() {
            writer.flush()?;
        }
        live.write_timeline(Utc::now()).map(Some)
    }

    /// Drain and stop the session, then write its timeline, transcript
    /// footer, and index entry.
    ///
    /// Returns `Ok(None)` for disabled or already shut down sessions.
    pub fn shutdown(&mut self) -> Result<Option<ShutdownSummary>, AuditError> {
        let Some(live) = self.live.as_mut() else {
            return Ok(None);
        };
        if live.current.is_some() {
            live.finish_command();
        }
        let Some(writer) = live.writer.take() else {
            return Ok(None);
        };

        let stats = writer.shutdown()?;
        let ended = Utc::now();
        let mut issues = Vec::new();

        let timeline = match live.write_timeline(ended) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(session_id = %live.session_id, error = %e, "timeline report failed");
                issues.push(format!("timeline report: {}", e));
                None
            }
        };

        let timeline_ref = timeline.as_deref().map(|p| p.display().to_string());
        let footer = transcript::footer(&live.started, &ended, live.sequence, timeline_ref.as_deref());
        if let Err(e) = append(&live.paths.transcript, &footer) {
            tracing::warn!(session_id = %live.session_id, error = %e, "transcript footer failed");
            issues.push(format!("transcript footer: {}", e));
        }

        let entry = SessionIndexEntry {
            started: live.started,
            ended,
            commands: live.sequence,
            jsonl_file: live.layout.relative(&live.paths.jsonl),
            transcript_file: live.layout.relative(&live.paths.transcript),
        };
        if let Err(e) = index::record_session(&live.layout, &live.session_id, entry) {
            tracing::warn!(session_id = %live.session_id, error = %e, "session index update failed");
            issues.push(format!("session index: {}", e));
        }

        if stats.failed > 0 {
            issues.push(format!("{} record(s) failed to persist", stats.failed));
        }

        tracing::info!(
            session_id = %live.session_id,
            commands = live.sequence,
            persisted = stats.persisted,
            "audit session closed"
        );

        Ok(Some(ShutdownSummary {
            session_id: live.session_id.clone(),
            started: live.started,
            ended,
            commands: live.sequence,
            writer: stats,
            timeline,
            issues,
        }))
    }

    fn finish_current(&mut self) {
        if let Some(live) = self.live.as_mut() {
            live.finish_command();
        }
    }
}

impl Drop for SessionLogger {
    fn drop(&mut self) {
        if self.is_enabled() {
            if let Err(e) = self.shutdown() {
                tracing::error!(error = %e, "audit session shutdown on drop failed");
            }
        }
    }
}

impl LiveSession {
    /// Stamp the duration on the open command and queue it.
    fn finish_command(&mut self) {
        let Some(mut open) = self.current.take() else {
            return;
        };
        // Millisecond precision to three decimals.
        open.entry.duration_ms = open.started.elapsed().as_micros() as f64 / 1000.0;

        tracing::debug!(
            session_id = %self.session_id,
            sequence = open.entry.sequence,
            duration_ms = open.entry.duration_ms,
            "command finished"
        );

        let Some(writer) = self.writer.as_ref() else {
            return;
        };
        if let Err(e) = writer.enqueue(LogRecord::Command(open.entry)) {
            tracing::error!(session_id = %self.session_id, error = %e, "command record dropped");
        }
    }

    fn write_timeline(&self, generated: DateTime<Utc>) -> Result<PathBuf, AuditError> {
        let records = read_records(&self.paths.jsonl)?.records;
        let transcript_ref = format!(
            "{}/{}",
            AUDIT_DIR,
            self.layout.relative(&self.paths.transcript)
        );
        let ctx = TimelineContext {
            engagement: &self.engagement,
            session_id: &self.session_id,
            started: self.started,
            generated,
            transcript_ref: &transcript_ref,
        };
        let report = timeline::render(&ctx, &records);
        fs::write(&self.paths.timeline, report)
            .map_err(|e| AuditError::write(&self.paths.timeline, e))?;
        Ok(self.paths.timeline.clone())
    }
}

/// Create a new artifact file under `dir`, picking a free name.
fn create_artifact(
    dir: &Path,
    name: &str,
    prefix: &str,
) -> Result<(PathBuf, fs::File), AuditError> {
    let mut attempt = 0u32;
    loop {
        let candidate = match attempt {
            0 => name.to_string(),
            1 => format!("{}-{}", prefix, name),
            n => format!("{}-{}-{}", prefix, n, name),
        };
        let path = dir.join(candidate);
        match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(source) => return Err(AuditError::OpenFailed { path, source }),
        }
    }
}

fn append(path: &Path, text: &str) -> Result<(), AuditError> {
    let mut file = fs::OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|source| AuditError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
    file.write_all(text.as_bytes())
        .map_err(|e| AuditError::write(path, e))
}

/// An open command. Dropping it finalizes and queues the record.
pub struct CommandScope<'a> {
    logger: &'a mut SessionLogger,
    active: bool,
}

impl CommandScope<'_> {
    /// Sequence number of this command, or `None` when logging is off.
    pub fn sequence(&self) -> Option<u64> {
        if !self.active {
            return None;
        }
        self.logger
            .live
            .as_ref()
            .and_then(|l| l.current.as_ref())
            .map(|open| open.entry.sequence)
    }

    pub fn is_recording(&self) -> bool {
        self.active
    }

    pub fn record_output(
        &mut self,
        content: impl AsRef<[u8]>,
        filename: Option<&str>,
    ) -> Result<(), AuditError> {
        self.logger.record_output(content, filename)
    }

    pub fn record_exit_code(&mut self, exit_code: i32) {
        self.logger.record_exit_code(exit_code);
    }

    pub fn log_scope_verification(
        &self,
        target: &str,
        verified: bool,
        scope_line: Option<u32>,
    ) -> Result<(), AuditError> {
        self.logger
            .log_scope_verification(target, verified, scope_line)
    }
}

impl Drop for CommandScope<'_> {
    fn drop(&mut self) {
        if self.active {
            self.logger.finish_current();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::read_records;
    use tempfile::tempdir;

    fn commands(logger: &SessionLogger) -> Vec<CommandEntry> {
        let path = &logger.session_paths().unwrap().jsonl;
        read_records(path)
            .unwrap()
            .records
            .into_iter()
            .filter_map(|r| r.as_command().cloned())
            .collect()
    }

    #[test]
    fn initialize_creates_layout() {
        let dir = tempdir().unwrap();
        let eng = dir.path().join("client-2026-10");
        let logger = SessionLogger::initialize(&eng, true, Verbosity::Full).unwrap();
        let layout = logger.layout().unwrap();
        assert!(layout.sessions_dir.is_dir());
        assert!(layout.compliance_dir.is_dir());
        assert!(layout.config_path().exists());
        assert!(layout.readme_path().exists());
        let paths = logger.session_paths().unwrap();
        assert!(paths.outputs_dir.is_dir());
        assert!(paths.jsonl.exists());
        let transcript = fs::read_to_string(&paths.transcript).unwrap();
        assert!(transcript.contains("PENETRATION TEST AUDIT LOG"));
        assert!(logger.session_id().unwrap().starts_with("session-"));
    }

    #[test]
    fn sequences_are_contiguous() {
        let dir = tempdir().unwrap();
        let mut logger = SessionLogger::initialize(dir.path(), true, Verbosity::Full).unwrap();
        for i in 0..5 {
            let mut scope = logger.log_command(CommandSpec::new("scan", format!("scan {}", i)));
            assert_eq!(scope.sequence(), Some(i + 1));
            scope.record_exit_code(0);
        }
        logger.flush().unwrap();
        let seqs: Vec<u64> = commands(&logger).iter().map(|c| c.sequence).collect();
        assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn output_is_hashed_and_attached() {
        let dir = tempdir().unwrap();
        let mut logger = SessionLogger::initialize(dir.path(), true, Verbosity::Full).unwrap();
        {
            let mut scope = logger.log_command(
                CommandSpec::new("scan", "scan -sV 10.0.0.5").with_target("10.0.0.5"),
            );
            scope.record_output("three ports open", None).unwrap();
            scope.record_exit_code(0);
        }
        logger.flush().unwrap();

        let entry = &commands(&logger)[0];
        let expected = format!("sha256:{}", hasher::hash_str("three ports open"));
        assert_eq!(entry.output_hash.as_deref(), Some(expected.as_str()));
        assert_eq!(entry.output_size_bytes, Some(16));
        let file = entry.output_file.as_ref().unwrap();
        assert!(file
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with("-cmd-001-output.txt"));
        assert_eq!(fs::read_to_string(file).unwrap(), "three ports open");
    }

    #[test]
    fn custom_filename_stays_inside_outputs_dir() {
        let dir = tempdir().unwrap();
        let mut logger = SessionLogger::initialize(dir.path(), true, Verbosity::Full).unwrap();
        {
            let mut scope = logger.log_command(CommandSpec::new("scan", "scan"));
            scope.record_output(b"x", Some("../../escape.txt")).unwrap();
        }
        logger.flush().unwrap();
        let entry = &commands(&logger)[0];
        let outputs = &logger.session_paths().unwrap().outputs_dir;
        assert_eq!(
            entry.output_file.as_deref(),
            Some(outputs.join("escape.txt").as_path())
        );
    }

    #[test]
    fn reused_filename_never_overwrites_earlier_artifact() {
        let dir = tempdir().unwrap();
        let mut logger = SessionLogger::initialize(dir.path(), true, Verbosity::Full).unwrap();
        for output in ["22/tcp open", "80/tcp open", "443/tcp open"] {
            let mut scope = logger.log_command(CommandSpec::new("scan", "scan"));
            scope.record_output(output, Some("scan.txt")).unwrap();
        }
        logger.flush().unwrap();

        let entries = commands(&logger);
        let files: Vec<_> = entries
            .iter()
            .map(|e| e.output_file.clone().unwrap())
            .collect();
        let outputs = &logger.session_paths().unwrap().outputs_dir;
        let id = logger.session_id().unwrap();
        assert_eq!(files[0], outputs.join("scan.txt"));
        assert_eq!(files[1], outputs.join(format!("{}-cmd-002-scan.txt", id)));
        assert_eq!(files[2], outputs.join(format!("{}-cmd-003-scan.txt", id)));
        for entry in &entries {
            let on_disk = hasher::hash_file(entry.output_file.as_ref().unwrap()).unwrap();
            assert_eq!(entry.output_hash.as_deref(), Some(hasher::tagged(&on_disk).as_str()));
        }
    }

    #[test]
    fn recording_without_open_scope_is_inert() {
        let dir = tempdir().unwrap();
        let mut logger = SessionLogger::initialize(dir.path(), true, Verbosity::Full).unwrap();
        logger.record_output("stray", None).unwrap();
        logger.record_exit_code(3);
        logger.flush().unwrap();
        assert!(commands(&logger).is_empty());
        let outputs = &logger.session_paths().unwrap().outputs_dir;
        assert_eq!(fs::read_dir(outputs).unwrap().count(), 0);
    }

    #[test]
    fn scope_exit_via_error_still_records() {
        fn run(logger: &mut SessionLogger) -> Result<(), String> {
            let mut scope = logger.log_command(CommandSpec::new("scan", "scan bad"));
            scope.record_exit_code(2);
            if scope.is_recording() {
                return Err("tool crashed".to_string());
            }
            Ok(())
        }
        let dir = tempdir().unwrap();
        let mut logger = SessionLogger::initialize(dir.path(), true, Verbosity::Full).unwrap();
        assert!(run(&mut logger).is_err());
        logger.flush().unwrap();
        assert_eq!(commands(&logger)[0].exit_code, Some(2));
    }

    #[test]
    fn scope_checks_do_not_advance_sequence() {
        let dir = tempdir().unwrap();
        let mut logger = SessionLogger::initialize(dir.path(), true, Verbosity::Full).unwrap();
        logger
            .log_scope_verification("10.0.0.5", true, Some(12))
            .unwrap();
        {
            let scope = logger.log_command(CommandSpec::new("scan", "scan"));
            scope.log_scope_verification("8.8.8.8", false, None).unwrap();
            assert_eq!(scope.sequence(), Some(1));
        }
        assert_eq!(logger.commands_logged(), 1);
    }

    #[test]
    fn disabled_logger_writes_nothing() {
        let dir = tempdir().unwrap();
        let eng = dir.path().join("engagement");
        let mut logger = SessionLogger::initialize(&eng, false, Verbosity::Full).unwrap();
        {
            let mut scope = logger.log_command(CommandSpec::new("scan", "scan"));
            assert!(!scope.is_recording());
            assert_eq!(scope.sequence(), None);
            scope.record_output("data", None).unwrap();
            scope.record_exit_code(0);
        }
        logger.log_scope_verification("x", true, None).unwrap();
        assert!(logger.generate_timeline_report().unwrap().is_none());
        assert!(logger.shutdown().unwrap().is_none());
        assert!(!eng.exists());
    }

    #[test]
    fn shutdown_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut logger = SessionLogger::initialize(dir.path(), true, Verbosity::Full).unwrap();
        {
            let _scope = logger.log_command(CommandSpec::new("scan", "scan"));
        }
        let summary = logger.shutdown().unwrap().unwrap();
        assert_eq!(summary.commands, 1);
        assert_eq!(summary.writer.persisted, 1);
        assert!(summary.issues.is_empty());
        assert!(logger.shutdown().unwrap().is_none());
        assert!(!logger.is_enabled());

        // Recording after shutdown is inert.
        let scope = logger.log_command(CommandSpec::new("scan", "late"));
        assert!(!scope.is_recording());
    }

    #[test]
    fn timeline_report_mid_session_sees_queued_records() {
        let dir = tempdir().unwrap();
        let mut logger = SessionLogger::initialize(dir.path(), true, Verbosity::Full).unwrap();
        {
            let mut scope = logger.log_command(
                CommandSpec::new("scan", "scan -sV 10.0.0.5").with_target("10.0.0.5"),
            );
            scope.record_exit_code(0);
        }
        let path = logger.generate_timeline_report().unwrap().unwrap();
        let md = fs::read_to_string(path).unwrap();
        assert!(md.contains("| scan | 10.0.0.5 | `scan -sV 10.0.0.5`"));
    }

    #[test]
    fn second_session_in_same_second_gets_distinct_id() {
        let dir = tempdir().unwrap();
        let a = SessionLogger::initialize(dir.path(), true, Verbosity::Full).unwrap();
        let b = SessionLogger::initialize(dir.path(), true, Verbosity::Full).unwrap();
        assert_ne!(a.session_id(), b.session_id());
    }

    #[test]
    fn concurrent_sessions_never_share_an_id() {
        use std::sync::{Arc, Barrier};
        use std::thread;

        let dir = tempdir().unwrap();
        for _ in 0..10 {
            let barrier = Arc::new(Barrier::new(4));
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let barrier = Arc::clone(&barrier);
                    let eng = dir.path().to_path_buf();
                    thread::spawn(move || {
                        barrier.wait();
                        let mut logger =
                            SessionLogger::initialize(&eng, true, Verbosity::Full).unwrap();
                        let id = logger.session_id().unwrap().to_string();
                        logger.shutdown().unwrap();
                        id
                    })
                })
                .collect();
            let mut ids: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), 4);
        }
    }

    #[test]
    fn commands_verbosity_keeps_output_out_of_transcript() {
        let dir = tempdir().unwrap();
        let mut logger =
            SessionLogger::initialize(dir.path(), true, Verbosity::Commands).unwrap();
        {
            let mut scope = logger.log_command(CommandSpec::new("scan", "scan"));
            scope.record_output("secret banner", None).unwrap();
        }
        logger.flush().unwrap();
        let transcript =
            fs::read_to_string(&logger.session_paths().unwrap().transcript).unwrap();
        assert!(transcript.contains("COMMAND #001: scan"));
        assert!(!transcript.contains("secret banner"));
        // The artifact itself is still written and hashed.
        assert!(commands(&logger)[0].output_hash.is_some());
    }
}
