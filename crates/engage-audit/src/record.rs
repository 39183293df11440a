// record.rs — On-disk record model for the structured session log.
//
// Every line of `sessions/<session>.jsonl` is one `LogRecord`: either a
// finalized command execution or a scope-verification checkpoint. The two
// shapes are told apart by the `event_type` key, which only scope records
// carry.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discriminator value carried by scope-verification records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeEventType {
    ScopeVerification,
}

/// One tool execution, as persisted after its command scope closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEntry {
    /// When the command scope was entered (UTC).
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    /// Position in the session, starting at 1.
    pub sequence: u64,
    /// Full command line as reported by the caller.
    pub command: String,
    pub tool: String,
    /// Tool class label, e.g. "kali_pentest" or "web3_security".
    pub category: String,
    pub target: Option<String>,
    pub scope_verified: bool,
    pub working_dir: String,
    /// Name of the engagement directory.
    pub engagement: String,
    /// Wall-clock time between scope entry and exit, in milliseconds.
    #[serde(default)]
    pub duration_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<PathBuf>,
    /// `sha256:<hex>` digest of the output artifact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_size_bytes: Option<u64>,
}

impl CommandEntry {
    pub fn status(&self) -> CommandStatus {
        CommandStatus::from_exit_code(self.exit_code)
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_ms / 1000.0
    }
}

/// A checkpoint recording whether a target was authorized before testing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeVerificationEvent {
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub event_type: ScopeEventType,
    pub target: String,
    pub verified: bool,
    /// Line number in the engagement's scope document, if known.
    pub scope_line: Option<u32>,
}

impl ScopeVerificationEvent {
    pub fn new(
        session_id: impl Into<String>,
        target: impl Into<String>,
        verified: bool,
        scope_line: Option<u32>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            session_id: session_id.into(),
            event_type: ScopeEventType::ScopeVerification,
            target: target.into(),
            verified,
            scope_line,
        }
    }

    /// Human-readable reference into the scope document.
    pub fn reference(&self) -> String {
        match self.scope_line {
            Some(line) => format!("SCOPE.md line {}", line),
            None => "Manual verification".to_string(),
        }
    }
}

/// One line of the structured log.
///
/// Untagged: scope records are tried first because they require the
/// `event_type` key; everything else must parse as a command entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogRecord {
    Scope(ScopeVerificationEvent),
    Command(CommandEntry),
}

impl LogRecord {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            LogRecord::Scope(s) => s.timestamp,
            LogRecord::Command(c) => c.timestamp,
        }
    }

    pub fn as_command(&self) -> Option<&CommandEntry> {
        match self {
            LogRecord::Command(c) => Some(c),
            LogRecord::Scope(_) => None,
        }
    }

    pub fn as_scope(&self) -> Option<&ScopeVerificationEvent> {
        match self {
            LogRecord::Scope(s) => Some(s),
            LogRecord::Command(_) => None,
        }
    }
}

/// Outcome of a command derived from its exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Ok,
    Failed,
    /// No exit code was ever reported.
    Pending,
}

impl CommandStatus {
    pub fn from_exit_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => CommandStatus::Ok,
            Some(_) => CommandStatus::Failed,
            None => CommandStatus::Pending,
        }
    }
}

/// Truncate `s` to `max` characters, appending `...` when cut.
pub fn ellipsize(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}

/// Make `s` safe inside a markdown table cell: pipes are escaped and line
/// breaks collapse to spaces.
pub fn table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\r', '\n'], " ")
}

/// Cut `s` to at most `max` characters without a marker (fixed-width columns).
pub fn clip(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
