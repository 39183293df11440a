// activation.rs — Per-engagement audit activation and the execute-with-audit
// wrapper used by tool integrations.
//
// An `AuditContext` owns at most one `SessionLogger`. Integrations receive the
// context explicitly and call `execute_with_audit`; when no session is active
// the wrapped call runs untouched.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AuditError;
use crate::logger::{CommandSpec, SessionLogger, ShutdownSummary};
use crate::settings::AuditSettings;

/// What a tool call produced, as far as the audit trail cares.
pub trait AuditedOutcome {
    /// Text to capture as the command's output artifact.
    fn audit_output(&self) -> Option<String>;
    /// Whether the call succeeded. `None` leaves the exit code unset.
    fn audit_success(&self) -> Option<bool>;
}

/// Result shape returned by tool integrations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ToolResult {
    pub fn succeeded(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: Some(output.into()),
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: None,
            message: Some(message.into()),
        }
    }
}

impl AuditedOutcome for ToolResult {
    fn audit_output(&self) -> Option<String> {
        self.output.clone().or_else(|| self.message.clone())
    }

    fn audit_success(&self) -> Option<bool> {
        Some(self.success)
    }
}

/// Loosely-typed results: a JSON object with `output`, `message`, and
/// `success` keys. Anything else contributes nothing.
impl AuditedOutcome for serde_json::Value {
    fn audit_output(&self) -> Option<String> {
        ["output", "message"].iter().find_map(|key| {
            self.get(key).and_then(|v| match v {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            })
        })
    }

    fn audit_success(&self) -> Option<bool> {
        self.get("success").and_then(serde_json::Value::as_bool)
    }
}

/// Description of one tool call to be audited.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub tool: String,
    pub category: String,
    pub command: String,
    pub target: Option<String>,
    /// Engagement the caller believes it is working in.
    pub engagement_dir: Option<PathBuf>,
    pub scope_verified: bool,
}

impl ToolInvocation {
    pub fn new(tool: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            category: "unknown".to_string(),
            command: command.into(),
            target: None,
            engagement_dir: None,
            scope_verified: false,
        }
    }

    /// Build the command line as `<tool> <options> <target>`.
    pub fn from_options(
        tool: impl Into<String>,
        category: impl Into<String>,
        options: &str,
        target: Option<&str>,
    ) -> Self {
        let tool = tool.into();
        let command = match target {
            Some(target) => format!("{} {} {}", tool, options, target),
            None => format!("{} {}", tool, options),
        };
        Self {
            category: category.into(),
            target: target.map(str::to_string),
            ..Self::new(tool, command)
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

    pub fn with_engagement_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.engagement_dir = Some(dir.into());
        self
    }

    pub fn scope_verified(mut self, verified: bool) -> Self {
        self.scope_verified = verified;
        self
    }

    fn spec(&self) -> CommandSpec {
        let spec = CommandSpec::new(&self.tool, &self.command)
            .with_category(&self.category)
            .scope_verified(self.scope_verified);
        match &self.target {
            Some(target) => spec.with_target(target),
            None => spec,
        }
    }
}

/// Holds the active session, if any.
#[derive(Default)]
pub struct AuditContext {
    logger: Option<SessionLogger>,
}

impl AuditContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch auditing to `engagement_dir`. Any active session is shut down
    /// first; a new one is started only when `enabled` is true.
    ///
    /// Verbosity and queue tuning come from the engagement's `audit.toml`.
    pub fn enable_for_engagement(
        &mut self,
        engagement_dir: impl AsRef<Path>,
        enabled: bool,
    ) -> Result<(), AuditError> {
        let engagement_dir = engagement_dir.as_ref();
        if let Some(summary) = self.shutdown()? {
            tracing::info!(
                session_id = %summary.session_id,
                "previous audit session closed"
            );
        }

        if !enabled {
            tracing::warn!(
                engagement = %engagement_dir.display(),
                "audit logging disabled for engagement"
            );
            return Ok(());
        }

        let settings = AuditSettings {
            enabled: true,
            ..AuditSettings::load(engagement_dir)?
        };
        let logger = SessionLogger::with_settings(engagement_dir, &settings)?;
        tracing::info!(
            engagement = %engagement_dir.display(),
            session_id = logger.session_id().unwrap_or_default(),
            "audit logging enabled"
        );
        self.logger = Some(logger);
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.logger.as_ref().is_some_and(SessionLogger::is_enabled)
    }

    pub fn logger(&self) -> Option<&SessionLogger> {
        self.logger.as_ref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.logger.as_ref().and_then(SessionLogger::session_id)
    }

    /// Run `f` and record it in the active session.
    ///
    /// The result is returned unchanged. Audit failures are reported through
    /// `tracing` and never reach the caller.
    pub fn execute_with_audit<R, F>(&mut self, invocation: &ToolInvocation, f: F) -> R
    where
        R: AuditedOutcome,
        F: FnOnce() -> R,
    {
        let Some(logger) = self.logger.as_mut().filter(|l| l.is_enabled()) else {
            return f();
        };

        if let Some(dir) = &invocation.engagement_dir {
            warn_on_mismatch(logger, dir);
        }

        let mut scope = logger.log_command(invocation.spec());
        let result = f();

        if let Some(output) = result.audit_output() {
            if let Err(e) = scope.record_output(output, None) {
                tracing::warn!(tool = %invocation.tool, error = %e, "failed to record tool output");
            }
        }
        if let Some(success) = result.audit_success() {
            scope.record_exit_code(if success { 0 } else { 1 });
        }
        drop(scope);
        result
    }

    /// Record a scope checkpoint in the active session. No-op when inactive.
    pub fn log_scope_verification(&self, target: &str, verified: bool, scope_line: Option<u32>) {
        let Some(logger) = self.logger.as_ref() else {
            return;
        };
        if let Err(e) = logger.log_scope_verification(target, verified, scope_line) {
            tracing::warn!(scope_target = target, error = %e, "failed to record scope verification");
        }
    }

    /// Shut the active session down, if any.
    pub fn shutdown(&mut self) -> Result<Option<ShutdownSummary>, AuditError> {
        match self.logger.take() {
            Some(mut logger) => logger.shutdown(),
            None => Ok(None),
        }
    }
}

fn warn_on_mismatch(logger: &SessionLogger, dir: &Path) {
    let Some(layout) = logger.layout() else {
        return;
    };
    let requested = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    if requested != layout.engagement_dir {
        tracing::warn!(
            requested = %dir.display(),
            active = %layout.engagement_dir.display(),
            "tool invoked for a different engagement than the active audit session"
        );
    }
}

/// Audit activation bound to a lexical scope: enabled on `start`, shut down
/// on `finish` or when dropped.
pub struct AuditSession {
    context: AuditContext,
}

impl AuditSession {
    pub fn start(engagement_dir: impl AsRef<Path>) -> Result<Self, AuditError> {
        let mut context = AuditContext::new();
        context.enable_for_engagement(engagement_dir, true)?;
        Ok(Self { context })
    }

    /// Shut down now and return the summary.
    pub fn finish(mut self) -> Result<Option<ShutdownSummary>, AuditError> {
        self.context.shutdown()
    }
}

impl Deref for AuditSession {
    type Target = AuditContext;

    fn deref(&self) -> &AuditContext {
        &self.context
    }
}

impl DerefMut for AuditSession {
    fn deref_mut(&mut self) -> &mut AuditContext {
        &mut self.context
    }
}

impl Drop for AuditSession {
    fn drop(&mut self) {
        if let Err(e) = self.context.shutdown() {
            tracing::error!(error = %e, "audit session shutdown failed");
        }
    }
}
