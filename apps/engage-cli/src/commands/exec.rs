// exec.rs — Run one tool inside a fresh audit session.
//
// `engage exec --target 10.0.0.5 -- scan -sV 10.0.0.5`:
// 1. Starts a session for the engagement (settings from audit.toml)
// 2. Records a scope checkpoint when the target was verified
// 3. Runs the program, echoing its stdout/stderr, and records the combined
//    output and exit code
// 4. Shuts the session down and exits with the tool's exit code

use std::io::{self, Write};
use std::path::Path;
use std::process::Command;

use anyhow::Context;
use clap::Args;
use engage_audit::{AuditSettings, CommandSpec, SessionLogger};

/// Exit code recorded when the program cannot be started at all.
const SPAWN_FAILED: i32 = 127;

#[derive(Args)]
pub struct ExecArgs {
    /// Tool name for the log (defaults to the program's file name).
    #[arg(long)]
    pub tool: Option<String>,
    /// Host, URL, or range the tool is aimed at.
    #[arg(long)]
    pub target: Option<String>,
    /// Tool category (network, web, ...).
    #[arg(long, default_value = "unknown")]
    pub category: String,
    /// The target was checked against the engagement scope.
    #[arg(long)]
    pub scope_verified: bool,
    /// Line of SCOPE.md that authorizes the target.
    #[arg(long, requires = "target")]
    pub scope_line: Option<u32>,
    /// Program and arguments, after `--`.
    #[arg(last = true, required = true)]
    pub program: Vec<String>,
}

impl ExecArgs {
    fn tool_name(&self, program: &str) -> String {
        self.tool.clone().unwrap_or_else(|| {
            Path::new(program)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| program.to_string())
        })
    }

    fn spec(&self, tool: &str) -> CommandSpec {
        let spec = CommandSpec::new(tool, self.program.join(" "))
            .with_category(&self.category)
            .scope_verified(self.scope_verified || self.scope_line.is_some());
        match &self.target {
            Some(target) => spec.with_target(target),
            None => spec,
        }
    }
}

pub fn execute(args: &ExecArgs, engagement: &Path) -> anyhow::Result<()> {
    let (program, program_args) = args
        .program
        .split_first()
        .context("no program given after --")?;
    let tool = args.tool_name(program);

    let settings = AuditSettings::load(engagement)?;
    let mut logger = SessionLogger::with_settings(engagement, &settings)
        .with_context(|| format!("cannot start audit session in {}", engagement.display()))?;
    if !logger.is_enabled() {
        tracing::warn!(
            engagement = %engagement.display(),
            "audit logging disabled in audit.toml, running unrecorded"
        );
    }

    if let Some(target) = &args.target {
        if args.scope_verified || args.scope_line.is_some() {
            logger.log_scope_verification(target, true, args.scope_line)?;
        }
    }

    let code = {
        let mut scope = logger.log_command(args.spec(&tool));
        match Command::new(program).args(program_args).output() {
            Ok(out) => {
                io::stdout().write_all(&out.stdout)?;
                io::stderr().write_all(&out.stderr)?;

                let mut captured = out.stdout;
                captured.extend_from_slice(&out.stderr);
                if let Err(e) = scope.record_output(&captured, None) {
                    tracing::warn!(tool = %tool, error = %e, "tool output not captured");
                }
                // Killed by a signal: no exit code, record as failure.
                let code = out.status.code().unwrap_or(-1);
                scope.record_exit_code(code);
                code
            }
            Err(e) => {
                let message = format!("failed to start {}: {}", program, e);
                eprintln!("{}", message);
                if let Err(e) = scope.record_output(&message, None) {
                    tracing::warn!(tool = %tool, error = %e, "tool output not captured");
                }
                scope.record_exit_code(SPAWN_FAILED);
                SPAWN_FAILED
            }
        }
    };

    if let Some(summary) = logger.shutdown()? {
        eprintln!(
            "Audit session {} recorded ({} command(s)).",
            summary.session_id, summary.commands
        );
        for issue in &summary.issues {
            eprintln!("  warning: {}", issue);
        }
    }

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
