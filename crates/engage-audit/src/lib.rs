//! # engage-audit
//!
//! Audit trail for security-testing engagements.
//!
//! Every tool execution during an engagement is recorded by a
//! [`SessionLogger`]: a line in a JSONL structured log, a block in a
//! human-readable transcript, and, when the tool produced output, a captured
//! artifact fingerprinted with SHA-256. Scope checkpoints are recorded the
//! same way. Records are persisted by one background thread per session, so
//! callers never block on disk I/O beyond a bounded queue.
//!
//! At shutdown the session writes a markdown timeline for the client and adds
//! itself to the engagement's `audit-index.json`.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use engage_audit::{CommandSpec, SessionLogger, Verbosity};
//!
//! let mut logger = SessionLogger::initialize("/tmp/client-2026", true, Verbosity::Full).unwrap();
//! {
//!     let mut cmd = logger.log_command(
//!         CommandSpec::new("scan", "scan -sV 10.0.0.5").with_target("10.0.0.5"),
//!     );
//!     cmd.record_output("22/tcp open ssh", None).unwrap();
//!     cmd.record_exit_code(0);
//! }
//! logger.shutdown().unwrap();
//! ```

pub mod activation;
pub mod error;
pub mod hasher;
pub mod index;
pub mod layout;
pub mod log;
pub mod logger;
pub mod record;
pub mod settings;
pub mod timeline;
pub mod transcript;
mod writer;

pub use activation::{AuditContext, AuditSession, AuditedOutcome, ToolInvocation, ToolResult};
pub use error::AuditError;
pub use index::{read_index, SessionIndex, SessionIndexEntry};
pub use layout::{AuditLayout, SessionPaths};
pub use log::{read_records, LoadedRecords, SkippedLine};
pub use logger::{CommandScope, CommandSpec, SessionLogger, ShutdownSummary};
pub use record::{CommandEntry, CommandStatus, LogRecord, ScopeVerificationEvent};
pub use settings::{AuditSettings, Verbosity};
pub use writer::WriterStats;
