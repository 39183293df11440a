// render.rs — Plain-text renderings for terminal output.

use std::fmt;
use std::str::FromStr;

use engage_audit::record::clip;
use engage_audit::CommandStatus;

use crate::error::ViewerError;
use crate::integrity::{CheckStatus, IntegrityReport};
use crate::viewer::{LoadedSession, SearchField, SearchHit};

const WIDE: usize = 120;
const NARROW: usize = 100;

/// How `view` presents a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewFormat {
    #[default]
    Table,
    Json,
    Transcript,
}

impl FromStr for ViewFormat {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(ViewFormat::Table),
            "json" => Ok(ViewFormat::Json),
            "transcript" => Ok(ViewFormat::Transcript),
            other => Err(ViewerError::InvalidFormat(other.to_string())),
        }
    }
}

impl fmt::Display for ViewFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViewFormat::Table => "table",
            ViewFormat::Json => "json",
            ViewFormat::Transcript => "transcript",
        };
        write!(f, "{}", name)
    }
}

fn banner(out: &mut String, width: usize, title: &str) {
    let rule = "=".repeat(width);
    out.push_str(&format!("\n{}\n{}\n{}\n\n", rule, title, rule));
}

fn dashes(widths: &[usize]) -> String {
    widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fixed-width command table. Scope checkpoints are left out.
pub fn session_table(session: &LoadedSession) -> String {
    let mut out = String::new();
    banner(&mut out, WIDE, &format!("AUDIT LOG: {}", session.session_id));

    out.push_str(&format!(
        "{:<4} {:<12} {:<15} {:<25} {:<8} {:<10}\n",
        "#", "Time", "Tool", "Target", "Status", "Duration"
    ));
    out.push_str(&dashes(&[4, 12, 15, 25, 8, 10]));
    out.push('\n');

    let mut count = 0;
    for entry in session.commands() {
        count += 1;
        let status = match entry.status() {
            CommandStatus::Ok => "OK",
            CommandStatus::Failed => "FAIL",
            CommandStatus::Pending => "RUN",
        };
        out.push_str(&format!(
            "{:<4} {:<12} {:<15} {:<25} {:<8} {:<10}\n",
            entry.sequence,
            entry.timestamp.format("%H:%M:%S").to_string(),
            clip(&entry.tool, 15),
            clip(entry.target.as_deref().unwrap_or("N/A"), 25),
            status,
            format!("{:.2}s", entry.duration_secs()),
        ));
    }

    out.push_str(&format!("\n{} total commands\n", count));
    if !session.skipped.is_empty() {
        out.push_str(&format!(
            "{} malformed line(s) skipped\n",
            session.skipped.len()
        ));
    }
    out
}

/// Search results. The column opposite the searched field is shown.
pub fn search_hits(field: SearchField, value: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        let subject = match field {
            SearchField::Target => "target",
            SearchField::Tool => "tool",
        };
        return format!("No commands found for {}: {}\n", subject, value);
    }

    let (title, column, width, noun) = match field {
        SearchField::Target => (format!("COMMANDS AGAINST TARGET: {}", value), "Tool", 15, "commands"),
        SearchField::Tool => (format!("TOOL USAGE: {}", value), "Target", 25, "uses"),
    };

    let mut out = String::new();
    banner(&mut out, WIDE, &title);
    out.push_str(&format!(
        "{:<30} {:<19} {:<width$} {}\n",
        "Session",
        "Time",
        column,
        "Command",
        width = width
    ));
    out.push_str(&dashes(&[30, 19, width, 50]));
    out.push('\n');

    for hit in hits {
        let other = match field {
            SearchField::Target => hit.entry.tool.as_str(),
            SearchField::Tool => hit.entry.target.as_deref().unwrap_or("N/A"),
        };
        out.push_str(&format!(
            "{:<30} {:<19} {:<width$} {}\n",
            hit.session_id,
            hit.entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            clip(other, width),
            clip(&hit.entry.command, 50),
            width = width
        ));
    }

    out.push_str(&format!("\n{} {} found\n", hits.len(), noun));
    out
}

/// Per-file verification table with totals.
pub fn integrity_report(report: &IntegrityReport) -> String {
    let mut out = String::new();
    banner(
        &mut out,
        NARROW,
        &format!("INTEGRITY VERIFICATION: {}", report.session_id),
    );
    out.push_str(&format!("{:<60} {:<15} {:<25}\n", "File", "Status", "Hash"));
    out.push_str(&dashes(&[60, 15, 25]));
    out.push('\n');

    for check in &report.checks {
        let name = check
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| check.file.display().to_string());
        let (status, hash) = match &check.status {
            CheckStatus::Verified => ("VERIFIED", "match".to_string()),
            CheckStatus::Mismatched { actual } => ("MISMATCH", clip(actual, 25)),
            CheckStatus::Missing => ("MISSING", clip(&check.expected, 25)),
            CheckStatus::Unreadable { .. } => ("UNREADABLE", clip(&check.expected, 25)),
        };
        out.push_str(&format!(
            "{:<60} {:<15} {:<25}\n",
            clip(&name, 60),
            status,
            hash
        ));
    }

    out.push_str(&format!(
        "\n{}\nResults: {} verified | {} mismatches | {} missing\n{}\n\n",
        "=".repeat(NARROW),
        report.verified(),
        report.mismatched(),
        report.missing(),
        "=".repeat(NARROW),
    ));
    if report.unreadable() > 0 {
        out.push_str(&format!("{} file(s) could not be read:\n", report.unreadable()));
        for check in &report.checks {
            if let CheckStatus::Unreadable { error } = &check.status {
                out.push_str(&format!("  {}\n", error));
            }
        }
        out.push('\n');
    }
    if report.passed() {
        out.push_str("All files passed integrity verification\n");
    } else {
        out.push_str(
            "WARNING: Some files failed integrity verification.\n\
             This could indicate tampering or file corruption.\n",
        );
    }
    out
}
