//! Client-facing compliance report for one session.

use chrono::{DateTime, Utc};

use engage_audit::record::{ellipsize, table_cell};
use engage_audit::{CommandStatus, LogRecord};

pub struct ComplianceContext<'a> {
    pub engagement: &'a str,
    pub session_id: &'a str,
    pub generated: DateTime<Utc>,
}

pub fn render(ctx: &ComplianceContext<'_>, records: &[LogRecord]) -> String {
    let generated = ctx.generated.format("%Y-%m-%d %H:%M:%S UTC");
    let mut out = format!(
        "# Penetration Testing Activity Report\n\n\
         **Engagement**: {engagement}\n\
         **Session**: {session}\n\
         **Generated**: {generated}\n\n\
         ## Executive Summary\n\n\
         This report documents all testing activities performed during the \
         penetration testing engagement. All activities were conducted within \
         the authorized scope and in accordance with the Statement of Work.\n\n\
         ## Activity Timeline\n\n\
         | Time (UTC) | Tool | Target | Activity Description | Duration | Status |\n\
         |------------|------|--------|----------------------|----------|--------|\n",
        engagement = ctx.engagement,
        session = ctx.session_id,
    );

    let mut commands = 0;
    for entry in records.iter().filter_map(LogRecord::as_command) {
        commands += 1;
        let status = match entry.status() {
            CommandStatus::Ok => "Success",
            CommandStatus::Failed => "Failed",
            CommandStatus::Pending => "Running",
        };
        out.push_str(&format!(
            "| {} | {} | {} | `{}` | {:.1}s | {} |\n",
            entry.timestamp.format("%H:%M:%S"),
            table_cell(&entry.tool),
            table_cell(entry.target.as_deref().unwrap_or("N/A")),
            table_cell(&ellipsize(&entry.command, 60)),
            entry.duration_secs(),
            status,
        ));
    }

    out.push_str(
        "\n\n## Scope Verification\n\n\
         All targets were verified against the authorized scope (SCOPE.md) \
         before testing:\n\n",
    );
    for check in records.iter().filter_map(LogRecord::as_scope) {
        out.push_str(&format!(
            "- `{}` - {} - {}\n",
            check.timestamp.format("%H:%M:%S"),
            check.target,
            if check.verified { "Authorized" } else { "Blocked" },
        ));
    }

    out.push_str(&format!(
        "\n\n## Testing Methodology\n\n\
         Testing was conducted following industry-standard methodologies:\n\
         - OWASP Web Security Testing Guide (WSTG)\n\
         - PTES (Penetration Testing Execution Standard)\n\
         - MITRE ATT&CK Framework\n\n\
         ## Compliance & Audit Trail\n\n\
         - **Total Commands Executed**: {commands}\n\
         - **Audit Log Location**: `audit-logs/sessions/{session}.jsonl`\n\
         - **Transcript Location**: `audit-logs/sessions/{session}.txt`\n\
         - **Integrity Verification**: SHA-256 hashes for all outputs\n\
         - **Retention Period**: 7 years (compliance requirement)\n\n\
         ## Legal & Authorization\n\n\
         All testing activities were:\n\
         - Authorized in writing by {engagement}\n\
         - Conducted within defined scope boundaries\n\
         - Performed during authorized timeframes\n\
         - Documented with complete audit trail\n\n\
         ---\n\n\
         **Report Generated**: {generated}\n\
         **Audit System**: engage-audit {version}\n",
        commands = commands,
        session = ctx.session_id,
        engagement = ctx.engagement,
        generated = generated,
        version = env!("CARGO_PKG_VERSION"),
    ));
    out
}
