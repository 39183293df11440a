// review_workflow.rs — Post-engagement review of real sessions on disk.
//
// Sessions are produced by the real logger, then read back the way a
// reviewer would:
//
//   1. Record two sessions against one engagement
//   2. View the latest one in every format
//   3. Search across sessions by target and by tool
//   4. Verify artifact integrity, then tamper with and delete artifacts
//   5. Export the compliance report
//
// VERIFY:
//   - Records round-trip with tool, target, command, exit code, and hash
//   - Tampering flips exactly the touched artifact to mismatched
//   - Deleting an artifact reports it as missing
//   - Malformed log lines are skipped while the rest still load

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use tempfile::tempdir;

use engage_audit::{CommandSpec, SessionLogger, Verbosity};
use engage_viewer::{
    render_integrity, render_search_hits, AuditViewer, CheckStatus, SearchField, ViewFormat,
};

fn record_session(engagement: &Path, commands: &[(&str, &str, &str)]) -> String {
    let mut logger = SessionLogger::initialize(engagement, true, Verbosity::Full).unwrap();
    logger
        .log_scope_verification(commands.first().map_or("none", |c| c.1), true, Some(7))
        .unwrap();
    for (tool, target, output) in commands {
        let mut cmd = logger.log_command(
            CommandSpec::new(*tool, format!("{} -v {}", tool, target))
                .with_target(*target)
                .scope_verified(true),
        );
        cmd.record_output(*output, None).unwrap();
        cmd.record_exit_code(0);
    }
    let id = logger.session_id().unwrap().to_string();
    logger.shutdown().unwrap();
    id
}

#[test]
fn view_latest_session_in_every_format() {
    let dir = tempdir().unwrap();
    record_session(dir.path(), &[("scan", "10.0.0.1", "old")]);
    let latest = record_session(
        dir.path(),
        &[("scan", "10.0.0.5", "three ports open"), ("probe", "10.0.0.5", "banner")],
    );

    let viewer = AuditViewer::open(dir.path()).unwrap();
    assert_eq!(viewer.latest_session().unwrap(), latest);

    let table = viewer.view(None, ViewFormat::Table).unwrap();
    assert!(table.contains(&format!("AUDIT LOG: {}", latest)));
    assert!(table.contains("2 total commands"));

    let json = viewer.view(Some(&latest), ViewFormat::Json).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    let records = parsed.as_array().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["event_type"], "scope_verification");
    assert_eq!(records[1]["tool"], "scan");
    assert_eq!(records[1]["target"], "10.0.0.5");
    assert_eq!(records[1]["command"], "scan -v 10.0.0.5");
    assert_eq!(records[1]["exit_code"], 0);
    assert_eq!(
        records[1]["output_hash"],
        format!("sha256:{}", engage_audit::hasher::hash_str("three ports open"))
    );

    let transcript = viewer.view(None, ViewFormat::Transcript).unwrap();
    assert!(transcript.contains("PENETRATION TEST AUDIT LOG"));
    assert!(transcript.contains("three ports open"));

    let index = viewer.read_index().unwrap();
    assert_eq!(index.len(), 2);
    assert_eq!(index[&latest].commands, 2);
}

#[test]
fn search_spans_all_sessions() {
    let dir = tempdir().unwrap();
    let first = record_session(dir.path(), &[("scan", "10.0.0.5", "a")]);
    let second = record_session(dir.path(), &[("probe", "10.0.0.5", "b"), ("scan", "10.0.0.9", "c")]);
    let viewer = AuditViewer::open(dir.path()).unwrap();

    let hits = viewer.search_target("10.0.0.5", None).unwrap();
    let sessions: Vec<_> = hits.iter().map(|h| h.session_id.clone()).collect();
    assert_eq!(sessions.len(), 2);
    assert!(sessions.contains(&first) && sessions.contains(&second));

    let hits = viewer.search_tool("scan", Some(&second)).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].entry.target.as_deref(), Some("10.0.0.9"));

    let text = render_search_hits(SearchField::Tool, "scan", &hits);
    assert!(text.contains("TOOL USAGE: scan"));
    assert!(text.contains("1 uses found"));

    assert!(viewer.search_tool("nonexistent", None).unwrap().is_empty());
}

#[test]
fn integrity_detects_tampering_and_deletion() {
    let dir = tempdir().unwrap();
    let id = record_session(
        dir.path(),
        &[
            ("scan", "10.0.0.5", "22/tcp open"),
            ("probe", "10.0.0.5", "HTTP/1.1 200 OK"),
            ("scan", "10.0.0.6", "all filtered"),
        ],
    );
    let viewer = AuditViewer::open(dir.path()).unwrap();

    let report = viewer.verify_integrity(Some(&id)).unwrap();
    assert_eq!(report.verified(), 3);
    assert!(report.passed());
    // Verification is read-only and repeatable.
    assert!(viewer.verify_integrity(Some(&id)).unwrap().passed());

    let tampered = report.checks[0].file.clone();
    let deleted = report.checks[2].file.clone();
    let mut file = OpenOptions::new().append(true).open(&tampered).unwrap();
    file.write_all(b"!").unwrap();
    drop(file);
    fs::remove_file(&deleted).unwrap();

    let report = viewer.verify_integrity(Some(&id)).unwrap();
    assert!(matches!(report.checks[0].status, CheckStatus::Mismatched { .. }));
    assert_eq!(report.checks[1].status, CheckStatus::Verified);
    assert_eq!(report.checks[2].status, CheckStatus::Missing);
    assert!(!report.passed());

    let text = render_integrity(&report);
    assert!(text.contains("Results: 1 verified | 1 mismatches | 1 missing"));
    assert!(text.contains("WARNING"));
}

#[test]
fn malformed_lines_do_not_hide_the_rest() {
    let dir = tempdir().unwrap();
    let id = record_session(dir.path(), &[("scan", "10.0.0.5", "x"), ("scan", "10.0.0.6", "y")]);
    let viewer = AuditViewer::open(dir.path()).unwrap();

    let jsonl = viewer.layout().session(&id).jsonl;
    let mut file = OpenOptions::new().append(true).open(&jsonl).unwrap();
    writeln!(file, "{{\"timestamp\": truncated").unwrap();
    drop(file);

    let loaded = viewer.load_session(&id).unwrap();
    assert_eq!(loaded.records.len(), 3);
    assert_eq!(loaded.skipped.len(), 1);
    assert_eq!(loaded.skipped[0].line, 4);
}

#[test]
fn compliance_report_for_latest_session() {
    let dir = tempdir().unwrap();
    let engagement = dir.path().join("acme-2026-q4");
    let id = record_session(&engagement, &[("scan", "10.0.0.5", "three ports open")]);
    let viewer = AuditViewer::open(&engagement).unwrap();

    let out = dir.path().join("deliverables/activity.md");
    viewer.export_compliance_report(&out, None).unwrap();
    let md = fs::read_to_string(out).unwrap();
    assert!(md.contains("**Engagement**: acme-2026-q4"));
    assert!(md.contains(&format!("**Session**: {}", id)));
    assert!(md.contains("| scan | 10.0.0.5 | `scan -v 10.0.0.5`"));
    assert!(md.contains("10.0.0.5 - Authorized"));
    assert!(md.contains("**Total Commands Executed**: 1"));
}
