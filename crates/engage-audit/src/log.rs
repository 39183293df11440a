// log.rs — Append-only JSONL structured session log.
//
// The structured log is a JSONL (JSON Lines) file: one `LogRecord` per line.
// This format is append-friendly and easy to inspect with standard tools
// (jq, grep). Only the persistence thread appends during a live session;
// anything may read it afterwards.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::AuditError;
use crate::record::LogRecord;

/// Append handle for a session's structured log.
pub struct StructuredLog {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl StructuredLog {
    /// Open (or create) the log in append mode. Existing lines are never
    /// rewritten.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| AuditError::OpenFailed {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            writer: BufWriter::new(file),
            path,
        })
    }

    /// Append one record as a single line and flush it to the OS.
    pub fn append(&mut self, record: &LogRecord) -> Result<(), AuditError> {
        let json = serde_json::to_string(record)?;
        writeln!(self.writer, "{}", json).map_err(|e| AuditError::write(&self.path, e))?;
        self.writer
            .flush()
            .map_err(|e| AuditError::write(&self.path, e))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A line that could not be parsed as a record.
#[derive(Debug, Clone)]
pub struct SkippedLine {
    /// 1-based line number in the structured log.
    pub line: usize,
    pub reason: String,
}

/// Records read back from a structured log, in file order.
#[derive(Debug, Clone, Default)]
pub struct LoadedRecords {
    pub records: Vec<LogRecord>,
    pub skipped: Vec<SkippedLine>,
}

/// Read every record from a structured log.
///
/// Blank lines are ignored. A malformed line is a defect in one record, not
/// in the log: it is skipped, logged, and reported in `skipped`.
pub fn read_records(path: impl AsRef<Path>) -> Result<LoadedRecords, AuditError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| AuditError::OpenFailed {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    let mut loaded = LoadedRecords::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| AuditError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<LogRecord>(&line) {
            Ok(record) => loaded.records.push(record),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    line = idx + 1,
                    error = %e,
                    "skipping malformed audit record"
                );
                loaded.skipped.push(SkippedLine {
                    line: idx + 1,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ScopeVerificationEvent;
    use tempfile::tempdir;

    fn scope(target: &str) -> LogRecord {
        LogRecord::Scope(ScopeVerificationEvent::new("s", target, true, Some(3)))
    }

    #[test]
    fn append_and_read_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.jsonl");
        {
            let mut log = StructuredLog::open(&path).unwrap();
            log.append(&scope("10.0.0.5")).unwrap();
            log.append(&scope("10.0.0.6")).unwrap();
        }
        let loaded = read_records(&path).unwrap();
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.records[1].as_scope().unwrap().target, "10.0.0.6");
        assert!(loaded.skipped.is_empty());
    }

    #[test]
    fn reopen_appends_instead_of_truncating() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.jsonl");
        StructuredLog::open(&path).unwrap().append(&scope("a")).unwrap();
        StructuredLog::open(&path).unwrap().append(&scope("b")).unwrap();
        assert_eq!(read_records(&path).unwrap().records.len(), 2);
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.jsonl");
        let good = serde_json::to_string(&scope("10.0.0.5")).unwrap();
        std::fs::write(&path, format!("{}\n{{not json\n\n{}\n", good, good)).unwrap();

        let loaded = read_records(&path).unwrap();
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.skipped.len(), 1);
        assert_eq!(loaded.skipped[0].line, 2);
    }

    #[test]
    fn missing_log_is_an_open_error() {
        let dir = tempdir().unwrap();
        let err = read_records(dir.path().join("nope.jsonl")).unwrap_err();
        assert!(matches!(err, AuditError::OpenFailed { .. }));
    }
}
