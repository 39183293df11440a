// integrity.rs — Re-hash captured artifacts and compare against the log.
//
// Every command record that names an output file also carries the SHA-256 of
// that file at capture time. Verification recomputes the digest from disk;
// it never modifies anything.

use std::path::PathBuf;

use engage_audit::hasher;

use crate::viewer::LoadedSession;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Verified,
    Mismatched { actual: String },
    Missing,
    /// Present but could not be read back.
    Unreadable { error: String },
}

/// Outcome for one artifact.
#[derive(Debug, Clone)]
pub struct FileCheck {
    pub sequence: u64,
    pub file: PathBuf,
    /// Expected digest, hex without the `sha256:` tag.
    pub expected: String,
    pub status: CheckStatus,
}

#[derive(Debug, Clone)]
pub struct IntegrityReport {
    pub session_id: String,
    pub checks: Vec<FileCheck>,
}

impl IntegrityReport {
    fn count(&self, f: impl Fn(&CheckStatus) -> bool) -> usize {
        self.checks.iter().filter(|c| f(&c.status)).count()
    }

    pub fn verified(&self) -> usize {
        self.count(|s| matches!(s, CheckStatus::Verified))
    }

    pub fn mismatched(&self) -> usize {
        self.count(|s| matches!(s, CheckStatus::Mismatched { .. }))
    }

    pub fn missing(&self) -> usize {
        self.count(|s| matches!(s, CheckStatus::Missing))
    }

    pub fn unreadable(&self) -> usize {
        self.count(|s| matches!(s, CheckStatus::Unreadable { .. }))
    }

    /// Every checked artifact matched its recorded digest.
    pub fn passed(&self) -> bool {
        self.verified() == self.checks.len()
    }
}

/// Check every artifact of `session`. A file that cannot be read is
/// reported on its own line and does not stop the others being checked.
pub fn verify(session: &LoadedSession) -> IntegrityReport {
    let mut checks = Vec::new();
    for entry in session.commands() {
        let (Some(file), Some(stored)) = (&entry.output_file, &entry.output_hash) else {
            continue;
        };
        let expected = hasher::strip_tag(stored).to_string();
        let status = if !file.exists() {
            CheckStatus::Missing
        } else {
            match hasher::hash_file(file) {
                Ok(actual) if actual == expected => CheckStatus::Verified,
                Ok(actual) => CheckStatus::Mismatched { actual },
                Err(e) => CheckStatus::Unreadable {
                    error: e.to_string(),
                },
            }
        };
        checks.push(FileCheck {
            sequence: entry.sequence,
            file: file.clone(),
            expected,
            status,
        });
    }
    IntegrityReport {
        session_id: session.session_id.clone(),
        checks,
    }
}
