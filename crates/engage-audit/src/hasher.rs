// hasher.rs — SHA-256 content digests for output artifacts.
//
// Digests are lowercase hex. Records store them tagged as `sha256:<hex>` so
// the algorithm travels with the value; `strip_tag` undoes that for
// comparison.

use sha2::{Digest, Sha256};
use std::path::Path;

use crate::error::AuditError;

/// Tag prepended to every digest stored in a structured log.
pub const HASH_TAG: &str = "sha256:";

/// Hash arbitrary bytes, returning a lowercase hex-encoded SHA-256 string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Hash a UTF-8 string.
pub fn hash_str(s: &str) -> String {
    hash_bytes(s.as_bytes())
}

/// Hash the contents of a file on disk.
///
/// Reads the whole file; tool outputs are small enough for this.
pub fn hash_file(path: &Path) -> Result<String, AuditError> {
    let data = std::fs::read(path).map_err(|source| AuditError::HashFileFailed {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(hash_bytes(&data))
}

/// `sha256:<hex>` form of a digest, as written to the structured log.
pub fn tagged(hex: &str) -> String {
    format!("{}{}", HASH_TAG, hex)
}

/// Bare hex digest from a stored value. Untagged values pass through.
pub fn strip_tag(stored: &str) -> &str {
    stored.strip_prefix(HASH_TAG).unwrap_or(stored)
}
