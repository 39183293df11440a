pub mod exec;
pub mod export;
pub mod search;
pub mod sessions;
pub mod verify;

use std::path::Path;

use anyhow::Context;
use engage_viewer::AuditViewer;

pub(crate) fn open_viewer(engagement: &Path) -> anyhow::Result<AuditViewer> {
    AuditViewer::open(engagement)
        .with_context(|| format!("cannot read audit logs for {}", engagement.display()))
}
