// verify.rs — Re-hash captured outputs; fails when anything is off.

use std::path::Path;

use engage_viewer::render_integrity;

use super::open_viewer;

pub fn execute(engagement: &Path, session: Option<&str>) -> anyhow::Result<()> {
    let viewer = open_viewer(engagement)?;
    let report = viewer.verify_integrity(session)?;
    print!("{}", render_integrity(&report));
    if !report.passed() {
        anyhow::bail!(
            "integrity check failed for {}: {} mismatched, {} missing, {} unreadable",
            report.session_id,
            report.mismatched(),
            report.missing(),
            report.unreadable()
        );
    }
    Ok(())
}
