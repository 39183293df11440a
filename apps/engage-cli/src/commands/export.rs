// export.rs — Write the client compliance report.

use std::path::Path;

use super::open_viewer;

pub fn execute(engagement: &Path, output: &Path, session: Option<&str>) -> anyhow::Result<()> {
    let viewer = open_viewer(engagement)?;
    let path = viewer.export_compliance_report(output, session)?;
    println!("Compliance report exported to {}", path.display());
    Ok(())
}
