// sessions.rs — List sessions and view one.

use std::path::Path;

use engage_viewer::ViewFormat;

use super::open_viewer;

pub fn list(engagement: &Path) -> anyhow::Result<()> {
    let viewer = open_viewer(engagement)?;
    let sessions = viewer.list_sessions()?;
    if sessions.is_empty() {
        println!("No audit sessions.");
        return Ok(());
    }

    let index = viewer.read_index()?;
    println!(
        "{:<30} {:<20} {:<20} {:>8}",
        "SESSION", "STARTED", "ENDED", "COMMANDS"
    );
    println!("{}", "-".repeat(80));
    for id in &sessions {
        match index.get(id) {
            Some(entry) => println!(
                "{:<30} {:<20} {:<20} {:>8}",
                id,
                entry.started.format("%Y-%m-%d %H:%M:%S").to_string(),
                entry.ended.format("%Y-%m-%d %H:%M:%S").to_string(),
                entry.commands,
            ),
            // Still running, or ended without reaching the index.
            None => println!("{:<30} {:<20} {:<20} {:>8}", id, "-", "-", "-"),
        }
    }
    println!("\n{} session(s)", sessions.len());
    Ok(())
}

pub fn view(engagement: &Path, session: Option<&str>, format: &str) -> anyhow::Result<()> {
    let format: ViewFormat = format.parse()?;
    let viewer = open_viewer(engagement)?;
    print!("{}", viewer.view(session, format)?);
    Ok(())
}
