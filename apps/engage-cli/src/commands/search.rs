// search.rs — Search subcommands: target, tool.

use std::path::Path;

use clap::Subcommand;
use engage_viewer::{render_search_hits, SearchField};

use super::open_viewer;

#[derive(Subcommand)]
pub enum SearchCommands {
    /// Commands run against a target (exact match).
    Target {
        target: String,
        /// Restrict to one session.
        #[arg(long)]
        session: Option<String>,
    },
    /// Commands run with a tool (exact match).
    Tool {
        tool: String,
        /// Restrict to one session.
        #[arg(long)]
        session: Option<String>,
    },
}

pub fn execute(cmd: &SearchCommands, engagement: &Path) -> anyhow::Result<()> {
    let (field, value, session) = match cmd {
        SearchCommands::Target { target, session } => (SearchField::Target, target, session),
        SearchCommands::Tool { tool, session } => (SearchField::Tool, tool, session),
    };
    let viewer = open_viewer(engagement)?;
    let hits = viewer.search(field, value, session.as_deref())?;
    print!("{}", render_search_hits(field, value, &hits));
    Ok(())
}
