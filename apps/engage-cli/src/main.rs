//! # engage-cli
//!
//! Command-line interface for engagement audit logs:
//! - `engage exec -- <tool> <args>`: run a tool and record it in the audit trail
//! - `engage sessions`: list recorded sessions
//! - `engage view`: show a session as a table, JSON, or transcript
//! - `engage search target|tool`: find commands across sessions
//! - `engage verify`: re-check captured output hashes
//! - `engage export`: write the client compliance report

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Record and review audit trails for security-testing engagements.
#[derive(Parser)]
#[command(name = "engage", version, about)]
struct Cli {
    /// Engagement directory (defaults to current directory).
    #[arg(long, short = 'e', default_value = ".")]
    engagement: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a tool and record it in a new audit session.
    Exec(commands::exec::ExecArgs),
    /// List recorded sessions.
    Sessions,
    /// Show one session (defaults to the latest).
    View {
        /// Session id.
        #[arg(long)]
        session: Option<String>,
        /// Output format: table, json, or transcript.
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Find commands by target or tool.
    Search {
        #[command(subcommand)]
        command: commands::search::SearchCommands,
    },
    /// Verify captured output files against their recorded hashes.
    Verify {
        /// Session id (defaults to the latest).
        #[arg(long)]
        session: Option<String>,
    },
    /// Export a markdown compliance report.
    Export {
        /// Where to write the report.
        output: PathBuf,
        /// Session id (defaults to the latest).
        #[arg(long)]
        session: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so rendered output on stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("engage_audit=info".parse()?)
                .add_directive("engage_viewer=info".parse()?)
                .add_directive("engage_cli=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let engagement = cli.engagement.canonicalize().unwrap_or(cli.engagement);

    match &cli.command {
        Commands::Exec(args) => commands::exec::execute(args, &engagement),
        Commands::Sessions => commands::sessions::list(&engagement),
        Commands::View { session, format } => {
            commands::sessions::view(&engagement, session.as_deref(), format)
        }
        Commands::Search { command } => commands::search::execute(command, &engagement),
        Commands::Verify { session } => commands::verify::execute(&engagement, session.as_deref()),
        Commands::Export { output, session } => {
            commands::export::execute(&engagement, output, session.as_deref())
        }
    }
}
