// transcript.rs — Human-readable session transcript blocks.
//
// Pure rendering: each function returns the text of one block and the
// persistence thread appends it. Layout per session:
//   header, then one block per command or scope checkpoint, then footer.

use chrono::{DateTime, Utc};

use crate::record::{CommandEntry, ScopeVerificationEvent};
use crate::settings::Verbosity;

const RULE_WIDTH: usize = 80;

fn heavy_rule() -> String {
    "=".repeat(RULE_WIDTH)
}

fn light_rule() -> String {
    "─".repeat(RULE_WIDTH)
}

fn clock(ts: &DateTime<Utc>) -> String {
    ts.format("%H:%M:%S%.3f").to_string()
}

pub fn header(
    engagement: &str,
    session_id: &str,
    started: &DateTime<Utc>,
    verbosity: Verbosity,
) -> String {
    format!(
        "{rule}\n\
         PENETRATION TEST AUDIT LOG\n\
         {rule}\n\
         Engagement:     {engagement}\n\
         Session ID:     {session_id}\n\
         Started:        {started}\n\
         Audit Mode:     ENABLED\n\
         Verbosity:      {verbosity} ({describe})\n\
         {rule}\n\n",
        rule = heavy_rule(),
        started = started.format("%Y-%m-%d %H:%M:%S UTC"),
        verbosity = verbosity.to_string().to_uppercase(),
        describe = verbosity.describe(),
    )
}

/// One command block. `output` is the captured artifact text, included only
/// in full verbosity.
pub fn command_entry(entry: &CommandEntry, verbosity: Verbosity, output: Option<&str>) -> String {
    let mut block = format!(
        "\n[{time}] COMMAND #{seq:03}: {tool}\n\
         {rule}\n\
         Tool:        {tool} ({category})\n\
         Command:     {command}\n\
         Target:      {target}\n\
         Scope OK:    {scope}\n\
         Working Dir: {cwd}\n\n",
        time = clock(&entry.timestamp),
        seq = entry.sequence,
        tool = entry.tool,
        rule = light_rule(),
        category = entry.category,
        command = entry.command,
        target = entry.target.as_deref().unwrap_or("N/A"),
        scope = if entry.scope_verified {
            "[OK] YES"
        } else {
            "[WARN] NOT VERIFIED"
        },
        cwd = entry.working_dir,
    );

    if verbosity == Verbosity::Full {
        if let Some(output) = output {
            block.push_str("--- BEGIN OUTPUT ---\n");
            block.push_str(output);
            if !output.ends_with('\n') {
                block.push('\n');
            }
            block.push_str("--- END OUTPUT ---\n\n");
        }
    }

    block.push_str(&format!(
        "Duration:    {:.3}s\n\
         Exit Code:   {}\n\
         Output Hash: {}\n\
         {}\n\n",
        entry.duration_secs(),
        entry
            .exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "N/A".to_string()),
        entry.output_hash.as_deref().unwrap_or("N/A"),
        light_rule(),
    ));
    block
}

pub fn scope_entry(event: &ScopeVerificationEvent) -> String {
    format!(
        "\n[{time}] SCOPE VERIFICATION\n\
         {rule}\n\
         Target:      {target}\n\
         Status:      {status}\n\
         Reference:   {reference}\n\
         {rule}\n\n",
        time = clock(&event.timestamp),
        rule = light_rule(),
        target = event.target,
        status = if event.verified {
            "[OK] IN SCOPE"
        } else {
            "[FAIL] OUT OF SCOPE"
        },
        reference = event.reference(),
    )
}

pub fn footer(
    started: &DateTime<Utc>,
    ended: &DateTime<Utc>,
    commands: u64,
    timeline: Option<&str>,
) -> String {
    let minutes = (*ended - *started).num_milliseconds() as f64 / 60_000.0;
    format!(
        "\n{rule}\n\
         SESSION COMPLETED\n\
         {rule}\n\
         Ended:          {ended}\n\
         Duration:       {minutes:.1} minutes\n\
         Commands:       {commands}\n\
         Timeline:       {timeline}\n\
         {rule}\n",
        rule = heavy_rule(),
        ended = ended.format("%Y-%m-%d %H:%M:%S UTC"),
        timeline = timeline.unwrap_or("N/A"),
    )
}
