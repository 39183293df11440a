//! Audit settings, optionally loaded from `<engagement>/audit.toml`.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AuditError;

/// File name of the per-engagement settings file.
pub const SETTINGS_FILE: &str = "audit.toml";

/// How much of each command the transcript captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    /// Command text plus captured output.
    #[default]
    Full,
    /// Command text only.
    Commands,
}

impl Verbosity {
    pub fn describe(&self) -> &'static str {
        match self {
            Verbosity::Full => "Full command + output capture",
            Verbosity::Commands => "Commands only",
        }
    }
}

impl FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(Verbosity::Full),
            "commands" => Ok(Verbosity::Commands),
            _ => Err(format!(
                "Invalid verbosity: '{}'. Valid values: full, commands",
                s
            )),
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verbosity::Full => write!(f, "full"),
            Verbosity::Commands => write!(f, "commands"),
        }
    }
}

/// Tunables for one logging session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSettings {
    /// When false every recording call is inert and nothing touches disk.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub verbosity: Verbosity,

    /// Records that may wait in the write queue before producers block.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// How long the persistence thread waits on an empty queue per poll.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            verbosity: Verbosity::default(),
            queue_capacity: default_queue_capacity(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl AuditSettings {
    pub fn new(enabled: bool, verbosity: Verbosity) -> Self {
        Self {
            enabled,
            verbosity,
            ..Self::default()
        }
    }

    /// Load `<engagement_dir>/audit.toml`, falling back to defaults when the
    /// file does not exist.
    pub fn load(engagement_dir: &Path) -> Result<Self, AuditError> {
        let path = engagement_dir.join(SETTINGS_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|source| AuditError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        Self::parse(&content).map_err(|reason| AuditError::ConfigInvalid { path, reason })
    }

    /// Parse settings from TOML text.
    pub fn parse(content: &str) -> Result<Self, String> {
        let settings: AuditSettings = toml::from_str(content).map_err(|e| e.to_string())?;
        if settings.queue_capacity == 0 {
            return Err("queue_capacity must be at least 1".to_string());
        }
        Ok(settings)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
