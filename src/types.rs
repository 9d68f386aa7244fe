// src/types.rs

//! Plain records carried across the orchestrator boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const ARG_MODE: &str = "--mode";
pub const ARG_START_ROUND: &str = "--start-round";
pub const ARG_END_ROUND: &str = "--end-round";
pub const ARG_HEADLESS: &str = "--headless";
pub const ARG_TIMEOUT: &str = "--timeout";

pub const DEFAULT_TIMEOUT_SECONDS: u32 = 300;

/// Lifecycle status of the crawler as seen by callers.
///
/// - `Idle`: nothing has run yet, or the last run exited without reporting a
///   terminal status.
/// - `Running`: a run was started and has not reached a terminal status.
/// - `Completed`: the crawler printed `STATUS:COMPLETE`.
/// - `Failed`: the crawler printed `ERROR:...`, or could not be spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Idle => "IDLE",
            RunStatus::Running => "RUNNING",
            RunStatus::Completed => "COMPLETED",
            RunStatus::Failed => "FAILED",
        }
    }

    /// `Completed` and `Failed` only change through a new run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "idle" => Ok(RunStatus::Idle),
            "running" => Ok(RunStatus::Running),
            "completed" => Ok(RunStatus::Completed),
            "failed" => Ok(RunStatus::Failed),
            other => Err(format!(
                "invalid run status: {other} (expected idle, running, completed or failed)"
            )),
        }
    }
}

/// Current status, progress and last informational line of the crawler.
///
/// One record lives for the lifetime of an orchestrator and is reset at the
/// start of every run. Callers only ever see clones of it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    pub status: RunStatus,
    /// Percentage in `0..=100`.
    pub progress: u8,
    pub last_log: String,
}

impl StatusRecord {
    pub fn new(status: RunStatus, progress: u8, last_log: impl Into<String>) -> Self {
        Self {
            status,
            progress: progress.min(100),
            last_log: last_log.into(),
        }
    }

    /// Reset in place for a fresh run.
    pub fn reset_for_run(&mut self, last_log: impl Into<String>) {
        self.status = RunStatus::Running;
        self.progress = 0;
        self.last_log = last_log.into();
    }
}

/// Parameters of a single crawler run.
///
/// JSON shape follows the serving layer: `mode`, `startRound`, `endRound`,
/// `headless`, `timeout` (also accepted as `timeoutSeconds`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchRequest {
    pub mode: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_round: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_round: Option<String>,

    #[serde(default = "default_headless")]
    pub headless: bool,

    #[serde(
        default = "default_timeout_seconds",
        rename = "timeout",
        alias = "timeoutSeconds"
    )]
    pub timeout_seconds: u32,
}

fn default_headless() -> bool {
    true
}

fn default_timeout_seconds() -> u32 {
    DEFAULT_TIMEOUT_SECONDS
}

impl LaunchRequest {
    /// A request for `mode` with every other field at its default.
    pub fn new(mode: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            start_round: None,
            end_round: None,
            headless: default_headless(),
            timeout_seconds: default_timeout_seconds(),
        }
    }

    /// Translate into the crawler's command-line arguments.
    ///
    /// Order is fixed: mode, start round, end round, headless, timeout.
    /// Round flags are skipped when absent or empty.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![ARG_MODE.to_string(), self.mode.clone()];

        if let Some(round) = non_empty(&self.start_round) {
            args.push(ARG_START_ROUND.to_string());
            args.push(round.to_string());
        }

        if let Some(round) = non_empty(&self.end_round) {
            args.push(ARG_END_ROUND.to_string());
            args.push(round.to_string());
        }

        if self.headless {
            args.push(ARG_HEADLESS.to_string());
        }

        args.push(ARG_TIMEOUT.to_string());
        args.push(self.timeout_seconds.to_string());

        args
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
