// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for running the crawler process with
//! `tokio::process::Command` and reporting what it prints, and when it exits,
//! as [`ProcessEvent`]s on a channel owned by the caller.
//!
//! - [`backend`] provides the `ProcessLauncher` trait the orchestrator talks
//!   to, so tests can swap in a fake launcher.
//! - [`child`] is the production `ChildLauncher`: spawn, exit watcher and
//!   graceful-then-forced stop.
//! - [`streams`] holds the per-stream line reader tasks.
//! - [`terminate`] sends the graceful termination signal.

pub mod backend;
pub mod child;
pub mod streams;
pub mod terminate;

use std::fmt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;

pub use backend::ProcessLauncher;
pub use child::ChildLauncher;
pub use streams::{OutputStream, spawn_line_reader};

/// What the crawler process reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    /// One complete line from stdout, without its line terminator.
    Stdout(String),
    /// One complete line from stderr, without its line terminator.
    Stderr(String),
    /// The process terminated. Sent once, after both readers drained.
    Exited(ExitOutcome),
}

/// How the process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitOutcome {
    Code(i32),
    /// Terminated by a signal (unix).
    Signal(i32),
    /// Waiting on the process failed; the cause is kept as text.
    WaitFailed(String),
}

impl ExitOutcome {
    pub fn from_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ExitOutcome::Code(code);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitOutcome::Signal(signal);
            }
        }

        ExitOutcome::Code(-1)
    }

    pub fn success(&self) -> bool {
        matches!(self, ExitOutcome::Code(0))
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitOutcome::Code(code) => write!(f, "exit code {code}"),
            ExitOutcome::Signal(signal) => write!(f, "terminated by signal {signal}"),
            ExitOutcome::WaitFailed(cause) => write!(f, "wait failed: {cause}"),
        }
    }
}

/// The executable the launcher runs: `program [script] args...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub script: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            script: None,
            working_dir: None,
        }
    }

    pub fn with_script(mut self, script: impl Into<PathBuf>) -> Self {
        self.script = Some(script.into());
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Build the tokio command with piped output streams.
    pub fn to_command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(script) = &self.script {
            cmd.arg(script);
        }
        cmd.args(args);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        cmd
    }

    /// Shell-like rendering used for logs and `--dry-run`.
    pub fn display_with(&self, args: &[String]) -> String {
        let mut parts = vec![self.program.clone()];
        if let Some(script) = &self.script {
            parts.push(script.display().to_string());
        }
        parts.extend(args.iter().cloned());
        parts.join(" ")
    }
}
