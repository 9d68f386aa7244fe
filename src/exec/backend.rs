// src/exec/backend.rs

//! Pluggable launcher abstraction.
//!
//! The orchestrator talks to a `ProcessLauncher` instead of a concrete child
//! process. Production code uses [`ChildLauncher`](super::ChildLauncher);
//! tests provide launchers that record argument vectors and emit
//! [`ProcessEvent`]s on demand without spawning anything.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::errors::Result;

use super::{CommandSpec, ProcessEvent};

/// Trait abstracting how the crawler process is run and stopped.
pub trait ProcessLauncher: Send + Sync {
    /// Start `command` with `args`.
    ///
    /// Output lines and the final exit are delivered on `events`. Fails with
    /// `AlreadyRunning` while a process is alive, or `Launch` when the OS
    /// refuses to spawn.
    fn execute(
        &self,
        command: &CommandSpec,
        args: &[String],
        events: mpsc::Sender<ProcessEvent>,
    ) -> Result<()>;

    /// Terminate the running process, gracefully first. No-op when idle.
    fn stop(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;

    /// Whether a process handle exists and has not been observed to exit.
    fn is_running(&self) -> bool;

    /// Stop anything still running and wait for background tasks to finish.
    fn shutdown(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}
