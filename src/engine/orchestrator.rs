// src/engine/orchestrator.rs

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::CrawlerSection;
use crate::errors::{CrawlctlError, Result};
use crate::exec::{ChildLauncher, CommandSpec, ProcessEvent, ProcessLauncher};
use crate::types::{LaunchRequest, RunStatus, StatusRecord};

use super::core;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// State shared between callers and the event pump.
#[derive(Debug, Default)]
struct Shared {
    record: StatusRecord,
    /// Generation of the current run; events of older runs are dropped.
    run_id: u64,
}

/// Public start/stop/status contract around a [`ProcessLauncher`].
///
/// The orchestrator owns the only [`StatusRecord`]. Launcher events are read
/// by a per-run pump task and applied through [`core`] under a single lock
/// that is never held across an `.await`. `start` and `stop` additionally
/// serialise on an async lifecycle lock, so a stop in its grace period and a
/// concurrent start never interleave.
pub struct Orchestrator<L: ProcessLauncher = ChildLauncher> {
    launcher: L,
    command: CommandSpec,
    shared: Arc<Mutex<Shared>>,
    /// Event pump of the latest run.
    lifecycle: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl<L: ProcessLauncher> fmt::Debug for Orchestrator<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("command", &self.command)
            .field("state", &self.full_state())
            .finish_non_exhaustive()
    }
}

impl Orchestrator<ChildLauncher> {
    /// Orchestrator running the crawler configured in `[crawler]`.
    pub fn from_config(crawler: &CrawlerSection) -> Self {
        Self::with_launcher(
            ChildLauncher::new(crawler.grace_period()),
            crawler.command_spec(),
        )
    }
}

impl<L: ProcessLauncher> Orchestrator<L> {
    pub fn with_launcher(launcher: L, command: CommandSpec) -> Self {
        Self {
            launcher,
            command,
            shared: Arc::new(Mutex::new(Shared::default())),
            lifecycle: tokio::sync::Mutex::new(None),
        }
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn command(&self) -> &CommandSpec {
        &self.command
    }

    /// Start a new crawler run.
    ///
    /// Fails with `AlreadyRunning` (record untouched) while a process is
    /// alive. A spawn failure is not an error for the caller: it is recorded
    /// as `Failed` and the orchestrator stays usable.
    pub async fn start(&self, request: &LaunchRequest) -> Result<()> {
        let mut pump = self.lifecycle.lock().await;

        if self.launcher.is_running() {
            warn!(mode = %request.mode, "start rejected; crawler is already running");
            return Err(CrawlctlError::AlreadyRunning);
        }

        let args = request.to_args();
        let (tx, rx) = mpsc::channel::<ProcessEvent>(EVENT_CHANNEL_CAPACITY);

        // Nothing reads `rx` until the pump below exists, so the record can
        // be reset after the spawn without losing early lines.
        let launched = self.launcher.execute(&self.command, &args, tx);

        if matches!(launched, Err(CrawlctlError::AlreadyRunning)) {
            warn!(mode = %request.mode, "launcher reports a live process; start rejected");
            return Err(CrawlctlError::AlreadyRunning);
        }

        let run_id = {
            let mut shared = lock(&self.shared);
            shared.run_id += 1;
            core::begin_run(&mut shared.record);
            if let Err(err) = &launched {
                core::launch_failed(&mut shared.record, &launch_cause(err));
            }
            shared.run_id
        };

        match launched {
            Ok(()) => {
                info!(
                    run_id,
                    mode = %request.mode,
                    cmd = %self.command.display_with(&args),
                    "crawler run started"
                );
                let handle = tokio::spawn(pump_events(Arc::clone(&self.shared), run_id, rx));
                if let Some(previous) = pump.replace(handle) {
                    debug!(
                        finished = previous.is_finished(),
                        "replacing event pump of previous run"
                    );
                }
            }
            Err(err) => {
                warn!(run_id, error = %err, "failed to launch crawler process");
            }
        }

        Ok(())
    }

    /// Ask the running crawler to stop. No-op when nothing is running.
    ///
    /// The final status is settled by the exit (or by a terminal line the
    /// crawler prints while shutting down), not by this call.
    pub async fn stop(&self) {
        let _pump = self.lifecycle.lock().await;

        if !self.launcher.is_running() {
            debug!("stop requested but crawler is not running");
            return;
        }

        core::stop_requested(&mut lock(&self.shared).record);
        info!("stopping crawler (user requested)");
        self.launcher.stop().await;
    }

    /// Current status; never waits on the crawler.
    pub fn status(&self) -> RunStatus {
        lock(&self.shared).record.status
    }

    /// Independent snapshot of the whole record.
    pub fn full_state(&self) -> StatusRecord {
        lock(&self.shared).record.clone()
    }

    pub fn is_running(&self) -> bool {
        self.launcher.is_running()
    }

    /// Stop the crawler if needed and wait for every background task.
    pub async fn shutdown(&self) {
        let mut pump = self.lifecycle.lock().await;

        if self.launcher.is_running() {
            core::stop_requested(&mut lock(&self.shared).record);
        }
        self.launcher.shutdown().await;

        if let Some(handle) = pump.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "event pump task failed");
            }
        }

        debug!("orchestrator shut down");
    }
}

/// Apply launcher events of run `run_id` until its channel closes.
async fn pump_events(
    shared: Arc<Mutex<Shared>>,
    run_id: u64,
    mut rx: mpsc::Receiver<ProcessEvent>,
) {
    while let Some(event) = rx.recv().await {
        let step = {
            let mut shared = lock(&shared);
            if shared.run_id == run_id {
                Some(core::apply_event(&mut shared.record, &event))
            } else {
                None
            }
        };

        let Some(step) = step else {
            debug!(run_id, ?event, "discarding event from superseded run");
            continue;
        };

        if step.status_changed() {
            info!(run_id, from = %step.before, to = %step.after, "crawler status changed");
        }

        if let ProcessEvent::Exited(outcome) = &event {
            info!(run_id, %outcome, status = %step.after, "crawler run ended");
        }
    }

    debug!(run_id, "event pump finished (channel closed)");
}

/// The OS error behind a refused spawn, without the launcher's own prefix.
fn launch_cause(err: &CrawlctlError) -> String {
    match err {
        CrawlctlError::Launch { source, .. } => source.to_string(),
        other => other.to_string(),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
