// src/exec/child.rs

//! Production launcher backed by a real child process.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::process::Child;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::{CrawlctlError, Result};

use super::backend::ProcessLauncher;
use super::streams::{OutputStream, spawn_line_reader};
use super::terminate::request_termination;
use super::{CommandSpec, ExitOutcome, ProcessEvent};

/// Grace period between SIGTERM and the forced kill.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(1);

/// How long the exit watcher waits for the readers to drain after exit.
const READER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Internal handle for the currently running crawler process.
///
/// - `alive` is cleared by the exit watcher as soon as the process exits.
/// - `kill` asks the watcher to force-kill the child.
/// - `watcher` is the Tokio task blocked on the child's exit.
struct ActiveProcess {
    run_id: u64,
    pid: Option<u32>,
    alive: Arc<AtomicBool>,
    term_sent: bool,
    kill: Option<oneshot::Sender<()>>,
    watcher: Option<JoinHandle<()>>,
}

impl ActiveProcess {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

/// Runs the crawler as a child process, at most one at a time.
///
/// Per run this spawns three Tokio tasks: a stdout reader, a stderr reader
/// and an exit watcher. The watcher reports [`ProcessEvent::Exited`] once
/// both readers have drained (best-effort, bounded by a short timeout).
pub struct ChildLauncher {
    grace_period: Duration,
    active: Arc<Mutex<Option<ActiveProcess>>>,
    next_run_id: AtomicU64,
}

impl Default for ChildLauncher {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE_PERIOD)
    }
}

impl ChildLauncher {
    pub fn new(grace_period: Duration) -> Self {
        Self {
            grace_period,
            active: Arc::new(Mutex::new(None)),
            next_run_id: AtomicU64::new(1),
        }
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Pid of the live process, if any.
    pub fn pid(&self) -> Option<u32> {
        lock(&self.active)
            .as_ref()
            .filter(|p| p.is_alive())
            .and_then(|p| p.pid)
    }

    async fn stop_inner(&self) {
        let (run_id, pid, alive) = {
            let mut guard = lock(&self.active);
            let Some(process) = guard.as_mut().filter(|p| p.is_alive()) else {
                debug!("stop requested but no crawler process is running");
                return;
            };
            if process.term_sent {
                debug!(run_id = process.run_id, "stop already in progress");
                return;
            }
            process.term_sent = true;
            (process.run_id, process.pid, Arc::clone(&process.alive))
        };

        info!(run_id, ?pid, "stopping crawler process");

        let signalled = pid.map(request_termination).unwrap_or(false);
        if signalled {
            tokio::time::sleep(self.grace_period).await;
        }

        if !alive.load(Ordering::SeqCst) {
            debug!(run_id, "crawler exited within grace period");
            return;
        }

        let kill = lock(&self.active)
            .as_mut()
            .filter(|p| p.run_id == run_id)
            .and_then(|p| p.kill.take());

        match kill {
            Some(kill) => {
                warn!(run_id, "crawler still alive after grace period; forcing kill");
                if kill.send(()).is_err() {
                    debug!(run_id, "exit watcher already finished while forcing kill");
                }
            }
            None => debug!(run_id, "no kill handle left; process already gone"),
        }
    }

    async fn shutdown_inner(&self) {
        self.stop_inner().await;

        let watcher = lock(&self.active).as_mut().and_then(|p| p.watcher.take());
        if let Some(watcher) = watcher {
            if let Err(e) = watcher.await {
                warn!(error = %e, "exit watcher task failed");
            }
        }
    }
}

impl ProcessLauncher for ChildLauncher {
    fn execute(
        &self,
        command: &CommandSpec,
        args: &[String],
        events: mpsc::Sender<ProcessEvent>,
    ) -> Result<()> {
        // Held until the new process is registered so two callers cannot both
        // pass the liveness check.
        let mut guard = lock(&self.active);
        if guard.as_ref().is_some_and(|p| p.is_alive()) {
            return Err(CrawlctlError::AlreadyRunning);
        }

        let run_id = self.next_run_id.fetch_add(1, Ordering::SeqCst);
        info!(run_id, cmd = %command.display_with(args), "starting crawler process");

        let mut child = command
            .to_command(args)
            .spawn()
            .map_err(|source| CrawlctlError::Launch {
                program: command.program.clone(),
                source,
            })?;

        let pid = child.id();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_line_reader(stdout, OutputStream::Stdout, events.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_line_reader(stderr, OutputStream::Stderr, events.clone()));
        }

        let alive = Arc::new(AtomicBool::new(true));
        let (kill_tx, kill_rx) = oneshot::channel::<()>();

        let watcher = tokio::spawn(watch_exit(ExitWatch {
            child,
            run_id,
            alive: Arc::clone(&alive),
            kill_rx,
            readers,
            events,
            active: Arc::clone(&self.active),
        }));

        *guard = Some(ActiveProcess {
            run_id,
            pid,
            alive,
            term_sent: false,
            kill: Some(kill_tx),
            watcher: Some(watcher),
        });

        debug!(run_id, ?pid, "crawler process registered");
        Ok(())
    }

    fn stop(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(self.stop_inner())
    }

    fn is_running(&self) -> bool {
        lock(&self.active).as_ref().is_some_and(|p| p.is_alive())
    }

    fn shutdown(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(self.shutdown_inner())
    }
}

struct ExitWatch {
    child: Child,
    run_id: u64,
    alive: Arc<AtomicBool>,
    kill_rx: oneshot::Receiver<()>,
    readers: Vec<JoinHandle<()>>,
    events: mpsc::Sender<ProcessEvent>,
    active: Arc<Mutex<Option<ActiveProcess>>>,
}

/// Block until the child exits (or is force-killed), then report it.
async fn watch_exit(watch: ExitWatch) {
    let ExitWatch {
        mut child,
        run_id,
        alive,
        mut kill_rx,
        readers,
        events,
        active,
    } = watch;

    let status = tokio::select! {
        status = child.wait() => status,
        Ok(()) = &mut kill_rx => {
            if let Err(e) = child.kill().await {
                warn!(run_id, error = %e, "failed to kill crawler process");
            }
            child.wait().await
        }
    };

    alive.store(false, Ordering::SeqCst);

    let outcome = match status {
        Ok(status) => ExitOutcome::from_status(status),
        Err(e) => ExitOutcome::WaitFailed(e.to_string()),
    };
    info!(run_id, %outcome, "crawler process exited");

    for mut reader in readers {
        if tokio::time::timeout(READER_DRAIN_TIMEOUT, &mut reader)
            .await
            .is_err()
        {
            warn!(run_id, "output reader did not drain after exit; aborting it");
            reader.abort();
        }
    }

    if events.send(ProcessEvent::Exited(outcome)).await.is_err() {
        debug!(run_id, "event receiver dropped before exit was reported");
    }

    let mut guard = lock(&active);
    if guard.as_ref().is_some_and(|p| p.run_id == run_id) {
        *guard = None;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
