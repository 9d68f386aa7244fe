use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crawlctl::errors::{CrawlctlError, Result};
use crawlctl::exec::{CommandSpec, ExitOutcome, ProcessEvent, ProcessLauncher};

/// Exit reported when a fake process is stopped (SIGTERM).
pub const STOPPED_OUTCOME: ExitOutcome = ExitOutcome::Signal(15);

#[derive(Default)]
struct FakeState {
    running: bool,
    events: Option<mpsc::Sender<ProcessEvent>>,
    launches: Vec<Vec<String>>,
    stop_calls: usize,
    spawn_error: Option<String>,
}

/// A fake launcher that:
/// - records the argument vector of every launch
/// - lets the test emit output lines and the exit by hand
/// - "terminates" immediately on stop, reporting `STOPPED_OUTCOME`.
#[derive(Clone, Default)]
pub struct FakeLauncher {
    state: Arc<Mutex<FakeState>>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every following `execute` fails as if the OS refused to spawn.
    pub fn fail_spawns(&self, message: &str) {
        self.state.lock().unwrap().spawn_error = Some(message.to_string());
    }

    pub fn allow_spawns(&self) {
        self.state.lock().unwrap().spawn_error = None;
    }

    pub fn launches(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().launches.clone()
    }

    pub fn stop_calls(&self) -> usize {
        self.state.lock().unwrap().stop_calls
    }

    pub async fn emit_stdout(&self, line: &str) {
        self.emit(ProcessEvent::Stdout(line.to_string())).await;
    }

    pub async fn emit_stderr(&self, line: &str) {
        self.emit(ProcessEvent::Stderr(line.to_string())).await;
    }

    /// End the fake process with `outcome`.
    pub async fn exit(&self, outcome: ExitOutcome) {
        let tx = {
            let mut state = self.state.lock().unwrap();
            state.running = false;
            state.events.take()
        };
        if let Some(tx) = tx {
            let _ = tx.send(ProcessEvent::Exited(outcome)).await;
        }
    }

    async fn emit(&self, event: ProcessEvent) {
        let tx = self
            .state
            .lock()
            .unwrap()
            .events
            .clone()
            .expect("no fake process running");
        tx.send(event).await.expect("orchestrator dropped events");
    }
}

impl ProcessLauncher for FakeLauncher {
    fn execute(
        &self,
        command: &CommandSpec,
        args: &[String],
        events: mpsc::Sender<ProcessEvent>,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.running {
            return Err(CrawlctlError::AlreadyRunning);
        }
        if let Some(message) = &state.spawn_error {
            return Err(CrawlctlError::Launch {
                program: command.program.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, message.clone()),
            });
        }

        state.running = true;
        state.events = Some(events);
        state.launches.push(args.to_vec());
        Ok(())
    }

    fn stop(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            let running = {
                let mut state = self.state.lock().unwrap();
                state.stop_calls += 1;
                state.running
            };
            if running {
                self.exit(STOPPED_OUTCOME).await;
            }
        })
    }

    fn is_running(&self) -> bool {
        self.state.lock().unwrap().running
    }

    fn shutdown(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            if self.is_running() {
                self.exit(STOPPED_OUTCOME).await;
            }
            self.state.lock().unwrap().events = None;
        })
    }
}
