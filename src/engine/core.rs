// src/engine/core.rs

//! Pure status state machine.
//!
//! Everything that decides how the shared [`StatusRecord`] changes lives
//! here, as plain functions over a `&mut StatusRecord`. The async shell
//! ([`Orchestrator`](super::Orchestrator)) only reads events off channels,
//! takes the lock and calls into this module.
//!
//! No Tokio, no channels and no processes, so it is tested by feeding
//! synthetic events.

use crate::exec::ProcessEvent;
use crate::protocol::{self, StatusLine};
use crate::types::{RunStatus, StatusRecord};

pub const LOG_STARTING: &str = "Starting crawler process...";
pub const LOG_STOPPING: &str = "Stopping crawler (user requested)...";
pub const LOG_FINISHED: &str = "Process finished.";

/// What applying one event did to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreStep {
    pub before: RunStatus,
    pub after: RunStatus,
    /// The event carried a recognised protocol tag (or was an exit).
    pub recognised: bool,
}

impl CoreStep {
    pub fn status_changed(&self) -> bool {
        self.before != self.after
    }
}

/// Reset the record at the start of a run.
pub fn begin_run(record: &mut StatusRecord) {
    record.reset_for_run(LOG_STARTING);
}

/// Record that the OS refused to spawn the crawler.
pub fn launch_failed(record: &mut StatusRecord, cause: &str) {
    record.status = RunStatus::Failed;
    record.last_log = format!("Failed to start process: {cause}");
}

/// Record a user-initiated stop. The status is left for the exit to settle.
pub fn stop_requested(record: &mut StatusRecord) {
    record.last_log = LOG_STOPPING.to_string();
}

/// Apply one launcher event to `record`.
///
/// - stdout lines go through the full status line protocol;
/// - stderr lines only matter when they are `ERROR:` lines;
/// - an exit while still `Running` means the crawler never reported a
///   terminal status, so the record falls back to `Idle`.
pub fn apply_event(record: &mut StatusRecord, event: &ProcessEvent) -> CoreStep {
    let before = record.status;

    let recognised = match event {
        ProcessEvent::Stdout(line) => protocol::parse_and_update(line, record),
        ProcessEvent::Stderr(line) => match protocol::classify(line) {
            error @ StatusLine::Error(_) => protocol::apply(error, record),
            _ => false,
        },
        ProcessEvent::Exited(_) => {
            if record.status == RunStatus::Running {
                record.status = RunStatus::Idle;
                record.last_log = LOG_FINISHED.to_string();
            }
            true
        }
    };

    CoreStep {
        before,
        after: record.status,
        recognised,
    }
}
