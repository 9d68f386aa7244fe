// src/exec/terminate.rs

//! Graceful termination of the crawler process.

use tracing::{debug, warn};

/// Ask the process with `pid` to terminate (SIGTERM).
///
/// Returns `false` when no graceful signal could be delivered; the caller
/// then goes straight to a forced kill.
#[cfg(unix)]
pub fn request_termination(pid: u32) -> bool {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        warn!(pid, "pid out of range; cannot signal");
        return false;
    };

    match kill(Pid::from_raw(raw), Signal::SIGTERM) {
        Ok(()) => {
            debug!(pid, "sent SIGTERM");
            true
        }
        Err(e) => {
            warn!(pid, error = %e, "failed to send SIGTERM");
            false
        }
    }
}

/// No graceful signal exists here; the launcher falls back to a forced kill.
#[cfg(not(unix))]
pub fn request_termination(pid: u32) -> bool {
    debug!(pid, "graceful termination unsupported on this platform");
    false
}
