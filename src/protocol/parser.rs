// src/protocol/parser.rs

//! Classification of crawler output lines and the record updates they cause.

use tracing::debug;

use crate::protocol::{
    PREFIX_ERROR, PREFIX_PROGRESS, PREFIX_STATUS_COMPLETE, PREFIX_STATUS_START, StatusLine,
};
use crate::types::{RunStatus, StatusRecord};

/// Classify one line. Prefixes are checked in protocol priority order.
pub fn classify(line: &str) -> StatusLine<'_> {
    if line.is_empty() {
        return StatusLine::Blank;
    }

    if line.starts_with(PREFIX_STATUS_START) {
        return StatusLine::Start;
    }

    if line.starts_with(PREFIX_STATUS_COMPLETE) {
        return StatusLine::Complete;
    }

    if let Some(rest) = line.strip_prefix(PREFIX_PROGRESS) {
        // `PROGRESS:42` and `PROGRESS: 42:extra` both carry 42.
        let value = rest.split(':').next().unwrap_or_default().trim();
        return StatusLine::Progress(value.parse::<i64>().ok());
    }

    if line.starts_with(PREFIX_ERROR) {
        return StatusLine::Error(line);
    }

    StatusLine::Info(line)
}

/// Apply a classified line to `record`.
///
/// Returns `true` when the line carried a protocol tag. Terminal and progress
/// lines leave `last_log` alone; errors and plain lines replace it. Progress
/// is frozen once the run reached `Completed` or `Failed`.
pub fn apply(line: StatusLine<'_>, record: &mut StatusRecord) -> bool {
    match line {
        StatusLine::Start => {
            record.status = RunStatus::Running;
        }
        StatusLine::Complete => {
            record.status = RunStatus::Completed;
            record.progress = 100;
        }
        StatusLine::Progress(Some(value)) => {
            let value = value.clamp(0, 100) as u8;
            if record.status.is_terminal() {
                debug!(
                    status = %record.status,
                    reported = value,
                    "ignoring progress after terminal status"
                );
            } else if record.status == RunStatus::Running && value < record.progress {
                debug!(
                    current = record.progress,
                    reported = value,
                    "ignoring progress regression during run"
                );
            } else {
                record.progress = value;
            }
        }
        StatusLine::Progress(None) => {
            debug!("ignoring malformed progress line");
        }
        StatusLine::Error(line) => {
            record.status = RunStatus::Failed;
            record.last_log = line.to_string();
        }
        StatusLine::Info(line) => {
            record.last_log = line.to_string();
        }
        StatusLine::Blank => {}
    }

    line.is_tagged()
}

/// Classify `line` and apply it to `record` in one step.
pub fn parse_and_update(line: &str, record: &mut StatusRecord) -> bool {
    apply(classify(line), record)
}
