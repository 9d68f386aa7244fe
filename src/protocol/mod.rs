// src/protocol/mod.rs

//! Status line protocol spoken by the crawler on its output streams.
//!
//! One record per line:
//!
//! | line              | meaning                        |
//! |-------------------|--------------------------------|
//! | `STATUS:START`    | run has begun                  |
//! | `STATUS:COMPLETE` | run finished successfully      |
//! | `PROGRESS:<int>`  | progress percentage            |
//! | `ERROR:<message>` | fatal error, the run is failing|
//! | anything else     | informational log line         |
//!
//! [`parser`] turns a line into a [`StatusLine`] and applies it to a
//! [`StatusRecord`](crate::types::StatusRecord).

pub mod parser;

pub use parser::{apply, classify, parse_and_update};

pub const PREFIX_STATUS_START: &str = "STATUS:START";
pub const PREFIX_STATUS_COMPLETE: &str = "STATUS:COMPLETE";
pub const PREFIX_PROGRESS: &str = "PROGRESS:";
pub const PREFIX_ERROR: &str = "ERROR:";

/// A classified output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLine<'a> {
    Start,
    Complete,
    /// `None` when the value after `PROGRESS:` is not an integer.
    Progress(Option<i64>),
    Error(&'a str),
    Info(&'a str),
    /// Empty line; carries nothing.
    Blank,
}

impl StatusLine<'_> {
    /// Whether the line carried one of the protocol prefixes.
    pub fn is_tagged(&self) -> bool {
        !matches!(self, StatusLine::Info(_) | StatusLine::Blank)
    }
}
