// src/engine/mod.rs

//! Orchestration engine for crawlctl.
//!
//! This module ties together:
//! - the process launcher (see [`crate::exec`])
//! - the status line protocol (see [`crate::protocol`])
//! - the single shared status record callers poll
//!
//! The pure state machine lives in [`core`]; the async shell that owns the
//! record, guards against concurrent starts and pumps launcher events is
//! [`orchestrator`].

pub mod core;
pub mod orchestrator;

pub use core::{CoreStep, apply_event};
pub use orchestrator::Orchestrator;
