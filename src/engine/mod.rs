// src/engine/mod.rs

//! Orchestration engine for agentdag.
//!
//! This module ties together:
//! - the DAG scheduler
//! - the pool of in-flight agent tasks
//! - the reporter that observers subscribe to
//! - the runtime event loop that reacts to:
//!   - task results
//!   - cancellation requests
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`]. [`handle`] holds the public surface callers
//! use: [`Engine::submit`], [`ExecutionHandle::subscribe`] and
//! [`ExecutionHandle::cancel`].

use crate::exec::TaskOutcome;

/// Events flowing into the runtime from task runners and the caller.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A dispatched task resolved (successfully or not).
    TaskFinished { index: usize, outcome: TaskOutcome },
    /// The caller asked to cancel the run.
    CancelRequested,
}

pub mod core;
pub mod event_handlers;
pub mod handle;
pub mod runtime;

pub use self::core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use handle::{Engine, ExecutionHandle};
pub use runtime::Runtime;
