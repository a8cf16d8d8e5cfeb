// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - the snapshots produced by that update
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - spawning dispatched tasks and cancelling them
//! - handing snapshots to the reporter
//!
//! The core is intended to be unit tested without any Tokio, channels or
//! network.

use crate::dag::Scheduler;
use crate::engine::RuntimeEvent;
use crate::engine::event_handlers::{CoreStep, handle_cancel, handle_start, handle_task_finished};
use crate::workflow::WorkflowExecution;

/// Pure core runtime state.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
}

impl CoreRuntime {
    pub fn new(scheduler: Scheduler) -> Self {
        Self { scheduler }
    }

    /// Whether every agent has reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.scheduler.is_finished()
    }

    pub fn execution(&self) -> &WorkflowExecution {
        self.scheduler.execution()
    }

    /// Begin the run. Must be called once, before any `step`.
    pub fn start(&mut self) -> CoreStep {
        handle_start(&mut self.scheduler)
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskFinished { index, outcome } => {
                handle_task_finished(&mut self.scheduler, index, outcome)
            }
            RuntimeEvent::CancelRequested => handle_cancel(&mut self.scheduler),
        }
    }
}
