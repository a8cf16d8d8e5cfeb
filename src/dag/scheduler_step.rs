// src/dag/scheduler_step.rs

//! Step-by-step execution result types for the scheduler.

use crate::dag::task_info::ScheduledTask;
use crate::workflow::AgentId;

/// Structured result of a single scheduler "step".
///
/// The async runtime only needs `newly_scheduled`; tests use the rest to make
/// assertions about what changed.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Tasks that were marked running in this step and must be dispatched.
    pub newly_scheduled: Vec<ScheduledTask>,
    /// Agents newly marked failed in this step (the failed task itself, any
    /// dependents blocked by it, or everything cut short by cancellation).
    pub newly_failed: Vec<AgentId>,
    /// Whether this step resolved the last outstanding agent.
    pub run_just_finished: bool,
}
