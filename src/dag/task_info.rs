// src/dag/task_info.rs

//! Description of a task the scheduler has just dispatched.

use std::time::Duration;

use crate::dag::plan::PlannedTask;
use crate::workflow::AgentId;

/// A task the scheduler wants the executor to run now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    /// Position in the plan; completions are reported against it.
    pub index: usize,
    pub agent_id: AgentId,
    /// Label for the backend session. The agent's name.
    pub label: String,
    pub prompt: String,
    pub timeout: Duration,
}

impl ScheduledTask {
    pub fn from_planned(task: &PlannedTask) -> Self {
        Self {
            index: task.index,
            agent_id: task.agent.id.clone(),
            label: task.agent.name.clone(),
            prompt: task.agent.prompt.clone(),
            timeout: task.agent.timeout,
        }
    }
}
