// src/dag/state_manager.rs

//! Execution state tracking for a single run.
//!
//! [`ExecutionTracker`] owns the run's [`WorkflowExecution`] record. Every
//! mutation goes through [`ExecutionTracker::transition`], which refuses
//! anything but a forward move in the agent lifecycle, recomputes the
//! aggregate status and queues a full snapshot of the record. Snapshots are
//! drained by the runtime and handed to the reporter, so observers only ever
//! see whole records.

use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, warn};

use crate::dag::plan::ExecutionPlan;
use crate::errors::ExecutorError;
use crate::exec::TaskOutput;
use crate::workflow::{AgentResult, AgentStatus, FailureKind, WorkflowExecution, WorkflowStatus};

#[derive(Debug)]
pub struct ExecutionTracker {
    execution: WorkflowExecution,
    run_started: Instant,
    /// Monotonic start per agent, for durations.
    started: Vec<Option<Instant>>,
    outbox: Vec<WorkflowExecution>,
}

impl ExecutionTracker {
    /// Create the run record with every agent `pending` and queue the
    /// initial snapshot. An empty plan is terminal right away.
    pub fn new(plan: &ExecutionPlan) -> Self {
        let results = plan
            .tasks()
            .iter()
            .map(|t| AgentResult::pending(t.agent.id.clone(), t.agent.name.clone()))
            .collect::<Vec<_>>();

        let execution = WorkflowExecution {
            workflow_id: plan.workflow_id.clone(),
            workflow_name: plan.workflow_name.clone(),
            status: WorkflowStatus::from_results(&results),
            results,
            start_time: Utc::now(),
            end_time: None,
            total_duration: None,
        };

        let mut tracker = Self {
            execution,
            run_started: Instant::now(),
            started: vec![None; plan.len()],
            outbox: Vec::new(),
        };
        tracker.commit();
        tracker
    }

    pub fn execution(&self) -> &WorkflowExecution {
        &self.execution
    }

    pub fn status_of(&self, index: usize) -> Option<AgentStatus> {
        self.execution.results.get(index).map(|r| r.status)
    }

    pub fn all_terminal(&self) -> bool {
        self.execution.results.iter().all(|r| r.status.is_terminal())
    }

    /// Take the snapshots queued since the last drain, oldest first.
    pub fn drain_snapshots(&mut self) -> Vec<WorkflowExecution> {
        std::mem::take(&mut self.outbox)
    }

    pub fn mark_running(&mut self, index: usize) -> bool {
        let now = Instant::now();
        let ok = self.transition(index, AgentStatus::Running, |r| {
            r.start_time = Some(Utc::now());
        });
        if ok {
            self.started[index] = Some(now);
        }
        ok
    }

    pub fn mark_completed(&mut self, index: usize, output: TaskOutput) -> bool {
        let duration = self.elapsed_for(index);
        self.transition(index, AgentStatus::Completed, |r| {
            r.output = output.message;
            r.session_key = output.session_key;
            r.duration = duration;
            r.end_time = Some(Utc::now());
        })
    }

    pub fn mark_failed(&mut self, index: usize, error: &ExecutorError) -> bool {
        let duration = self.elapsed_for(index);
        let message = error.to_string();
        let kind = error.kind();
        self.transition(index, AgentStatus::Failed, |r| {
            r.error = Some(message);
            r.error_kind = Some(kind);
            r.duration = duration;
            r.end_time = Some(Utc::now());
        })
    }

    /// Fail a pending agent because `dependency` failed. It is never
    /// dispatched and consumes no executor time.
    pub fn mark_blocked(&mut self, index: usize, dependency: &str) -> bool {
        if self.status_of(index) != Some(AgentStatus::Pending) {
            return false;
        }
        let message = format!("blocked by failed dependency `{dependency}`");
        self.transition(index, AgentStatus::Failed, |r| {
            r.error = Some(message);
            r.error_kind = Some(FailureKind::BlockedByDependency);
            r.end_time = Some(Utc::now());
        })
    }

    /// Apply a single forward transition and queue a snapshot.
    ///
    /// Returns `false` (and leaves the record untouched) for an unknown index
    /// or a transition the lifecycle doesn't allow.
    fn transition(
        &mut self,
        index: usize,
        next: AgentStatus,
        update: impl FnOnce(&mut AgentResult),
    ) -> bool {
        let Some(result) = self.execution.results.get_mut(index) else {
            warn!(index, "state transition for unknown agent index; ignoring");
            return false;
        };

        if !result.status.can_become(next) {
            warn!(
                agent = %result.agent_id,
                from = ?result.status,
                to = ?next,
                "illegal agent state transition; ignoring"
            );
            return false;
        }

        debug!(agent = %result.agent_id, from = ?result.status, to = ?next, "agent state transition");
        result.status = next;
        update(result);
        self.commit();
        true
    }

    /// Recompute the aggregate status, stamp the run's end once it is
    /// terminal, and queue a snapshot.
    fn commit(&mut self) {
        self.execution.status = WorkflowStatus::from_results(&self.execution.results);

        if self.execution.status.is_terminal() && self.execution.end_time.is_none() {
            self.execution.end_time = Some(Utc::now());
            self.execution.total_duration = Some(self.run_started.elapsed());
        }

        self.outbox.push(self.execution.clone());
    }

    fn elapsed_for(&self, index: usize) -> Option<Duration> {
        self.started.get(index).copied().flatten().map(|s| s.elapsed())
    }
}
