use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::dag::plan::ExecutionPlan;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::ExecutionTracker;
use crate::dag::task_info::ScheduledTask;
use crate::errors::ExecutorError;
use crate::exec::TaskOutcome;
use crate::types::DispatchPolicy;
use crate::workflow::{AgentId, AgentStatus, WorkflowExecution};

/// Scheduler holds the immutable plan plus the run's mutable state.
///
/// It is responsible for:
/// - deciding which pending agents are ready (all dependencies completed)
/// - handing ready agents out under the dispatch policy's concurrency limit
/// - recording completions and failures
/// - failing dependents of a failed agent without dispatching them
/// - cutting the run short on cancellation
///
/// It performs no IO; the async runtime feeds it completions and dispatches
/// whatever it returns.
#[derive(Debug)]
pub struct Scheduler {
    plan: ExecutionPlan,
    tracker: ExecutionTracker,
    policy: DispatchPolicy,
    /// Maximum number of agents in `running` at once.
    max_in_flight: usize,
    in_flight: usize,
    started: bool,
    cancelled: bool,
}

impl Scheduler {
    /// Create a scheduler for `plan`. `max_concurrency` only applies to the
    /// parallel policy and is clamped to at least 1.
    pub fn new(plan: ExecutionPlan, policy: DispatchPolicy, max_concurrency: usize) -> Self {
        let max_in_flight = match policy {
            DispatchPolicy::Sequential => 1,
            DispatchPolicy::Parallel => max_concurrency.max(1),
        };
        let tracker = ExecutionTracker::new(&plan);

        Self {
            plan,
            tracker,
            policy,
            max_in_flight,
            in_flight: 0,
            started: false,
            cancelled: false,
        }
    }

    pub fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }

    /// Current run record.
    pub fn execution(&self) -> &WorkflowExecution {
        self.tracker.execution()
    }

    /// Snapshots produced since the last call, oldest first.
    pub fn drain_snapshots(&mut self) -> Vec<WorkflowExecution> {
        self.tracker.drain_snapshots()
    }

    /// Returns `true` once every agent is terminal.
    pub fn is_finished(&self) -> bool {
        self.tracker.all_terminal()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn status_of(&self, agent_id: &str) -> Option<AgentStatus> {
        let index = self.plan.index_of(agent_id)?;
        self.tracker.status_of(index)
    }

    /// Whether every dependency of `agent_id` has completed.
    ///
    /// Returns `None` if the agent is unknown.
    pub fn deps_satisfied(&self, agent_id: &str) -> Option<bool> {
        let index = self.plan.index_of(agent_id)?;
        Some(self.deps_completed(index))
    }

    /// Pending agents whose dependencies have all completed, in declared order.
    pub fn ready_tasks(&self) -> Vec<AgentId> {
        self.ready_indices()
            .into_iter()
            .map(|i| self.plan.tasks()[i].agent.id.clone())
            .collect()
    }

    /// Begin the run: dispatch the initial ready set.
    pub fn start(&mut self) -> SchedulerStep {
        if self.started {
            warn!("scheduler: start called twice; ignoring");
            return SchedulerStep::default();
        }
        self.started = true;

        info!(
            workflow = %self.plan.workflow_id,
            agents = self.plan.len(),
            policy = ?self.policy,
            max_in_flight = self.max_in_flight,
            "scheduler: starting run"
        );

        let newly_scheduled = self.dispatch_ready();
        SchedulerStep {
            newly_scheduled,
            newly_failed: Vec::new(),
            run_just_finished: self.is_finished(),
        }
    }

    /// Record the outcome of a dispatched agent and dispatch whatever became
    /// ready as a result.
    pub fn step_completion(&mut self, index: usize, outcome: TaskOutcome) -> SchedulerStep {
        let was_finished = self.is_finished();

        if self.tracker.status_of(index) != Some(AgentStatus::Running) {
            warn!(
                index,
                status = ?self.tracker.status_of(index),
                "completion for agent that is not running; ignoring"
            );
            return SchedulerStep::default();
        }
        self.in_flight = self.in_flight.saturating_sub(1);

        let agent_id = self.plan.tasks()[index].agent.id.clone();
        let mut newly_failed = Vec::new();

        match outcome {
            Ok(output) => {
                debug!(agent = %agent_id, "agent completed successfully");
                self.tracker.mark_completed(index, output);
            }
            Err(err) => {
                warn!(agent = %agent_id, error = %err, "agent failed; blocking dependents");
                self.tracker.mark_failed(index, &err);
                newly_failed.push(agent_id);
                newly_failed.extend(self.block_dependents(index));
            }
        }

        let newly_scheduled = if self.cancelled {
            Vec::new()
        } else {
            self.dispatch_ready()
        };

        SchedulerStep {
            newly_scheduled,
            newly_failed,
            run_just_finished: !was_finished && self.is_finished(),
        }
    }

    /// Cancel the run: every agent still `pending` or `running` is failed
    /// with a cancellation error and nothing further is dispatched.
    pub fn step_cancel(&mut self) -> SchedulerStep {
        let was_finished = self.is_finished();
        self.cancelled = true;

        let mut newly_failed = Vec::new();
        for task in self.plan.tasks() {
            let status = self.tracker.status_of(task.index);
            if matches!(status, Some(AgentStatus::Pending) | Some(AgentStatus::Running))
                && self.tracker.mark_failed(task.index, &ExecutorError::Cancelled)
            {
                newly_failed.push(task.agent.id.clone());
            }
        }
        self.in_flight = 0;

        if !newly_failed.is_empty() {
            info!(cancelled = ?newly_failed, "scheduler: run cancelled");
        }

        SchedulerStep {
            newly_scheduled: Vec::new(),
            newly_failed,
            run_just_finished: !was_finished && self.is_finished(),
        }
    }

    /// Mark ready agents `running`, up to the free concurrency slots, and
    /// return them as `ScheduledTask`s.
    fn dispatch_ready(&mut self) -> Vec<ScheduledTask> {
        let free = self.max_in_flight.saturating_sub(self.in_flight);
        let mut scheduled = Vec::new();

        for index in self.ready_indices().into_iter().take(free) {
            if self.tracker.mark_running(index) {
                let task = &self.plan.tasks()[index];
                info!(agent = %task.agent.id, name = %task.agent.name, "dispatching agent");
                self.in_flight += 1;
                scheduled.push(ScheduledTask::from_planned(task));
            }
        }

        if scheduled.is_empty() && self.in_flight == 0 && !self.is_finished() {
            // Acyclic plans always make progress; reaching here means the
            // tracker and plan disagree.
            warn!("scheduler: nothing running and nothing ready, but run not finished");
        }

        scheduled
    }

    fn ready_indices(&self) -> Vec<usize> {
        self.plan
            .tasks()
            .iter()
            .filter(|t| self.tracker.status_of(t.index) == Some(AgentStatus::Pending))
            .filter(|t| self.deps_completed(t.index))
            .map(|t| t.index)
            .collect()
    }

    fn deps_completed(&self, index: usize) -> bool {
        self.plan.tasks()[index]
            .deps
            .iter()
            .all(|&d| self.tracker.status_of(d) == Some(AgentStatus::Completed))
    }

    /// Fail every pending agent downstream of `failed`, breadth-first so that
    /// each is blamed on the nearest failed dependency.
    fn block_dependents(&mut self, failed: usize) -> Vec<AgentId> {
        let mut queue: VecDeque<usize> = VecDeque::from([failed]);
        let mut newly_failed = Vec::new();

        while let Some(current) = queue.pop_front() {
            let culprit = self.plan.tasks()[current].agent.id.clone();
            let dependents = self.plan.tasks()[current].dependents.clone();

            for dep in dependents {
                if self.tracker.mark_blocked(dep, &culprit) {
                    let blocked = &self.plan.tasks()[dep].agent.id;
                    debug!(agent = %blocked, dependency = %culprit, "blocked by failed dependency");
                    newly_failed.push(blocked.clone());
                    queue.push_back(dep);
                }
            }
        }

        newly_failed
    }
}
