// src/engine/handle.rs

//! Public entry points: submit a workflow, follow its run, cancel it.

use std::sync::Arc;

use anyhow::{Context, anyhow};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::dag::{ExecutionPlan, Scheduler};
use crate::engine::{CoreRuntime, Runtime};
use crate::errors::{Result, ValidationError};
use crate::exec::TaskExecutor;
use crate::report::{Reporter, Subscription};
use crate::workflow::{Workflow, WorkflowExecution};

/// Runs workflows against a shared executor.
pub struct Engine<E: TaskExecutor + ?Sized + 'static> {
    executor: Arc<E>,
    config: EngineConfig,
}

impl<E: TaskExecutor + 'static> Engine<E> {
    pub fn new(executor: E, config: EngineConfig) -> Self {
        Self::from_arc(Arc::new(executor), config)
    }
}

impl<E: TaskExecutor + ?Sized + 'static> Engine<E> {
    pub fn from_arc(executor: Arc<E>, config: EngineConfig) -> Self {
        Self { executor, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate `workflow` and start running it.
    ///
    /// Fails fast, before anything is dispatched, on a cycle, a dangling
    /// dependency, a duplicate id, an empty prompt or a zero timeout. Must be
    /// called from within a Tokio runtime.
    pub fn submit(&self, workflow: &Workflow) -> std::result::Result<ExecutionHandle, ValidationError> {
        let plan = ExecutionPlan::build(workflow).inspect_err(|err| {
            warn!(workflow = %workflow.id, error = %err, "workflow refused");
        })?;
        Ok(self.run_plan(plan))
    }

    /// Start running an already validated plan.
    pub fn run_plan(&self, plan: ExecutionPlan) -> ExecutionHandle {
        let workflow_id = plan.workflow_id.clone();
        info!(
            workflow = %workflow_id,
            agents = plan.len(),
            policy = ?self.config.policy,
            max_concurrency = self.config.max_concurrency,
            "submitting workflow run"
        );

        let scheduler = Scheduler::new(plan, self.config.policy, self.config.max_concurrency);
        let reporter = Reporter::new();
        let cancel = CancellationToken::new();

        let runtime = Runtime::new(
            CoreRuntime::new(scheduler),
            Arc::clone(&self.executor),
            Arc::clone(&reporter),
            cancel.clone(),
        );
        let join = tokio::spawn(runtime.run());

        ExecutionHandle {
            workflow_id,
            reporter,
            cancel,
            join,
        }
    }
}

/// Handle to one running (or finished) workflow run.
#[derive(Debug)]
pub struct ExecutionHandle {
    workflow_id: String,
    reporter: Arc<Reporter>,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl ExecutionHandle {
    pub fn workflow_id(&self) -> &str {
        &self.workflow_id
    }

    /// Follow the run from its first snapshot to its terminal one.
    pub fn subscribe(&self) -> Subscription {
        self.reporter.subscribe()
    }

    /// Follow the run from its current snapshot onwards.
    pub fn subscribe_latest(&self) -> Subscription {
        self.reporter.subscribe_latest()
    }

    pub fn latest(&self) -> Option<Arc<WorkflowExecution>> {
        self.reporter.latest()
    }

    pub fn is_finished(&self) -> bool {
        self.reporter.is_finished()
    }

    /// Request best-effort cancellation. Agents not yet finished are failed
    /// as cancelled; in-flight backend sessions may keep running.
    pub fn cancel(&self) {
        info!(workflow = %self.workflow_id, "cancellation requested");
        self.cancel.cancel();
    }

    /// A token that cancels this run when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the run to end and return its terminal record.
    pub async fn wait(self) -> Result<WorkflowExecution> {
        self.join.await.context("execution runtime task failed")?;

        let last = self
            .reporter
            .latest()
            .ok_or_else(|| anyhow!("run for workflow '{}' published no snapshot", self.workflow_id))?;

        if !last.is_terminal() {
            return Err(anyhow!(
                "run for workflow '{}' ended without reaching a terminal status",
                self.workflow_id
            )
            .into());
        }
        Ok((*last).clone())
    }
}
