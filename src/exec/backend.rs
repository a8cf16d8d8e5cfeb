// src/exec/backend.rs

//! Pluggable executor abstraction.
//!
//! The runtime talks to a `TaskExecutor` instead of the agent backend
//! directly. This makes it easy to swap in a scripted executor in tests while
//! keeping the production HTTP implementation in [`super::gateway`].
//!
//! One `execute` call creates one external session. Executors never retry;
//! each agent is attempted exactly once per run.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dag::ScheduledTask;
use crate::errors::ExecutorError;
use crate::workflow::AgentId;

/// Input for one agent invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRequest {
    pub agent_id: AgentId,
    pub label: String,
    pub prompt: String,
    pub timeout: Duration,
}

impl From<&ScheduledTask> for TaskRequest {
    fn from(task: &ScheduledTask) -> Self {
        Self {
            agent_id: task.agent_id.clone(),
            label: task.label.clone(),
            prompt: task.prompt.clone(),
            timeout: task.timeout,
        }
    }
}

/// Successful result of an agent invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOutput {
    #[serde(default)]
    pub session_key: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl TaskOutput {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            session_key: None,
            message: Some(message.into()),
        }
    }
}

/// Outcome of one dispatched task, as fed back to the scheduler.
pub type TaskOutcome = Result<TaskOutput, ExecutorError>;

/// Boxed future returned by [`TaskExecutor::execute`].
pub type ExecuteFuture<'a> = Pin<Box<dyn Future<Output = TaskOutcome> + Send + 'a>>;

/// Trait abstracting how a single agent task is run.
///
/// Production code uses [`super::GatewayExecutor`]; tests provide their own
/// implementation that doesn't talk to a backend.
///
/// Implementations may enforce `request.timeout` themselves, but don't have
/// to: the engine always wraps calls in [`execute_with_timeout`].
pub trait TaskExecutor: Send + Sync {
    fn execute(&self, request: TaskRequest) -> ExecuteFuture<'_>;
}

impl<T: TaskExecutor + ?Sized> TaskExecutor for std::sync::Arc<T> {
    fn execute(&self, request: TaskRequest) -> ExecuteFuture<'_> {
        (**self).execute(request)
    }
}

/// Run `request` on `executor`, reporting `ExecutorError::Timeout` if it
/// doesn't resolve within `request.timeout`.
pub async fn execute_with_timeout<E: TaskExecutor + ?Sized>(
    executor: &E,
    request: TaskRequest,
) -> TaskOutcome {
    let timeout = request.timeout;
    let agent = request.agent_id.clone();

    match tokio::time::timeout(timeout, executor.execute(request)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            debug!(agent = %agent, timeout_ms = timeout.as_millis() as u64, "executor call timed out");
            Err(ExecutorError::Timeout(timeout))
        }
    }
}
