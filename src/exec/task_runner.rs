// src/exec/task_runner.rs

//! Individual task runner.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::errors::ExecutorError;
use crate::exec::backend::{TaskExecutor, TaskOutcome, TaskRequest, execute_with_timeout};

/// Run a single agent task and emit `TaskFinished` with its outcome.
///
/// - The call is bounded by the task's timeout.
/// - A panicking executor is reported as `ExecutorError::Panicked`, so the
///   agent still fails and the run can finish.
/// - If the cancel channel fires, the in-flight call is dropped and **no**
///   `TaskFinished` event is sent; the scheduler has already failed the
///   agent as cancelled. Whether the external session stops is up to the
///   backend.
pub async fn run_task<E: TaskExecutor + ?Sized>(
    executor: Arc<E>,
    task: ScheduledTask,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    mut cancel_rx: oneshot::Receiver<()>,
) {
    info!(
        agent = %task.agent_id,
        label = %task.label,
        timeout_ms = task.timeout.as_millis() as u64,
        "starting agent task"
    );

    let request = TaskRequest::from(&task);

    let call = AssertUnwindSafe(execute_with_timeout(executor.as_ref(), request)).catch_unwind();

    tokio::select! {
        result = call => {
            let outcome: TaskOutcome = match result {
                Ok(outcome) => outcome,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    error!(agent = %task.agent_id, panic = %message, "executor panicked");
                    Err(ExecutorError::Panicked(message))
                }
            };
            match &outcome {
                Ok(_) => info!(agent = %task.agent_id, "agent task succeeded"),
                Err(err) => info!(agent = %task.agent_id, error = %err, "agent task failed"),
            }

            let event = RuntimeEvent::TaskFinished { index: task.index, outcome };
            if runtime_tx.send(event).await.is_err() {
                warn!(agent = %task.agent_id, "runtime gone before task result could be delivered");
            }
        }

        cancel = &mut cancel_rx => {
            match cancel {
                Ok(()) => info!(
                    agent = %task.agent_id,
                    "cancellation requested for running agent task; abandoning call"
                ),
                Err(e) => debug!(
                    agent = %task.agent_id,
                    error = %e,
                    "cancel channel closed without explicit cancellation"
                ),
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
