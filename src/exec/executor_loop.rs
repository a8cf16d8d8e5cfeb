// src/exec/executor_loop.rs

//! Pool of in-flight agent tasks.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::exec::backend::TaskExecutor;
use crate::exec::task_runner::run_task;

/// Internal handle for a currently-running agent task.
///
/// - `cancel` is used to request that the call be abandoned.
/// - `handle` is the Tokio task that is actually running it.
struct ActiveTask {
    cancel: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<()>,
}

/// Spawns each dispatched task on its own Tokio task and keeps a cancel
/// handle per task index until the runtime sees it finish.
pub struct ActivePool<E: TaskExecutor + ?Sized> {
    executor: Arc<E>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    active: HashMap<usize, ActiveTask>,
}

impl<E: TaskExecutor + ?Sized + 'static> ActivePool<E> {
    pub fn new(executor: Arc<E>, runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self {
            executor,
            runtime_tx,
            active: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn spawn(&mut self, task: ScheduledTask) {
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let executor = Arc::clone(&self.executor);
        let rt_tx = self.runtime_tx.clone();
        let index = task.index;
        let agent = task.agent_id.clone();

        let handle = tokio::spawn(async move {
            run_task(executor, task, rt_tx, cancel_rx).await;
            debug!(agent = %agent, "task runner future finished");
        });

        self.active.insert(
            index,
            ActiveTask {
                cancel: Some(cancel_tx),
                handle,
            },
        );
    }

    /// Forget a task whose result the runtime has received.
    pub fn finished(&mut self, index: usize) {
        self.active.remove(&index);
    }

    /// Best-effort cancellation of everything in flight.
    pub fn cancel_all(&mut self) {
        for (index, mut task) in self.active.drain() {
            if task.handle.is_finished() {
                continue;
            }
            info!(index, "cancelling in-flight agent task");
            if let Some(cancel) = task.cancel.take() {
                if cancel.send(()).is_err() {
                    debug!(index, "task already finished while cancelling");
                }
            }
        }
    }
}
