// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::dag::ScheduledTask;
use crate::exec::{ActivePool, TaskExecutor};
use crate::report::Reporter;

use super::core::CoreRuntime;
use super::{CoreCommand, CoreStep, RuntimeEvent};

/// Drives one run's scheduler in response to `RuntimeEvent`s, and delegates
/// actual task execution to a `TaskExecutor`.
///
/// This is a pure IO shell around `CoreRuntime`, which contains all the
/// runtime semantics. This struct handles async IO: reading events from
/// channels, spawning task runners and publishing snapshots.
pub struct Runtime<E: TaskExecutor + ?Sized + 'static> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    pool: ActivePool<E>,
    reporter: Arc<Reporter>,
    cancel: CancellationToken,
}

impl<E: TaskExecutor + ?Sized + 'static> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("in_flight", &self.pool.len())
            .finish_non_exhaustive()
    }
}

impl<E: TaskExecutor + ?Sized + 'static> Runtime<E> {
    pub fn new(
        core: CoreRuntime,
        executor: Arc<E>,
        reporter: Arc<Reporter>,
        cancel: CancellationToken,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel::<RuntimeEvent>(64);
        Self {
            core,
            event_rx,
            pool: ActivePool::new(executor, event_tx),
            reporter,
            cancel,
        }
    }

    /// Main event loop.
    ///
    /// - Starts the run and dispatches the initial ready set.
    /// - Consumes task results and the cancellation signal.
    /// - Feeds them into the core runtime.
    /// - Executes commands returned by the core and publishes snapshots.
    pub async fn run(mut self) {
        info!(workflow = %self.core.execution().workflow_id, "agentdag runtime started");

        let step = self.core.start();
        let mut keep_running = self.apply(step);
        let mut cancel_seen = false;

        while keep_running {
            let event = tokio::select! {
                biased;

                _ = self.cancel.cancelled(), if !cancel_seen => {
                    cancel_seen = true;
                    RuntimeEvent::CancelRequested
                }

                event = self.event_rx.recv() => match event {
                    Some(e) => e,
                    None => {
                        info!("runtime event channel closed; exiting");
                        break;
                    }
                },
            };

            debug!(?event, "runtime received event");

            if let RuntimeEvent::TaskFinished { index, .. } = &event {
                self.pool.finished(*index);
            }

            // Feed the event into the pure core and get commands back.
            let step = self.core.step(event);
            keep_running = self.apply(step);
        }

        if !self.pool.is_empty() {
            self.pool.cancel_all();
        }
        self.reporter.close();
        info!("runtime exiting");
    }

    /// Publish a step's snapshots and execute its commands.
    fn apply(&mut self, step: CoreStep) -> bool {
        for snapshot in step.snapshots {
            self.reporter.publish(snapshot);
        }

        for command in step.commands {
            match command {
                CoreCommand::DispatchTasks(tasks) => self.spawn_ready(tasks),
                CoreCommand::CancelInFlight => self.pool.cancel_all(),
                CoreCommand::RequestExit => debug!("core issued RequestExit command"),
            }
        }

        step.keep_running
    }

    fn spawn_ready(&mut self, tasks: Vec<ScheduledTask>) {
        let names: Vec<_> = tasks.iter().map(|t| t.agent_id.as_str()).collect();
        debug!(?names, "spawning ready tasks");

        for task in tasks {
            self.pool.spawn(task);
        }
    }
}
