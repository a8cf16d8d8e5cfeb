// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::info;

use crate::dag::{ScheduledTask, Scheduler, SchedulerStep};
use crate::exec::TaskOutcome;
use crate::workflow::WorkflowExecution;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Hand these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// Abandon every in-flight executor call.
    CancelInFlight,
    /// The run is over; the shell should stop.
    RequestExit,
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Snapshots produced while handling the event, oldest first.
    pub snapshots: Vec<WorkflowExecution>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

/// Seed the run with its initial ready set.
pub fn handle_start(scheduler: &mut Scheduler) -> CoreStep {
    let step = scheduler.start();
    finish_step(scheduler, step, Vec::new())
}

/// Handle a result from a dispatched task.
pub fn handle_task_finished(
    scheduler: &mut Scheduler,
    index: usize,
    outcome: TaskOutcome,
) -> CoreStep {
    let step = scheduler.step_completion(index, outcome);
    finish_step(scheduler, step, Vec::new())
}

/// Handle a cancellation request: fail everything outstanding and abandon
/// in-flight calls.
pub fn handle_cancel(scheduler: &mut Scheduler) -> CoreStep {
    let in_flight = scheduler.in_flight();
    let step = scheduler.step_cancel();

    let mut commands = Vec::new();
    if in_flight > 0 {
        commands.push(CoreCommand::CancelInFlight);
    }
    finish_step(scheduler, step, commands)
}

/// Turn a scheduler step into shell commands, collecting snapshots and
/// deciding whether the loop continues.
fn finish_step(
    scheduler: &mut Scheduler,
    step: SchedulerStep,
    mut commands: Vec<CoreCommand>,
) -> CoreStep {
    if !step.newly_scheduled.is_empty() {
        commands.push(CoreCommand::DispatchTasks(step.newly_scheduled));
    }

    let keep_running = !scheduler.is_finished();
    if !keep_running {
        info!(
            workflow = %scheduler.execution().workflow_id,
            status = ?scheduler.execution().status,
            "run finished"
        );
        commands.push(CoreCommand::RequestExit);
    }

    CoreStep {
        commands,
        snapshots: scheduler.drain_snapshots(),
        keep_running,
    }
}
