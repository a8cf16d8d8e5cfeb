// src/dag/mod.rs

//! DAG representation and scheduling.
//!
//! - [`graph`] validates the agents' dependency edges and holds the graph.
//! - [`plan`] turns a workflow into an [`ExecutionPlan`].
//! - [`scheduler`] contains the per-run state machine that decides which
//!   agents are ready to run and fails the dependents of failed agents.
//! - [`state_manager`] owns the run record and its state transitions.
//! - [`task_info`] describes dispatched tasks.
//! - [`scheduler_step`] defines the result type for scheduler steps.

pub mod graph;
pub mod plan;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod task_info;

pub use graph::DagGraph;
pub use plan::{ExecutionPlan, PlannedTask, validate};
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use state_manager::ExecutionTracker;
pub use task_info::ScheduledTask;
