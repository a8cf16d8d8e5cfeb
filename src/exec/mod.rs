// src/exec/mod.rs

//! Task execution layer.
//!
//! This module is responsible for actually running agent tasks against the
//! external backend and reporting back to the orchestration runtime via
//! `RuntimeEvent`s.
//!
//! - [`backend`] provides the `TaskExecutor` trait, its request/response
//!   types and the timeout boundary every call goes through.
//! - [`gateway`] is the production executor, talking HTTP to the agent
//!   gateway.
//! - [`executor_loop`] owns the pool of in-flight tasks and their cancel
//!   handles.
//! - [`task_runner`] runs one task and emits its outcome.

pub mod backend;
pub mod executor_loop;
pub mod gateway;
pub mod task_runner;

pub use backend::{
    ExecuteFuture, TaskExecutor, TaskOutcome, TaskOutput, TaskRequest, execute_with_timeout,
};
pub use executor_loop::ActivePool;
pub use gateway::GatewayExecutor;
