// src/workflow/mod.rs

//! Workflow data model.
//!
//! - [`task`] holds the caller-owned definitions ([`Workflow`], [`AgentTask`]).
//! - [`execution`] holds the per-run records ([`WorkflowExecution`],
//!   [`AgentResult`]) and the status enums whose transitions the engine
//!   drives.
//!
//! Everything here serializes to the camelCase JSON shape the editor and
//! run monitors exchange (`workflowId`, `dependsOn`, `totalDuration`, ...).

pub mod execution;
pub mod task;

/// Canonical agent identifier type used throughout the engine.
pub type AgentId = String;

pub use execution::{AgentResult, AgentStatus, FailureKind, WorkflowExecution, WorkflowStatus};
pub use task::{AgentTask, OutputKind, Workflow, DEFAULT_AGENT_TIMEOUT};
