// src/errors.rs

//! Crate-wide error types.
//!
//! - [`ValidationError`] refuses a whole run before anything is dispatched.
//! - [`ExecutorError`] is raised per task by a [`crate::exec::TaskExecutor`]
//!   and is captured into that task's `AgentResult`; it never escapes a run.
//! - [`AgentdagError`] covers everything around the engine (config files,
//!   IO, parsing) plus validation failures surfaced to the CLI.

use std::time::Duration;

use thiserror::Error;

use crate::workflow::{AgentId, FailureKind};

/// Reasons a workflow is refused before any task is dispatched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("duplicate agent id '{0}'")]
    DuplicateAgentId(AgentId),

    #[error("agent '{agent}' depends on unknown agent '{dependency}'")]
    UnknownDependency { agent: AgentId, dependency: AgentId },

    /// Ids on the first cycle found, in traversal order. A self-loop is a
    /// cycle of length one.
    #[error("cycle detected in agent graph: {}", format_cycle(.0))]
    CycleDetected(Vec<AgentId>),

    #[error("agent '{0}' has an empty prompt")]
    EmptyPrompt(AgentId),

    #[error("agent '{0}' has a zero timeout")]
    InvalidTimeout(AgentId),
}

fn format_cycle(ids: &[AgentId]) -> String {
    let mut path = ids.join(" -> ");
    if let Some(first) = ids.first() {
        path.push_str(" -> ");
        path.push_str(first);
    }
    path
}

/// Failure of a single task invocation against the agent backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("backend returned {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    /// In-band error reported by the backend in an otherwise successful
    /// response. Displayed verbatim.
    #[error("{0}")]
    Rejected(String),

    #[error("cancelled")]
    Cancelled,

    /// The executor panicked while running the task.
    #[error("executor panicked: {0}")]
    Panicked(String),
}

impl ExecutorError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ExecutorError::Timeout(_) => FailureKind::Timeout,
            ExecutorError::Backend { .. } => FailureKind::Backend,
            ExecutorError::Transport(_) => FailureKind::Transport,
            ExecutorError::Rejected(_) => FailureKind::Rejected,
            ExecutorError::Cancelled => FailureKind::Cancelled,
            ExecutorError::Panicked(_) => FailureKind::Panicked,
        }
    }
}

impl From<reqwest::Error> for ExecutorError {
    fn from(err: reqwest::Error) -> Self {
        ExecutorError::Transport(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum AgentdagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid workflow: {0}")]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, AgentdagError>;
