use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AgentId;

/// Per-agent lifecycle: `pending -> running -> {completed | failed}`.
///
/// A pending agent may also go straight to `failed` when it is blocked by a
/// failed dependency or the run is cancelled; it is never dispatched then.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl AgentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, AgentStatus::Completed | AgentStatus::Failed)
    }

    /// Whether `self -> next` is a legal forward transition.
    pub fn can_become(self, next: AgentStatus) -> bool {
        matches!(
            (self, next),
            (AgentStatus::Pending, AgentStatus::Running)
                | (AgentStatus::Pending, AgentStatus::Failed)
                | (AgentStatus::Running, AgentStatus::Completed)
                | (AgentStatus::Running, AgentStatus::Failed)
        )
    }
}

/// Aggregate run status. Always derived from the agent results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Running,
    Completed,
    Failed,
    Partial,
}

impl WorkflowStatus {
    /// Derive the aggregate status from the multiset of agent statuses.
    ///
    /// - any `pending`/`running` -> `Running`
    /// - empty, or all `completed` -> `Completed`
    /// - all `failed` -> `Failed`
    /// - a mix of `completed` and `failed` -> `Partial`
    pub fn from_results(results: &[AgentResult]) -> Self {
        let mut completed = 0usize;
        let mut failed = 0usize;

        for result in results {
            match result.status {
                AgentStatus::Pending | AgentStatus::Running => return WorkflowStatus::Running,
                AgentStatus::Completed => completed += 1,
                AgentStatus::Failed => failed += 1,
            }
        }

        match (completed, failed) {
            (_, 0) => WorkflowStatus::Completed,
            (0, _) => WorkflowStatus::Failed,
            _ => WorkflowStatus::Partial,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, WorkflowStatus::Running)
    }
}

/// Machine-readable reason attached to a failed agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    Timeout,
    Backend,
    Transport,
    Rejected,
    Cancelled,
    Panicked,
    BlockedByDependency,
}

/// Per-agent run record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResult {
    pub agent_id: AgentId,
    pub agent_name: String,
    pub status: AgentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<FailureKind>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::types::duration_ms::option"
    )]
    pub duration: Option<Duration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl AgentResult {
    pub fn pending(agent_id: impl Into<AgentId>, agent_name: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            agent_name: agent_name.into(),
            status: AgentStatus::Pending,
            output: None,
            session_key: None,
            error: None,
            error_kind: None,
            duration: None,
            start_time: None,
            end_time: None,
        }
    }
}

/// One run of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowExecution {
    pub workflow_id: String,
    pub workflow_name: String,
    pub status: WorkflowStatus,
    /// One entry per agent, in declared order.
    pub results: Vec<AgentResult>,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::types::duration_ms::option"
    )]
    pub total_duration: Option<Duration>,
}

impl WorkflowExecution {
    pub fn result(&self, agent_id: &str) -> Option<&AgentResult> {
        self.results.iter().find(|r| r.agent_id == agent_id)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Count of results currently in `status`.
    pub fn count(&self, status: AgentStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}
