use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AgentId;

/// Timeout given to agents that don't declare one.
pub const DEFAULT_AGENT_TIMEOUT: Duration = Duration::from_secs(60);

/// Declared shape of an agent's output. Advisory only; the engine never
/// checks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Json,
    #[default]
    Text,
    File,
    None,
}

/// One node in a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentTask {
    pub id: AgentId,
    pub name: String,
    /// Instruction text sent to the executor. Must be non-empty to run.
    pub prompt: String,
    #[serde(with = "crate::types::duration_ms", default = "default_timeout")]
    pub timeout: Duration,
    /// Agents whose completion gates this one.
    #[serde(default)]
    pub depends_on: Vec<AgentId>,
    #[serde(default, rename = "output")]
    pub output_kind: OutputKind,
}

fn default_timeout() -> Duration {
    DEFAULT_AGENT_TIMEOUT
}

impl AgentTask {
    pub fn new(id: impl Into<AgentId>, name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            prompt: prompt.into(),
            timeout: DEFAULT_AGENT_TIMEOUT,
            depends_on: Vec::new(),
            output_kind: OutputKind::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn depends_on(mut self, id: impl Into<AgentId>) -> Self {
        let id = id.into();
        if !self.depends_on.contains(&id) {
            self.depends_on.push(id);
        }
        self
    }

    pub fn with_output(mut self, kind: OutputKind) -> Self {
        self.output_kind = kind;
        self
    }
}

/// Named container of agents. Owned by the caller; the engine only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub agents: Vec<AgentTask>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_enabled() -> bool {
    true
}

impl Workflow {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            agents: Vec::new(),
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_agent(mut self, agent: AgentTask) -> Self {
        self.agents.push(agent);
        self.updated_at = Utc::now();
        self
    }

    pub fn agent(&self, id: &str) -> Option<&AgentTask> {
        self.agents.iter().find(|a| a.id == id)
    }
}
