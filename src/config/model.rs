// src/config/model.rs

use serde::{Deserialize, Serialize};

use crate::types::DispatchPolicy;
use crate::workflow::{AgentTask, OutputKind, Workflow};

pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:18789";
pub const GATEWAY_URL_ENV: &str = "AGENTDAG_GATEWAY_URL";
pub const GATEWAY_TOKEN_ENV: &str = "AGENTDAG_GATEWAY_TOKEN";

/// Top-level workflow file as read from TOML.
///
/// ```toml
/// [workflow]
/// id = "research"
/// name = "Research pipeline"
///
/// [engine]
/// policy = "parallel"
/// max_concurrency = 4
///
/// [gateway]
/// url = "http://localhost:18789"
///
/// [[agent]]
/// id = "collect"
/// prompt = "Collect sources on ..."
///
/// [[agent]]
/// id = "summarize"
/// prompt = "Summarize the collected sources"
/// depends_on = ["collect"]
/// ```
///
/// Everything except `[workflow]` is optional and has reasonable defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RawWorkflowFile {
    pub workflow: WorkflowSection,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    /// All agents from `[[agent]]`, in declared order.
    #[serde(default)]
    pub agent: Vec<AgentSection>,
}

/// A workflow file that passed validation.
///
/// Only constructed through `TryFrom<RawWorkflowFile>` or the JSON loader,
/// so holding one means the workflow can be submitted.
#[derive(Debug, Clone)]
pub struct WorkflowFile {
    pub workflow: Workflow,
    pub engine: EngineConfig,
    pub gateway: GatewayConfig,
}

impl WorkflowFile {
    pub(crate) fn new_unchecked(
        workflow: Workflow,
        engine: EngineConfig,
        gateway: GatewayConfig,
    ) -> Self {
        Self {
            workflow,
            engine,
            gateway,
        }
    }
}

/// `[workflow]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowSection {
    pub id: String,

    /// Display name; defaults to the id.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// `[[agent]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentSection {
    pub id: String,

    /// Display name; defaults to the id.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub prompt: String,

    /// Per-agent timeout; falls back to `[engine].default_timeout_ms`.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// This agent waits for all agents listed here.
    #[serde(default)]
    pub depends_on: Vec<String>,

    #[serde(default)]
    pub output: OutputKind,
}

/// `[engine]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// `"sequential"` or `"parallel"` (default).
    #[serde(default)]
    pub policy: DispatchPolicy,

    /// Upper bound on agents running at once under the parallel policy.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Timeout for agents that don't set `timeout_ms`.
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,
}

fn default_max_concurrency() -> usize {
    4
}

fn default_timeout_ms() -> u64 {
    60_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            policy: DispatchPolicy::default(),
            max_concurrency: default_max_concurrency(),
            default_timeout_ms: default_timeout_ms(),
        }
    }
}

impl EngineConfig {
    pub fn sequential() -> Self {
        Self {
            policy: DispatchPolicy::Sequential,
            ..Self::default()
        }
    }

    pub fn parallel(max_concurrency: usize) -> Self {
        Self {
            policy: DispatchPolicy::Parallel,
            max_concurrency,
            ..Self::default()
        }
    }
}

/// `[gateway]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_url")]
    pub url: String,

    /// Sent verbatim as the `Authorization` header when set.
    #[serde(default)]
    pub token: Option<String>,

    /// Backend agent that should handle spawned sessions.
    #[serde(default)]
    pub agent_id: Option<String>,
}

fn default_gateway_url() -> String {
    DEFAULT_GATEWAY_URL.to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: default_gateway_url(),
            token: None,
            agent_id: None,
        }
    }
}

impl GatewayConfig {
    /// Apply `AGENTDAG_GATEWAY_URL` / `AGENTDAG_GATEWAY_TOKEN` overrides
    /// found through `lookup`.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(GATEWAY_URL_ENV).filter(|s| !s.trim().is_empty()) {
            self.url = url;
        }
        if let Some(token) = lookup(GATEWAY_TOKEN_ENV).filter(|s| !s.is_empty()) {
            self.token = Some(token);
        }
        self
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }
}

impl RawWorkflowFile {
    /// Build the caller-facing `Workflow`, filling defaults from `[engine]`.
    pub fn to_workflow(&self) -> Workflow {
        let mut workflow = Workflow::new(
            self.workflow.id.clone(),
            self.workflow
                .name
                .clone()
                .unwrap_or_else(|| self.workflow.id.clone()),
        );
        workflow.description = self.workflow.description.clone();
        workflow.enabled = self.workflow.enabled;

        let default_timeout = std::time::Duration::from_millis(self.engine.default_timeout_ms);
        workflow.agents = self
            .agent
            .iter()
            .map(|a| {
                let mut task = AgentTask::new(
                    a.id.clone(),
                    a.name.clone().unwrap_or_else(|| a.id.clone()),
                    a.prompt.clone(),
                )
                .with_timeout(
                    a.timeout_ms
                        .map(std::time::Duration::from_millis)
                        .unwrap_or(default_timeout),
                )
                .with_output(a.output);
                for dep in a.depends_on.iter() {
                    task = task.depends_on(dep.clone());
                }
                task
            })
            .collect();

        workflow
    }
}
