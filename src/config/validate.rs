// src/config/validate.rs

use crate::config::model::{EngineConfig, GatewayConfig, RawWorkflowFile, WorkflowFile};
use crate::dag::ExecutionPlan;
use crate::errors::{AgentdagError, Result};
use crate::workflow::Workflow;

impl TryFrom<RawWorkflowFile> for WorkflowFile {
    type Error = AgentdagError;

    fn try_from(raw: RawWorkflowFile) -> std::result::Result<Self, Self::Error> {
        let workflow = raw.to_workflow();
        validate_config(&workflow, &raw.engine, &raw.gateway)?;
        Ok(WorkflowFile::new_unchecked(workflow, raw.engine, raw.gateway))
    }
}

/// Check engine/gateway settings and that the workflow can be planned.
pub fn validate_config(
    workflow: &Workflow,
    engine: &EngineConfig,
    gateway: &GatewayConfig,
) -> Result<()> {
    validate_engine(engine)?;
    validate_gateway(gateway)?;
    ExecutionPlan::build(workflow)?;
    Ok(())
}

fn validate_engine(engine: &EngineConfig) -> Result<()> {
    // policy is strongly typed and validated during deserialization.

    if engine.max_concurrency == 0 {
        return Err(AgentdagError::ConfigError(
            "[engine].max_concurrency must be >= 1 (got 0)".to_string(),
        ));
    }

    if engine.default_timeout_ms == 0 {
        return Err(AgentdagError::ConfigError(
            "[engine].default_timeout_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_gateway(gateway: &GatewayConfig) -> Result<()> {
    let url = gateway.url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(AgentdagError::ConfigError(format!(
            "[gateway].url must be an http(s) URL (got '{}')",
            gateway.url
        )));
    }
    Ok(())
}
