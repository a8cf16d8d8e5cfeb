// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{EngineConfig, GatewayConfig, RawWorkflowFile, WorkflowFile};
use crate::config::validate::validate_config;
use crate::errors::Result;
use crate::workflow::Workflow;

/// Load a TOML workflow file from a given path and return the raw
/// `RawWorkflowFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (graph correctness, etc.). Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawWorkflowFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    parse_toml(&contents)
}

pub fn parse_toml(contents: &str) -> Result<RawWorkflowFile> {
    Ok(toml::from_str(contents)?)
}

/// Parse a workflow saved in the editor's JSON shape.
///
/// JSON files carry only the workflow; engine and gateway settings take
/// their defaults.
pub fn parse_json(contents: &str) -> Result<WorkflowFile> {
    let workflow: Workflow = serde_json::from_str(contents)?;
    let engine = EngineConfig::default();
    let gateway = GatewayConfig::default();
    validate_config(&workflow, &engine, &gateway)?;
    Ok(WorkflowFile::new_unchecked(workflow, engine, gateway))
}

/// Load a workflow file from path and run validation.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML, or JSON when the extension is `.json`.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for:
///   - duplicate agent ids and unknown `depends_on` references,
///   - dependency cycles,
///   - empty prompts and zero timeouts,
///   - basic engine/gateway sanity.
/// - Applies gateway overrides from the environment.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<WorkflowFile> {
    let path = path.as_ref();

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let mut file = if is_json {
        parse_json(&fs::read_to_string(path)?)?
    } else {
        WorkflowFile::try_from(load_from_path(path)?)?
    };

    file.gateway = file.gateway.with_env_overrides();
    Ok(file)
}

/// Helper to resolve a default workflow path: `Agentdag.toml` in the
/// current working directory.
pub fn default_workflow_path() -> PathBuf {
    PathBuf::from("Agentdag.toml")
}
