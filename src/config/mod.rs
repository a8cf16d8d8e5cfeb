// src/config/mod.rs

//! Workflow file loading and validation for agentdag.
//!
//! Responsibilities:
//! - Define the TOML-backed file model and engine/gateway settings (`model.rs`).
//! - Load a workflow file from disk, TOML or JSON (`loader.rs`).
//! - Validate it before anything runs (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, parse_json, parse_toml};
pub use model::{
    AgentSection, EngineConfig, GatewayConfig, RawWorkflowFile, WorkflowFile, WorkflowSection,
};
pub use validate::validate_config;
