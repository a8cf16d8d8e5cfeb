// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::loader::default_workflow_path;
use crate::types::DispatchPolicy;

/// Command-line arguments for `agentdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "agentdag",
    version,
    about = "Run a dependency graph of agent tasks against an agent gateway.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the workflow file (TOML, or JSON as saved by the editor).
    ///
    /// Default: `Agentdag.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value_os_t = default_workflow_path())]
    pub workflow: PathBuf,

    /// Dispatch policy (sequential or parallel). Overrides `[engine].policy`.
    #[arg(long, value_name = "POLICY")]
    pub policy: Option<DispatchPolicy>,

    /// Maximum agents running at once under the parallel policy.
    #[arg(long, value_name = "N")]
    pub max_concurrency: Option<usize>,

    /// Gateway base URL. Overrides the file and `AGENTDAG_GATEWAY_URL`.
    #[arg(long, value_name = "URL")]
    pub gateway_url: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `AGENTDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the plan, but don't run any agent.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the final execution record as JSON instead of a text report.
    #[arg(long)]
    pub json: bool,

    /// Print a progress line for every snapshot while the run is going.
    #[arg(long)]
    pub watch: bool,

    /// Run the workflow even if it is marked `enabled = false`.
    #[arg(long)]
    pub force: bool,

    /// Check the gateway's status endpoint and exit.
    #[arg(long)]
    pub check_gateway: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
