// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod report;
pub mod types;
pub mod workflow;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::WorkflowFile;
use crate::dag::ExecutionPlan;
use crate::engine::Engine;
use crate::exec::GatewayExecutor;
use crate::report::ExecutionReport;
use crate::workflow::WorkflowStatus;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - workflow loading and validation
/// - the gateway executor
/// - the engine run and its snapshot subscription
/// - Ctrl-C handling
///
/// Returns the run's final aggregate status.
pub async fn run(args: CliArgs) -> Result<WorkflowStatus> {
    let path = args.workflow.clone();
    let mut file = load_and_validate(&path)
        .with_context(|| format!("loading workflow from {}", path.display()))?;
    apply_cli_overrides(&mut file, &args);

    let executor = GatewayExecutor::new(&file.gateway);

    if args.check_gateway {
        let healthy = executor.health().await;
        println!(
            "gateway {} is {}",
            executor.base_url(),
            if healthy { "reachable" } else { "unreachable" }
        );
        if !healthy {
            bail!("gateway {} is unreachable", executor.base_url());
        }
        return Ok(WorkflowStatus::Completed);
    }

    let plan = ExecutionPlan::build(&file.workflow)?;

    if args.dry_run {
        print_dry_run(&file, &plan);
        return Ok(WorkflowStatus::Completed);
    }

    if !file.workflow.enabled {
        if !args.force {
            bail!(
                "workflow '{}' is disabled (use --force to run it anyway)",
                file.workflow.id
            );
        }
        warn!(workflow = %file.workflow.id, "running disabled workflow (--force)");
    }

    let engine = Engine::new(executor, file.engine);
    let handle = engine.run_plan(plan);

    // Ctrl-C → cancel the run.
    {
        let token = handle.cancellation_token();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            token.cancel();
        });
    }

    let mut subscription = handle.subscribe();
    while let Some(snapshot) = subscription.next().await {
        if args.watch {
            println!("{}", ExecutionReport::new(&snapshot).progress_line());
        }
    }

    let execution = handle.wait().await?;
    info!(
        workflow = %execution.workflow_id,
        status = ?execution.status,
        "workflow run complete"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&execution)?);
    } else {
        print!("{}", ExecutionReport::new(&execution));
    }

    Ok(execution.status)
}

fn apply_cli_overrides(file: &mut WorkflowFile, args: &CliArgs) {
    if let Some(policy) = args.policy {
        file.engine.policy = policy;
    }
    if let Some(n) = args.max_concurrency {
        file.engine.max_concurrency = n.max(1);
    }
    if let Some(ref url) = args.gateway_url {
        file.gateway.url = url.clone();
    }
}

/// Simple dry-run output: print agents, levels and dependencies.
fn print_dry_run(file: &WorkflowFile, plan: &ExecutionPlan) {
    println!("agentdag dry-run");
    println!("  workflow = {} ({})", file.workflow.name, file.workflow.id);
    println!("  engine.policy = {:?}", file.engine.policy);
    println!("  engine.max_concurrency = {}", file.engine.max_concurrency);
    println!("  gateway.url = {}", file.gateway.url);
    println!();

    let levels = plan.graph().levels();
    println!("agents ({}):", plan.len());
    for task in plan.tasks() {
        println!("  - {} [level {}]", task.agent.id, levels[task.index]);
        println!("      name: {}", task.agent.name);
        println!("      timeout: {}ms", task.agent.timeout.as_millis());
        if !task.agent.depends_on.is_empty() {
            println!("      depends_on: {:?}", task.agent.depends_on);
        }
        println!("      output: {:?}", task.agent.output_kind);
    }

    debug!("dry-run complete (no execution)");
}
