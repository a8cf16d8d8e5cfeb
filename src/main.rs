// src/main.rs

use agentdag::workflow::WorkflowStatus;
use agentdag::{cli, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(WorkflowStatus::Completed) => {}
        Ok(status) => {
            eprintln!("agentdag: workflow finished with status {status:?}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("agentdag error: {err:?}");
            std::process::exit(1);
        }
    }
}

async fn run_main() -> anyhow::Result<WorkflowStatus> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
