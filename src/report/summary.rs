// src/report/summary.rs

use std::fmt;
use std::time::Duration;

use crate::workflow::{AgentStatus, WorkflowExecution};

/// Human-readable rendering of a run record.
///
/// One line per agent: status, duration, then output (completed), error
/// (failed) or nothing (still pending).
#[derive(Debug, Clone)]
pub struct ExecutionReport<'a> {
    execution: &'a WorkflowExecution,
}

impl<'a> ExecutionReport<'a> {
    pub fn new(execution: &'a WorkflowExecution) -> Self {
        Self { execution }
    }

    /// Short single-line progress summary, used while a run is in flight.
    pub fn progress_line(&self) -> String {
        let e = self.execution;
        format!(
            "[{}] {:?}: {} pending, {} running, {} completed, {} failed",
            e.workflow_name,
            e.status,
            e.count(AgentStatus::Pending),
            e.count(AgentStatus::Running),
            e.count(AgentStatus::Completed),
            e.count(AgentStatus::Failed),
        )
    }
}

fn fmt_duration(d: Option<Duration>) -> String {
    match d {
        Some(d) => format!("{:.1}s", d.as_secs_f64()),
        None => "-".to_string(),
    }
}

impl fmt::Display for ExecutionReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let e = self.execution;
        writeln!(f, "workflow {} ({})", e.workflow_name, e.workflow_id)?;
        writeln!(
            f,
            "  status: {:?}  total: {}",
            e.status,
            fmt_duration(e.total_duration)
        )?;

        for r in e.results.iter() {
            let detail = match r.status {
                AgentStatus::Completed => r.output.clone().unwrap_or_default(),
                AgentStatus::Failed => r.error.clone().unwrap_or_else(|| "unknown error".into()),
                AgentStatus::Running => "running".to_string(),
                AgentStatus::Pending => "not started".to_string(),
            };
            writeln!(
                f,
                "  - {:<24} {:<9} {:>7}  {}",
                r.agent_name,
                format!("{:?}", r.status).to_lowercase(),
                fmt_duration(r.duration),
                detail.lines().next().unwrap_or_default()
            )?;
        }
        Ok(())
    }
}
