// src/dag/plan.rs

//! Execution plans: a validated workflow with dependencies resolved to
//! agent indices, ready for the scheduler.

use std::time::Duration;

use crate::dag::graph::{self, DagGraph};
use crate::errors::ValidationError;
use crate::workflow::{AgentTask, Workflow};

/// One agent plus its resolved edges.
#[derive(Debug, Clone)]
pub struct PlannedTask {
    /// Position in the workflow's `agents` list.
    pub index: usize,
    pub agent: AgentTask,
    /// Indices of direct dependencies, in declared order.
    pub deps: Vec<usize>,
    /// Indices of direct dependents, in declared order.
    pub dependents: Vec<usize>,
}

/// A validated, immutable plan for one run.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub workflow_id: String,
    pub workflow_name: String,
    tasks: Vec<PlannedTask>,
    graph: DagGraph,
}

/// Validate a workflow for execution.
///
/// Graph checks come first (duplicate ids, unknown dependencies, cycles),
/// then per-agent checks (empty prompt, zero timeout).
pub fn validate(workflow: &Workflow) -> Result<ExecutionPlan, ValidationError> {
    ExecutionPlan::build(workflow)
}

impl ExecutionPlan {
    pub fn build(workflow: &Workflow) -> Result<Self, ValidationError> {
        let graph = graph::validate(&workflow.agents)?;

        for agent in workflow.agents.iter() {
            if agent.prompt.trim().is_empty() {
                return Err(ValidationError::EmptyPrompt(agent.id.clone()));
            }
            if agent.timeout == Duration::ZERO {
                return Err(ValidationError::InvalidTimeout(agent.id.clone()));
            }
        }

        let tasks = workflow
            .agents
            .iter()
            .enumerate()
            .map(|(index, agent)| PlannedTask {
                index,
                agent: agent.clone(),
                deps: graph.dependencies_of(index),
                dependents: graph.dependents_of(index),
            })
            .collect();

        Ok(Self {
            workflow_id: workflow.id.clone(),
            workflow_name: workflow.name.clone(),
            tasks,
            graph,
        })
    }

    pub fn tasks(&self) -> &[PlannedTask] {
        &self.tasks
    }

    pub fn task(&self, index: usize) -> Option<&PlannedTask> {
        self.tasks.get(index)
    }

    pub fn index_of(&self, agent_id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.agent.id == agent_id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn graph(&self) -> &DagGraph {
        &self.graph
    }
}
