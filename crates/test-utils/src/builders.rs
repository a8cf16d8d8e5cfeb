#![allow(dead_code)]

use std::time::Duration;

use agentdag::workflow::{AgentTask, OutputKind, Workflow};

/// Builder for `Workflow` to simplify test setup.
pub struct WorkflowBuilder {
    workflow: Workflow,
}

impl WorkflowBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            workflow: Workflow::new(id, format!("workflow {id}")),
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.workflow.name = name.to_string();
        self
    }

    pub fn with_agent(mut self, agent: AgentTask) -> Self {
        self.workflow.agents.push(agent);
        self
    }

    /// Shorthand: agent `id` with prompt `"do <id>"` depending on `deps`.
    pub fn task(self, id: &str, deps: &[&str]) -> Self {
        let mut agent = AgentBuilder::new(id);
        for dep in deps {
            agent = agent.after(dep);
        }
        self.with_agent(agent.build())
    }

    pub fn disabled(mut self) -> Self {
        self.workflow.enabled = false;
        self
    }

    pub fn build(self) -> Workflow {
        self.workflow
    }
}

/// Builder for `AgentTask`.
pub struct AgentBuilder {
    task: AgentTask,
}

impl AgentBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            task: AgentTask::new(id, id, format!("do {id}")),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.task.name = name.to_string();
        self
    }

    pub fn prompt(mut self, prompt: &str) -> Self {
        self.task.prompt = prompt.to_string();
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.depends_on.push(dep.to_string());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.task.timeout = timeout;
        self
    }

    pub fn output(mut self, kind: OutputKind) -> Self {
        self.task.output_kind = kind;
        self
    }

    pub fn build(self) -> AgentTask {
        self.task
    }
}
