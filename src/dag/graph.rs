// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::errors::ValidationError;
use crate::workflow::{AgentId, AgentTask};

/// DFS colouring for cycle search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// Validated dependency graph over agent indices.
///
/// Nodes are positions in the workflow's `agents` list, so declared order is
/// preserved everywhere the graph hands out node lists.
///
/// Edge direction: dep -> agent. For
///   B.dependsOn = ["A"]
/// we add edge A -> B.
#[derive(Debug, Clone)]
pub struct DagGraph {
    ids: Vec<AgentId>,
    graph: DiGraphMap<usize, ()>,
}

/// Validate the agents' dependency edges and build the graph.
///
/// Rejects duplicate ids, references to unknown ids and cycles (a self-loop
/// included). The cycle reported is the first one hit by a depth-first search
/// that walks agents in declared order.
pub fn validate(agents: &[AgentTask]) -> Result<DagGraph, ValidationError> {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(agents.len());
    for (i, agent) in agents.iter().enumerate() {
        if index.insert(agent.id.as_str(), i).is_some() {
            return Err(ValidationError::DuplicateAgentId(agent.id.clone()));
        }
    }

    let mut graph: DiGraphMap<usize, ()> = DiGraphMap::with_capacity(agents.len(), 0);
    for i in 0..agents.len() {
        graph.add_node(i);
    }

    for (i, agent) in agents.iter().enumerate() {
        for dep in agent.depends_on.iter() {
            let Some(&d) = index.get(dep.as_str()) else {
                return Err(ValidationError::UnknownDependency {
                    agent: agent.id.clone(),
                    dependency: dep.clone(),
                });
            };
            graph.add_edge(d, i, ());
        }
    }

    let dag = DagGraph {
        ids: agents.iter().map(|a| a.id.clone()).collect(),
        graph,
    };

    if let Some(cycle) = dag.find_cycle() {
        let ids: Vec<AgentId> = cycle.into_iter().map(|i| dag.ids[i].clone()).collect();
        debug!(?ids, "cycle found while validating agent graph");
        return Err(ValidationError::CycleDetected(ids));
    }

    Ok(dag)
}

impl DagGraph {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Direct dependencies of `index`, in declared order.
    pub fn dependencies_of(&self, index: usize) -> Vec<usize> {
        self.sorted_neighbors(index, Direction::Incoming)
    }

    /// Direct dependents of `index`, in declared order.
    pub fn dependents_of(&self, index: usize) -> Vec<usize> {
        self.sorted_neighbors(index, Direction::Outgoing)
    }

    /// Agents with no dependencies, in declared order.
    pub fn roots(&self) -> Vec<usize> {
        (0..self.len())
            .filter(|&i| self.graph.neighbors_directed(i, Direction::Incoming).next().is_none())
            .collect()
    }

    /// Longest dependency chain above each agent (roots are level 0).
    pub fn levels(&self) -> Vec<usize> {
        let mut levels = vec![0usize; self.len()];
        // Acyclic by construction, so toposort cannot fail here.
        let order = toposort(&self.graph, None).unwrap_or_default();
        for node in order {
            for dep in self.graph.neighbors_directed(node, Direction::Incoming) {
                levels[node] = levels[node].max(levels[dep] + 1);
            }
        }
        levels
    }

    fn sorted_neighbors(&self, index: usize, dir: Direction) -> Vec<usize> {
        let mut out: Vec<usize> = self.graph.neighbors_directed(index, dir).collect();
        out.sort_unstable();
        out
    }

    /// Depth-first search over "depends on" edges with an explicit path
    /// stack, so long chains don't grow the call stack. Returns the nodes of
    /// the first cycle found, starting at the node where the search entered
    /// it.
    fn find_cycle(&self) -> Option<Vec<usize>> {
        let mut marks = vec![Mark::Unvisited; self.len()];
        // (node on the current path, its dependencies, next dependency to visit)
        let mut path: Vec<(usize, Vec<usize>, usize)> = Vec::new();

        for start in 0..self.len() {
            if marks[start] != Mark::Unvisited {
                continue;
            }
            marks[start] = Mark::OnStack;
            path.push((start, self.dependencies_of(start), 0));

            while let Some((node, deps, next)) = path.last_mut() {
                let Some(&dep) = deps.get(*next) else {
                    marks[*node] = Mark::Done;
                    path.pop();
                    continue;
                };
                *next += 1;

                match marks[dep] {
                    Mark::OnStack => {
                        let pos = path.iter().position(|(n, _, _)| *n == dep).unwrap_or(0);
                        return Some(path[pos..].iter().map(|(n, _, _)| *n).collect());
                    }
                    Mark::Unvisited => {
                        marks[dep] = Mark::OnStack;
                        path.push((dep, self.dependencies_of(dep), 0));
                    }
                    Mark::Done => {}
                }
            }
        }
        None
    }
}
