// src/dag/graph.rs

use std::collections::HashSet;

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::compiler::{CompiledExpression, ExpressionOutput};
use crate::errors::{CalcError, Result};
use crate::types::TaskId;

/// Dependency graph of the tasks of one expression.
///
/// Edge direction: dependency -> consumer. For a task `t2 = t1 + 3` we add
/// the edge `t1 -> t2`.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    graph: DiGraphMap<TaskId, ()>,
}

impl TaskGraph {
    /// Build and check the graph of a compiled expression.
    ///
    /// Rejects:
    /// - duplicate task IDs,
    /// - references to tasks outside the expression or emitted later,
    /// - cycles,
    /// - a declared root that is not the single task without consumers.
    pub fn from_compiled(compiled: &CompiledExpression) -> Result<Self> {
        let mut graph: DiGraphMap<TaskId, ()> = DiGraphMap::new();
        let mut seen: HashSet<TaskId> = HashSet::new();

        for spec in &compiled.tasks {
            if spec.expression_id != compiled.expression_id {
                return Err(CalcError::InvalidGraph(format!(
                    "{} belongs to {} but was registered under {}",
                    spec.id, spec.expression_id, compiled.expression_id
                )));
            }

            for dep in spec.dependencies() {
                if !seen.contains(&dep) {
                    return Err(CalcError::InvalidGraph(format!(
                        "{} references {} which is not an earlier task of {}",
                        spec.id, dep, compiled.expression_id
                    )));
                }
            }

            if !seen.insert(spec.id) {
                return Err(CalcError::InvalidGraph(format!(
                    "duplicate task id {}",
                    spec.id
                )));
            }

            graph.add_node(spec.id);
            for dep in spec.dependencies() {
                graph.add_edge(dep, spec.id, ());
            }
        }

        // Emission order already rules out cycles; keep the check so that
        // hand-built task lists get the same guarantee.
        if let Err(cycle) = toposort(&graph, None) {
            return Err(CalcError::InvalidGraph(format!(
                "cycle detected involving {}",
                cycle.node_id()
            )));
        }

        let task_graph = Self { graph };
        task_graph.check_root(compiled)?;
        Ok(task_graph)
    }

    fn check_root(&self, compiled: &CompiledExpression) -> Result<()> {
        let sinks = self.sinks();
        match compiled.output {
            ExpressionOutput::Literal(_) if sinks.is_empty() => Ok(()),
            ExpressionOutput::Task(root) if sinks == [root] => Ok(()),
            _ => Err(CalcError::InvalidGraph(format!(
                "{} must have exactly one root task matching its output (found {:?})",
                compiled.expression_id, sinks
            ))),
        }
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Tasks with no consumer. A well-formed expression has at most one.
    pub fn sinks(&self) -> Vec<TaskId> {
        let mut sinks: Vec<TaskId> = self
            .graph
            .nodes()
            .filter(|id| {
                self.graph
                    .neighbors_directed(*id, Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .collect();
        sinks.sort();
        sinks
    }

    /// Immediate dependencies of a task.
    pub fn dependencies_of(&self, id: TaskId) -> Vec<TaskId> {
        let mut deps: Vec<TaskId> = self
            .graph
            .neighbors_directed(id, Direction::Incoming)
            .collect();
        deps.sort();
        deps
    }

    /// Immediate dependents of a task.
    pub fn dependents_of(&self, id: TaskId) -> Vec<TaskId> {
        let mut dependents: Vec<TaskId> = self
            .graph
            .neighbors_directed(id, Direction::Outgoing)
            .collect();
        dependents.sort();
        dependents
    }

    /// Tasks grouped into waves: every task in wave `n` depends only on
    /// tasks from earlier waves, so a wave can run fully in parallel.
    pub fn waves(&self) -> Vec<Vec<TaskId>> {
        let mut remaining: Vec<TaskId> = self.graph.nodes().collect();
        remaining.sort();

        let mut done: HashSet<TaskId> = HashSet::new();
        let mut waves = Vec::new();

        while !remaining.is_empty() {
            let (wave, rest): (Vec<TaskId>, Vec<TaskId>) = remaining
                .into_iter()
                .partition(|id| self.dependencies_of(*id).iter().all(|d| done.contains(d)));

            // Acyclic by construction, so every pass makes progress.
            if wave.is_empty() {
                break;
            }
            done.extend(wave.iter().copied());
            waves.push(wave);
            remaining = rest;
        }

        waves
    }
}
