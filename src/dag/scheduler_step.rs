// src/dag/scheduler_step.rs

//! Structured results of store mutations.

use crate::types::{ExpressionId, TaskId};

/// What changed when a task result was accepted.
///
/// Useful for tests that want to step the DAG by hand and make assertions
/// about the cascade.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionStep {
    pub task: TaskId,
    pub expression_id: ExpressionId,
    /// Tasks of the same expression that became `Ready` because of this
    /// completion.
    pub newly_ready: Vec<TaskId>,
    /// Set when this completion finished the expression.
    pub expression_result: Option<f64>,
    /// The task was already `Completed`; the new result was ignored.
    pub duplicate: bool,
}

impl CompletionStep {
    pub fn finished_expression(&self) -> bool {
        self.expression_result.is_some()
    }
}
