// src/dag/task_info.rs

//! Task and expression records held by the store.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::compiler::TaskSpec;
use crate::types::{Argument, ExpressionId, ExpressionStatus, Operator, TaskId};

/// State machine of a task.
///
/// `Pending <-> Ready` is recomputed until the task is claimed; after that
/// it only moves forward. There is no failed state: a task whose worker gives
/// up stays `InProgress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Waiting on at least one referenced task.
    Pending,
    /// All arguments resolvable; may be claimed.
    Ready,
    /// Claimed by a worker.
    InProgress,
    /// Result reported.
    Completed,
}

/// Stored task: compiler output plus scheduling state.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub id: TaskId,
    pub expression_id: ExpressionId,
    pub arg1: Argument,
    pub arg2: Argument,
    pub operator: Operator,
    pub operation_time: Duration,
    pub state: TaskState,
    pub result: Option<f64>,
    /// When the current claim was granted (only while `InProgress`).
    pub claimed_at: Option<Instant>,
}

impl TaskInfo {
    pub fn from_spec(spec: TaskSpec) -> Self {
        Self {
            id: spec.id,
            expression_id: spec.expression_id,
            arg1: spec.arg1,
            arg2: spec.arg2,
            operator: spec.operator,
            operation_time: spec.operation_time,
            state: TaskState::Pending,
            result: None,
            claimed_at: None,
        }
    }

    /// Completed and InProgress tasks are never touched by readiness
    /// recomputation.
    pub fn is_settled(&self) -> bool {
        matches!(self.state, TaskState::Completed | TaskState::InProgress)
    }
}

/// What a worker receives when it claims a task.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimedTask {
    pub id: TaskId,
    pub expression_id: ExpressionId,
    pub arg1: Argument,
    pub arg2: Argument,
    pub operator: Operator,
    pub operation_time: Duration,
}

impl ClaimedTask {
    pub fn from_task_info(info: &TaskInfo) -> Self {
        Self {
            id: info.id,
            expression_id: info.expression_id,
            arg1: info.arg1,
            arg2: info.arg2,
            operator: info.operator,
            operation_time: info.operation_time,
        }
    }
}

/// A submitted expression and its lifecycle.
#[derive(Debug, Clone)]
pub struct ExpressionRecord {
    pub id: ExpressionId,
    pub text: String,
    pub status: ExpressionStatus,
    /// Only meaningful when `status` is `Done`.
    pub result: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl ExpressionRecord {
    pub fn new(id: ExpressionId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            status: ExpressionStatus::Pending,
            result: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == ExpressionStatus::Done
    }

    pub(crate) fn mark_done(&mut self, result: f64) {
        self.status = ExpressionStatus::Done;
        self.result = Some(result);
    }
}
