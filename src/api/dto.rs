// src/api/dto.rs

//! JSON bodies of the HTTP API, shared by the server and the worker client.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dag::{ClaimedTask, ExpressionRecord};
use crate::exec::WorkerError;
use crate::types::{Argument, ExpressionId, ExpressionStatus, Operator, TaskId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateRequest {
    pub expression: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateResponse {
    pub id: ExpressionId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionDto {
    pub id: ExpressionId,
    pub expression: String,
    pub status: ExpressionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<f64>,
}

impl From<&ExpressionRecord> for ExpressionDto {
    fn from(record: &ExpressionRecord) -> Self {
        Self {
            id: record.id,
            expression: record.text.clone(),
            status: record.status,
            result: if record.is_done() { record.result } else { None },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpressionsResponse {
    pub expressions: Vec<ExpressionDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpressionDetailResponse {
    pub expression: ExpressionDto,
}

/// A claimed task on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDto {
    pub id: TaskId,
    pub expression_id: ExpressionId,
    pub arg1: Argument,
    pub arg2: Argument,
    /// Operator symbol, one of `+ - * /`.
    pub operation: String,
    /// Simulated execution time in milliseconds.
    pub operation_time: u64,
}

impl From<&ClaimedTask> for TaskDto {
    fn from(task: &ClaimedTask) -> Self {
        Self {
            id: task.id,
            expression_id: task.expression_id,
            arg1: task.arg1,
            arg2: task.arg2,
            operation: task.operator.to_string(),
            operation_time: u64::try_from(task.operation_time.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

impl TryFrom<TaskDto> for ClaimedTask {
    type Error = WorkerError;

    fn try_from(dto: TaskDto) -> Result<Self, Self::Error> {
        let operator: Operator = dto
            .operation
            .parse()
            .map_err(|_| WorkerError::UnknownOperator(dto.operation.clone()))?;

        Ok(ClaimedTask {
            id: dto.id,
            expression_id: dto.expression_id,
            arg1: dto.arg1,
            arg2: dto.arg2,
            operator,
            operation_time: Duration::from_millis(dto.operation_time),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    pub task: TaskDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResultRequest {
    pub id: TaskId,
    pub result: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResultResponse {
    pub result: f64,
}
