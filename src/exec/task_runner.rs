// src/exec/task_runner.rs

//! Processing of a single claimed task.

use tracing::{error, info, warn};

use crate::dag::ClaimedTask;
use crate::exec::WorkerError;
use crate::exec::backend::DispatchClient;
use crate::exec::retry::{RetryPolicy, fetch_with_retry};
use crate::types::{Argument, Operator};

/// Apply `op` to two operands.
///
/// Results that overflow to infinity (or become NaN) have no JSON encoding
/// and are rejected like a division by zero.
pub fn calculate(op: Operator, a: f64, b: f64) -> Result<f64, WorkerError> {
    let value = match op {
        Operator::Add => a + b,
        Operator::Subtract => a - b,
        Operator::Multiply => a * b,
        Operator::Divide if b == 0.0 => return Err(WorkerError::DivisionByZero),
        Operator::Divide => a / b,
    };
    if !value.is_finite() {
        return Err(WorkerError::NonFinite { op, a, b });
    }
    Ok(value)
}

async fn resolve_argument<C>(
    client: &C,
    arg: Argument,
    policy: &RetryPolicy,
) -> Result<f64, WorkerError>
where
    C: DispatchClient + ?Sized,
{
    match arg {
        Argument::Literal(value) => Ok(value),
        Argument::TaskRef(task) => fetch_with_retry(client, task, policy).await,
    }
}

/// Resolve both arguments, wait the task's operation time and compute.
///
/// The only suspension points are the dependency backoff sleeps and the
/// operation-time sleep.
pub async fn process_task<C>(
    client: &C,
    task: &ClaimedTask,
    policy: &RetryPolicy,
) -> Result<f64, WorkerError>
where
    C: DispatchClient + ?Sized,
{
    let a = resolve_argument(client, task.arg1, policy).await?;
    let b = resolve_argument(client, task.arg2, policy).await?;

    tokio::time::sleep(task.operation_time).await;

    calculate(task.operator, a, b)
}

/// Process a claimed task and report its result.
///
/// Failures are logged and the task is abandoned: nothing is reported, so it
/// stays claimed on the orchestrator.
pub async fn run_task<C>(client: &C, task: ClaimedTask, policy: &RetryPolicy)
where
    C: DispatchClient + ?Sized,
{
    info!(
        task = %task.id,
        expression = %task.expression_id,
        op = %task.operator,
        arg1 = %task.arg1,
        arg2 = %task.arg2,
        "processing task"
    );

    let result = match process_task(client, &task, policy).await {
        Ok(result) => result,
        Err(err) => {
            error!(task = %task.id, error = %err, "task abandoned");
            return;
        }
    };

    match client.submit_result(task.id, result).await {
        Ok(()) => info!(task = %task.id, result, "result submitted"),
        Err(err) => warn!(task = %task.id, error = %err, "failed to submit result"),
    }
}
