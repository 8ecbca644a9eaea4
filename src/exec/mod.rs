// src/exec/mod.rs

//! Worker side of the dispatch protocol.
//!
//! Workers claim ready tasks, resolve task-reference arguments by fetching
//! the referenced results (with bounded retry), compute the operation and
//! report the result back.
//!
//! - [`backend`] provides the `DispatchClient` trait and `LocalDispatch`,
//!   which talks to an in-process store.
//! - [`http_client`] provides `HttpDispatch`, the network implementation.
//! - [`retry`] holds the linear backoff policy used for dependency fetches.
//! - [`task_runner`] resolves, computes and reports one claimed task.
//! - [`executor_loop`] runs the fixed-size worker pool with its admission
//!   counter.

pub mod backend;
pub mod executor_loop;
pub mod http_client;
pub mod retry;
pub mod task_runner;

use thiserror::Error;

use crate::types::{Operator, TaskId};

pub use backend::{DispatchClient, DispatchFuture, LocalDispatch};
pub use executor_loop::{AdmissionCounter, WorkerPool, WorkerSettings};
pub use http_client::HttpDispatch;
pub use retry::{RetryPolicy, fetch_with_retry};
pub use task_runner::{calculate, process_task, run_task};

/// Failures local to a worker. None of them is reported to the orchestrator;
/// the affected task stays claimed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkerError {
    #[error("result of {task} still unavailable after {attempts} attempts")]
    DependencyUnresolved { task: TaskId, attempts: u32 },

    #[error("division by zero")]
    DivisionByZero,

    #[error("{a} {op} {b} is not a finite number")]
    NonFinite { op: Operator, a: f64, b: f64 },

    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    #[error("orchestrator does not know {0}")]
    TaskRejected(TaskId),

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for WorkerError {
    fn from(err: reqwest::Error) -> Self {
        WorkerError::Transport(err.to_string())
    }
}
