// src/exec/backend.rs

//! Pluggable dispatch client abstraction.
//!
//! Workers talk to a `DispatchClient` instead of a concrete transport, so
//! the same pool runs against an in-process store ([`LocalDispatch`]), the
//! HTTP API ([`super::HttpDispatch`]) or a scripted fake in tests.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::dag::{ClaimedTask, TaskGraphStore};
use crate::errors::CalcError;
use crate::exec::WorkerError;
use crate::types::TaskId;

pub type DispatchFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, WorkerError>> + Send + 'a>>;

/// The three worker-facing operations of the dispatch protocol.
pub trait DispatchClient: Send + Sync {
    /// Claim a ready task. `Ok(None)` means nothing is ready right now.
    fn claim_task(&self) -> DispatchFuture<'_, Option<ClaimedTask>>;

    /// Fetch the result of a task. `Ok(None)` means the task is unknown or
    /// not completed yet.
    fn fetch_result(&self, task: TaskId) -> DispatchFuture<'_, Option<f64>>;

    /// Report a computed result.
    fn submit_result(&self, task: TaskId, result: f64) -> DispatchFuture<'_, ()>;
}

impl<C: DispatchClient + ?Sized> DispatchClient for Arc<C> {
    fn claim_task(&self) -> DispatchFuture<'_, Option<ClaimedTask>> {
        (**self).claim_task()
    }

    fn fetch_result(&self, task: TaskId) -> DispatchFuture<'_, Option<f64>> {
        (**self).fetch_result(task)
    }

    fn submit_result(&self, task: TaskId, result: f64) -> DispatchFuture<'_, ()> {
        (**self).submit_result(task, result)
    }
}

/// Dispatch client that calls the store directly, used by `calcdag local`.
#[derive(Debug, Clone)]
pub struct LocalDispatch {
    store: Arc<TaskGraphStore>,
}

impl LocalDispatch {
    pub fn new(store: Arc<TaskGraphStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<TaskGraphStore> {
        &self.store
    }
}

impl DispatchClient for LocalDispatch {
    fn claim_task(&self) -> DispatchFuture<'_, Option<ClaimedTask>> {
        Box::pin(async move { Ok(self.store.claim_ready_task()) })
    }

    fn fetch_result(&self, task: TaskId) -> DispatchFuture<'_, Option<f64>> {
        Box::pin(async move { Ok(self.store.task_result(task).ok()) })
    }

    fn submit_result(&self, task: TaskId, result: f64) -> DispatchFuture<'_, ()> {
        Box::pin(async move {
            match self.store.complete_task(task, result) {
                Ok(_) => Ok(()),
                Err(CalcError::TaskNotFound(id)) => Err(WorkerError::TaskRejected(id)),
                Err(other) => Err(WorkerError::Transport(other.to_string())),
            }
        })
    }
}
