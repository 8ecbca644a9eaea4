use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use tokio::time::Instant;

use calcdag::dag::ClaimedTask;
use calcdag::exec::{DispatchClient, DispatchFuture};
use calcdag::types::TaskId;

/// A scripted dispatch client that:
/// - hands out queued tasks in order, then reports "nothing ready"
/// - answers fetches from a result table, optionally only after a number of
///   "not ready" replies
/// - records every fetch (with its time) and every submitted result.
#[derive(Default)]
pub struct FakeDispatch {
    queue: Mutex<VecDeque<ClaimedTask>>,
    results: Mutex<HashMap<TaskId, (f64, u32)>>,
    fetches: Mutex<Vec<(TaskId, Instant)>>,
    submitted: Mutex<Vec<(TaskId, f64)>>,
    claims: Mutex<usize>,
}

impl FakeDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_task(self, task: ClaimedTask) -> Self {
        self.queue.lock().unwrap().push_back(task);
        self
    }

    pub fn with_result(self, task: TaskId, value: f64) -> Self {
        self.with_result_after(task, value, 0)
    }

    /// `task` reports "not ready" for the first `misses` fetches.
    pub fn with_result_after(self, task: TaskId, value: f64, misses: u32) -> Self {
        self.results.lock().unwrap().insert(task, (value, misses));
        self
    }

    pub fn fetch_times(&self, task: TaskId) -> Vec<Instant> {
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == task)
            .map(|(_, at)| *at)
            .collect()
    }

    pub fn fetch_attempts(&self, task: TaskId) -> usize {
        self.fetch_times(task).len()
    }

    pub fn submitted(&self) -> Vec<(TaskId, f64)> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn claim_count(&self) -> usize {
        *self.claims.lock().unwrap()
    }
}

impl DispatchClient for FakeDispatch {
    fn claim_task(&self) -> DispatchFuture<'_, Option<ClaimedTask>> {
        Box::pin(async move {
            *self.claims.lock().unwrap() += 1;
            Ok(self.queue.lock().unwrap().pop_front())
        })
    }

    fn fetch_result(&self, task: TaskId) -> DispatchFuture<'_, Option<f64>> {
        Box::pin(async move {
            self.fetches.lock().unwrap().push((task, Instant::now()));

            let mut results = self.results.lock().unwrap();
            match results.get_mut(&task) {
                Some((_, misses)) if *misses > 0 => {
                    *misses -= 1;
                    Ok(None)
                }
                Some((value, _)) => Ok(Some(*value)),
                None => Ok(None),
            }
        })
    }

    fn submit_result(&self, task: TaskId, result: f64) -> DispatchFuture<'_, ()> {
        Box::pin(async move {
            self.submitted.lock().unwrap().push((task, result));
            Ok(())
        })
    }
}
