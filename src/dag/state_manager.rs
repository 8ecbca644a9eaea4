// src/dag/state_manager.rs

//! Readiness, claim and completion bookkeeping over the task table.
//!
//! Everything here runs with the store's task lock held; nothing in this
//! module sleeps or does IO.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::dag::task_info::{ClaimedTask, TaskInfo, TaskState};
use crate::types::{Argument, ExpressionId, TaskId};

/// Task table guarded by the store's task lock.
#[derive(Debug, Default)]
pub struct TaskTable {
    pub tasks: BTreeMap<TaskId, TaskInfo>,
    pub by_expression: HashMap<ExpressionId, ExpressionTasks>,
    /// IDs of `Ready` tasks. May hold stale entries for tasks that left
    /// `Ready` elsewhere; claiming skips those.
    pub ready: BTreeSet<TaskId>,
}

/// Tasks of one expression, in compiler emission order, plus its root.
#[derive(Debug, Clone)]
pub struct ExpressionTasks {
    pub order: Vec<TaskId>,
    pub root: TaskId,
}

/// Manages state transitions for tasks.
pub struct StateManager<'a> {
    table: &'a mut TaskTable,
}

impl<'a> StateManager<'a> {
    pub fn new(table: &'a mut TaskTable) -> Self {
        Self { table }
    }

    /// Recompute `Ready` for every task of the expression that is neither
    /// `Completed` nor `InProgress`.
    ///
    /// Returns the tasks that moved to `Ready` in this call.
    pub fn recompute_readiness(&mut self, expression_id: ExpressionId) -> Vec<TaskId> {
        // Decide first, then mutate to avoid borrowing issues.
        let decisions: Vec<(TaskId, bool)> = match self.table.by_expression.get(&expression_id) {
            Some(entry) => {
                let ro = ReadOnlyStateManager::new(&self.table.tasks);
                entry
                    .order
                    .iter()
                    .filter_map(|id| self.table.tasks.get(id))
                    .filter(|info| !info.is_settled())
                    .map(|info| (info.id, ro.args_ready(info)))
                    .collect()
            }
            None => return Vec::new(),
        };

        let mut newly_ready = Vec::new();
        for (id, ready) in decisions {
            let Some(info) = self.table.tasks.get_mut(&id) else {
                continue;
            };
            if ready && info.state != TaskState::Ready {
                debug!(task = %id, expression = %expression_id, "dependencies satisfied; marking Ready");
                newly_ready.push(id);
            }
            if ready {
                info.state = TaskState::Ready;
                self.table.ready.insert(id);
            } else {
                info.state = TaskState::Pending;
                self.table.ready.remove(&id);
            }
        }

        newly_ready
    }

    /// Claim one `Ready` task: flip it to `InProgress` and return it.
    ///
    /// Picks the lowest task ID. Callers must not rely on that order.
    /// Only the ready set is consulted, never the whole table.
    pub fn claim_next(&mut self, now: Instant) -> Option<ClaimedTask> {
        loop {
            let id = self.table.ready.pop_first()?;
            let Some(info) = self.table.tasks.get_mut(&id) else {
                continue;
            };
            if info.state != TaskState::Ready {
                continue;
            }

            info.state = TaskState::InProgress;
            info.claimed_at = Some(now);
            return Some(ClaimedTask::from_task_info(info));
        }
    }

    /// If every task of the expression is `Completed`, the root's result.
    pub fn expression_result(&self, expression_id: ExpressionId) -> Option<f64> {
        let entry = self.table.by_expression.get(&expression_id)?;
        let all_completed = entry.order.iter().all(|id| {
            self.table
                .tasks
                .get(id)
                .is_some_and(|info| info.state == TaskState::Completed)
        });
        if !all_completed {
            return None;
        }
        self.table.tasks.get(&entry.root).and_then(|root| root.result)
    }

    /// Return claims older than `lease` to `Pending`.
    ///
    /// Returns the affected `(task, expression)` pairs so the caller can
    /// recompute readiness for those expressions.
    pub fn reclaim_expired(
        &mut self,
        lease: Duration,
        now: Instant,
    ) -> Vec<(TaskId, ExpressionId)> {
        let mut reclaimed = Vec::new();

        for info in self.table.tasks.values_mut() {
            if info.state != TaskState::InProgress {
                continue;
            }
            let Some(claimed_at) = info.claimed_at else {
                continue;
            };
            if now.saturating_duration_since(claimed_at) >= lease {
                warn!(
                    task = %info.id,
                    expression = %info.expression_id,
                    lease_ms = lease.as_millis() as u64,
                    "claim lease expired; returning task to Pending"
                );
                info.state = TaskState::Pending;
                info.claimed_at = None;
                reclaimed.push((info.id, info.expression_id));
            }
        }

        reclaimed
    }
}

/// A read-only view for checking argument readiness.
pub struct ReadOnlyStateManager<'a> {
    tasks: &'a BTreeMap<TaskId, TaskInfo>,
}

impl<'a> ReadOnlyStateManager<'a> {
    pub fn new(tasks: &'a BTreeMap<TaskId, TaskInfo>) -> Self {
        Self { tasks }
    }

    /// A literal is always ready; a reference is ready once its target is
    /// `Completed`.
    pub fn arg_ready(&self, arg: &Argument) -> bool {
        match arg {
            Argument::Literal(_) => true,
            Argument::TaskRef(dep) => match self.tasks.get(dep) {
                Some(target) => target.state == TaskState::Completed,
                None => {
                    warn!(dep = %dep, "referenced task missing from task table");
                    false
                }
            },
        }
    }

    pub fn args_ready(&self, info: &TaskInfo) -> bool {
        self.arg_ready(&info.arg1) && self.arg_ready(&info.arg2)
    }
}
