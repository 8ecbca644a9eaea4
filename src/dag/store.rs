// src/dag/store.rs

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::compiler::{
    CompiledExpression, ExpressionOutput, TaskIdSequence, emit_tasks, parse_expression,
};
use crate::config::{ConfigFile, OperationTimes};
use crate::dag::graph::TaskGraph;
use crate::dag::scheduler_step::CompletionStep;
use crate::dag::state_manager::{ExpressionTasks, StateManager, TaskTable};
use crate::dag::task_info::{ClaimedTask, ExpressionRecord, TaskInfo, TaskState};
use crate::errors::{CalcError, Result};
use crate::types::{ExpressionId, ExpressionStatus, TaskId};

/// Scheduler state: every expression and task, behind two locks.
///
/// Lock order: whenever both are needed, the task lock is taken before the
/// expression lock. Critical sections contain map operations only.
#[derive(Debug)]
pub struct TaskGraphStore {
    tasks: Mutex<TaskTable>,
    expressions: Mutex<BTreeMap<ExpressionId, ExpressionRecord>>,
    task_ids: TaskIdSequence,
    next_expression_id: AtomicU64,
    operation_times: OperationTimes,
    claim_lease: Option<Duration>,
}

impl TaskGraphStore {
    pub fn new(operation_times: OperationTimes) -> Self {
        Self::with_task_ids(operation_times, TaskIdSequence::new())
    }

    /// Use a specific task ID sequence (e.g. to start at a given ID).
    pub fn with_task_ids(operation_times: OperationTimes, task_ids: TaskIdSequence) -> Self {
        Self {
            tasks: Mutex::new(TaskTable::default()),
            expressions: Mutex::new(BTreeMap::new()),
            task_ids,
            next_expression_id: AtomicU64::new(1),
            operation_times,
            claim_lease: None,
        }
    }

    /// Construct a store from a validated [`ConfigFile`].
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self::new(cfg.operation_times()).with_claim_lease(cfg.claim_lease())
    }

    /// Enable (or disable with `None`) the claim lease.
    ///
    /// With a lease, [`TaskGraphStore::sweep`] returns tasks claimed longer
    /// than `lease` ago to `Pending`. Without one, an abandoned claim stays
    /// `InProgress` forever.
    pub fn with_claim_lease(mut self, lease: Option<Duration>) -> Self {
        self.claim_lease = lease;
        self
    }

    pub fn claim_lease(&self) -> Option<Duration> {
        self.claim_lease
    }

    pub fn operation_times(&self) -> &OperationTimes {
        &self.operation_times
    }

    fn lock_tasks(&self) -> MutexGuard<'_, TaskTable> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_expressions(&self) -> MutexGuard<'_, BTreeMap<ExpressionId, ExpressionRecord>> {
        self.expressions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn allocate_expression_id(&self) -> ExpressionId {
        ExpressionId(self.next_expression_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Compile `text` and register the expression with its tasks.
    ///
    /// Compilation happens outside the locks. On a syntax error nothing is
    /// registered and no expression ID is consumed. The expression record and
    /// its tasks become visible in a single critical section, and readiness
    /// is computed before returning.
    pub fn create_expression(&self, text: &str) -> Result<ExpressionId> {
        let tree = parse_expression(text)?;
        let expression_id = self.allocate_expression_id();
        let compiled = emit_tasks(expression_id, &tree, &self.task_ids, &self.operation_times);
        drop(tree);
        TaskGraph::from_compiled(&compiled)?;

        let task_count = compiled.tasks.len();
        let mut record = ExpressionRecord::new(expression_id, text.trim());

        let mut tasks = self.lock_tasks();
        match compiled.output {
            ExpressionOutput::Literal(value) => record.mark_done(value),
            ExpressionOutput::Task(root) => insert_tasks(&mut tasks, expression_id, root, compiled),
        }
        let newly_ready = StateManager::new(&mut tasks).recompute_readiness(expression_id);

        let mut expressions = self.lock_expressions();
        expressions.insert(expression_id, record);
        drop(expressions);
        drop(tasks);

        info!(
            expression = %expression_id,
            tasks = task_count,
            ready = newly_ready.len(),
            "expression registered"
        );
        Ok(expression_id)
    }

    /// Insert the tasks of an already compiled expression.
    ///
    /// No expression record is created, so the expression never reaches
    /// `done`; [`create_expression`] is the normal entry point. Readiness is
    /// not computed here; call [`recompute_readiness`] afterwards.
    ///
    /// [`create_expression`]: TaskGraphStore::create_expression
    /// [`recompute_readiness`]: TaskGraphStore::recompute_readiness
    pub fn register(&self, compiled: CompiledExpression) -> Result<()> {
        TaskGraph::from_compiled(&compiled)?;

        let Some(root) = compiled.root_task() else {
            return Ok(());
        };
        let expression_id = compiled.expression_id;

        let mut tasks = self.lock_tasks();
        if let Some(existing) = compiled.tasks.iter().find(|t| tasks.tasks.contains_key(&t.id)) {
            return Err(CalcError::InvalidGraph(format!(
                "{} is already registered",
                existing.id
            )));
        }
        insert_tasks(&mut tasks, expression_id, root, compiled);
        Ok(())
    }

    /// Recompute readiness for every unsettled task of one expression.
    ///
    /// Returns the tasks that became `Ready`.
    pub fn recompute_readiness(&self, expression_id: ExpressionId) -> Vec<TaskId> {
        let mut tasks = self.lock_tasks();
        StateManager::new(&mut tasks).recompute_readiness(expression_id)
    }

    /// Periodic maintenance pass.
    ///
    /// - With a claim lease configured, expired claims go back to `Pending`.
    /// - Readiness is recomputed for every pending expression, which covers
    ///   any cascade that was missed.
    ///
    /// Returns the number of tasks that became `Ready`.
    pub fn sweep(&self) -> usize {
        if let Some(lease) = self.claim_lease {
            let reclaimed = self.reclaim_expired_claims(lease, Instant::now());
            if !reclaimed.is_empty() {
                debug!(count = reclaimed.len(), "sweep reclaimed expired claims");
            }
        }

        let pending: Vec<ExpressionId> = self
            .lock_expressions()
            .values()
            .filter(|record| record.status == ExpressionStatus::Pending)
            .map(|record| record.id)
            .collect();

        let mut tasks = self.lock_tasks();
        let mut manager = StateManager::new(&mut tasks);
        let newly_ready: usize = pending
            .into_iter()
            .map(|id| manager.recompute_readiness(id).len())
            .sum();

        if newly_ready > 0 {
            debug!(newly_ready, "readiness sweep found new ready tasks");
        }
        newly_ready
    }

    /// Return claims older than `lease` (measured at `now`) to `Pending` and
    /// recompute readiness of the affected expressions.
    pub fn reclaim_expired_claims(&self, lease: Duration, now: Instant) -> Vec<TaskId> {
        let mut tasks = self.lock_tasks();
        let mut manager = StateManager::new(&mut tasks);
        let reclaimed = manager.reclaim_expired(lease, now);

        let mut expressions: Vec<ExpressionId> = reclaimed.iter().map(|(_, e)| *e).collect();
        expressions.sort();
        expressions.dedup();
        for expression_id in expressions {
            manager.recompute_readiness(expression_id);
        }

        reclaimed.into_iter().map(|(task, _)| task).collect()
    }

    /// Claim any `Ready` task for exclusive processing.
    pub fn claim_ready_task(&self) -> Option<ClaimedTask> {
        let mut tasks = self.lock_tasks();
        let claimed = StateManager::new(&mut tasks).claim_next(Instant::now())?;
        debug!(task = %claimed.id, expression = %claimed.expression_id, "task claimed");
        Some(claimed)
    }

    /// Accept a result for a task and cascade.
    ///
    /// - Unknown task: [`CalcError::TaskNotFound`], nothing changes.
    /// - Already completed: the first result stands; the step is flagged
    ///   `duplicate`.
    /// - Otherwise the task is `Completed`, readiness of its expression is
    ///   recomputed, and if every task of the expression is now complete the
    ///   expression becomes `done` with the root task's result.
    pub fn complete_task(&self, task_id: TaskId, result: f64) -> Result<CompletionStep> {
        let mut tasks = self.lock_tasks();

        let info = tasks
            .tasks
            .get_mut(&task_id)
            .ok_or(CalcError::TaskNotFound(task_id))?;
        let expression_id = info.expression_id;

        if info.state == TaskState::Completed {
            warn!(
                task = %task_id,
                expression = %expression_id,
                "result for already completed task; ignoring"
            );
            return Ok(CompletionStep {
                task: task_id,
                expression_id,
                newly_ready: Vec::new(),
                expression_result: None,
                duplicate: true,
            });
        }

        info.state = TaskState::Completed;
        info.result = Some(result);
        info.claimed_at = None;
        debug!(task = %task_id, expression = %expression_id, result, "task completed");
        tasks.ready.remove(&task_id);

        let mut manager = StateManager::new(&mut tasks);
        let newly_ready = manager.recompute_readiness(expression_id);
        let expression_result = manager.expression_result(expression_id);

        if let Some(value) = expression_result {
            let mut expressions = self.lock_expressions();
            match expressions.get_mut(&expression_id) {
                Some(record) => {
                    record.mark_done(value);
                    info!(expression = %expression_id, result = value, "expression done");
                }
                None => {
                    warn!(expression = %expression_id, "tasks finished for unknown expression");
                }
            }
        }

        Ok(CompletionStep {
            task: task_id,
            expression_id,
            newly_ready,
            expression_result,
            duplicate: false,
        })
    }

    /// Result of a completed task.
    pub fn task_result(&self, task_id: TaskId) -> Result<f64> {
        let tasks = self.lock_tasks();
        let info = tasks
            .tasks
            .get(&task_id)
            .ok_or(CalcError::TaskNotFound(task_id))?;
        match (info.state, info.result) {
            (TaskState::Completed, Some(result)) => Ok(result),
            _ => Err(CalcError::TaskNotCompleted(task_id)),
        }
    }

    pub fn task_state(&self, task_id: TaskId) -> Option<TaskState> {
        self.lock_tasks().tasks.get(&task_id).map(|info| info.state)
    }

    /// Snapshot of one expression's tasks in emission order.
    pub fn expression_tasks(&self, expression_id: ExpressionId) -> Vec<TaskInfo> {
        let tasks = self.lock_tasks();
        let Some(entry) = tasks.by_expression.get(&expression_id) else {
            return Vec::new();
        };
        entry
            .order
            .iter()
            .filter_map(|id| tasks.tasks.get(id).cloned())
            .collect()
    }

    pub fn get_expression(&self, expression_id: ExpressionId) -> Result<ExpressionRecord> {
        self.lock_expressions()
            .get(&expression_id)
            .cloned()
            .ok_or(CalcError::ExpressionNotFound(expression_id))
    }

    /// All expressions, ordered by ID.
    pub fn list_expressions(&self) -> Vec<ExpressionRecord> {
        self.lock_expressions().values().cloned().collect()
    }
}

fn insert_tasks(
    table: &mut TaskTable,
    expression_id: ExpressionId,
    root: TaskId,
    compiled: CompiledExpression,
) {
    let order: Vec<TaskId> = compiled.tasks.iter().map(|t| t.id).collect();
    for spec in compiled.tasks {
        table.tasks.insert(spec.id, TaskInfo::from_spec(spec));
    }
    table
        .by_expression
        .insert(expression_id, ExpressionTasks { order, root });
}
