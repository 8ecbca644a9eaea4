// src/dag/mod.rs

//! Task DAG representation and scheduling state.
//!
//! - [`graph`] checks and describes the dependency graph of one expression.
//! - [`store`] holds every expression and task and implements readiness,
//!   claims and completion cascades.
//! - [`state_manager`] contains the per-table state transitions the store
//!   runs under its task lock.
//! - [`task_info`] provides task and expression records.
//! - [`scheduler_step`] defines the result type of a completion.

pub mod graph;
pub mod scheduler_step;
pub mod state_manager;
pub mod store;
pub mod task_info;

pub use graph::TaskGraph;
pub use scheduler_step::CompletionStep;
pub use store::TaskGraphStore;
pub use task_info::{ClaimedTask, ExpressionRecord, TaskInfo, TaskState};
