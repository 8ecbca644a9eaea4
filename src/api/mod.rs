// src/api/mod.rs

//! HTTP binding of the dispatch protocol and the expression API.
//!
//! | Route | Method | Purpose |
//! |---|---|---|
//! | `/api/v1/calculate` | POST | submit an expression |
//! | `/api/v1/expressions` | GET | list expressions |
//! | `/api/v1/expressions/{id}` | GET | one expression |
//! | `/api/v1/tasks/{id}` | GET | result of a completed task |
//! | `/internal/task` | GET | claim a ready task |
//! | `/internal/task` | POST | submit a task result |

pub mod dto;
pub mod routes;

pub use routes::{ApiError, SharedStore, build_router};
