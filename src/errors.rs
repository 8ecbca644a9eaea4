// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::compiler::SyntaxError;
use crate::exec::WorkerError;
use crate::types::{ExpressionId, TaskId};

#[derive(Error, Debug)]
pub enum CalcError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("Expression not found: {0}")]
    ExpressionNotFound(ExpressionId),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Task not completed: {0}")]
    TaskNotCompleted(TaskId),

    #[error("Invalid task graph: {0}")]
    InvalidGraph(String),

    #[error(transparent)]
    Worker(#[from] WorkerError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, CalcError>;
