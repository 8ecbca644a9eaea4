// src/compiler/mod.rs

//! Expression compiler: text to a dependency-annotated task DAG.
//!
//! - [`tokenizer`] validates the character set and splits text into tokens.
//! - [`tree`] builds a binary expression tree with operator precedence.
//! - [`emit`] walks the tree children-first and emits one task per operator.

pub mod emit;
pub mod tokenizer;
pub mod tree;

use thiserror::Error;

use crate::config::OperationTimes;
use crate::types::ExpressionId;

pub use emit::{CompiledExpression, ExpressionOutput, TaskIdSequence, TaskSpec, emit_tasks};
pub use tokenizer::{Token, tokenize, validate_expression};
pub use tree::{ExprNode, build_expression_tree};

/// Rejection of an expression at submission time. Nothing is registered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("invalid symbol in expression: {0:?}")]
    InvalidSymbol(char),

    #[error("unbalanced parentheses")]
    UnbalancedParentheses,

    #[error("invalid expression")]
    InvalidExpression,

    #[error("invalid number: {0:?}")]
    InvalidNumber(String),
}

/// Validate, tokenize and parse one expression without emitting tasks.
pub fn parse_expression(text: &str) -> Result<ExprNode, SyntaxError> {
    validate_expression(text)?;
    let tokens = tokenize(text)?;
    build_expression_tree(&tokens)
}

/// Validate, tokenize, parse and emit tasks for one expression.
///
/// Task IDs are drawn from `ids`, which is shared by every expression the
/// caller compiles.
pub fn compile_expression(
    text: &str,
    expression_id: ExpressionId,
    ids: &TaskIdSequence,
    times: &OperationTimes,
) -> Result<CompiledExpression, SyntaxError> {
    let tree = parse_expression(text)?;
    Ok(emit_tasks(expression_id, &tree, ids, times))
}
