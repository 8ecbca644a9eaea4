// src/compiler/emit.rs

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::compiler::tree::ExprNode;
use crate::config::OperationTimes;
use crate::types::{Argument, ExpressionId, Operator, TaskId};

/// The single authoritative source of task IDs.
///
/// Shared by every expression, so IDs are unique and increase in creation
/// order across the whole process.
#[derive(Debug)]
pub struct TaskIdSequence {
    next: AtomicU64,
}

impl TaskIdSequence {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    pub fn next_id(&self) -> TaskId {
        TaskId(self.next.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for TaskIdSequence {
    fn default() -> Self {
        Self::new()
    }
}

/// A task record as emitted by the compiler, before the store tracks state.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSpec {
    pub id: TaskId,
    pub expression_id: ExpressionId,
    pub arg1: Argument,
    pub arg2: Argument,
    pub operator: Operator,
    pub operation_time: Duration,
}

impl TaskSpec {
    /// Tasks this one reads results from.
    pub fn dependencies(&self) -> impl Iterator<Item = TaskId> + '_ {
        [self.arg1, self.arg2].into_iter().filter_map(|arg| arg.task_ref())
    }
}

/// Where an expression's final value comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExpressionOutput {
    /// The expression was a bare number; no tasks were emitted.
    Literal(f64),
    /// The root task, whose result is the expression's result.
    Task(TaskId),
}

/// Output of the compiler for one expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    pub expression_id: ExpressionId,
    /// Tasks in emission order: every task appears after the tasks it
    /// references.
    pub tasks: Vec<TaskSpec>,
    pub output: ExpressionOutput,
}

impl CompiledExpression {
    pub fn root_task(&self) -> Option<TaskId> {
        match self.output {
            ExpressionOutput::Task(id) => Some(id),
            ExpressionOutput::Literal(_) => None,
        }
    }
}

/// Post-order walk of the tree emitting one task per operator node.
///
/// The walk keeps its own stack of open operator nodes, so arbitrarily deep
/// trees compile in constant call depth.
pub fn emit_tasks(
    expression_id: ExpressionId,
    root: &ExprNode,
    ids: &TaskIdSequence,
    times: &OperationTimes,
) -> CompiledExpression {
    let mut tasks = Vec::with_capacity(root.operator_count());
    let output = match emit_post_order(root, |op, arg1, arg2| {
        // Children are emitted first, so this ID is larger than any task it
        // references.
        let id = ids.next_id();
        tasks.push(TaskSpec {
            id,
            expression_id,
            arg1,
            arg2,
            operator: op,
            operation_time: times.for_operator(op),
        });
        Argument::TaskRef(id)
    }) {
        Argument::Literal(value) => ExpressionOutput::Literal(value),
        Argument::TaskRef(id) => ExpressionOutput::Task(id),
    };

    CompiledExpression {
        expression_id,
        tasks,
        output,
    }
}

/// Operator node whose left operand is being (or has been) emitted.
struct OpenNode<'a> {
    op: Operator,
    right: &'a ExprNode,
    arg1: Option<Argument>,
}

/// Left-to-right post-order traversal. `emit` is called once per operator
/// node with its operands and returns the argument that stands for it.
fn emit_post_order<'a, F>(root: &'a ExprNode, mut emit: F) -> Argument
where
    F: FnMut(Operator, Argument, Argument) -> Argument,
{
    let mut open: Vec<OpenNode<'a>> = Vec::new();
    let mut node = root;

    'descend: loop {
        let mut value = loop {
            match node {
                ExprNode::Literal(value) => break Argument::Literal(*value),
                ExprNode::Binary { op, left, right } => {
                    open.push(OpenNode {
                        op: *op,
                        right: &**right,
                        arg1: None,
                    });
                    node = &**left;
                }
            }
        };

        loop {
            let Some(top) = open.last_mut() else {
                return value;
            };
            match top.arg1 {
                None => {
                    top.arg1 = Some(value);
                    node = top.right;
                    continue 'descend;
                }
                Some(arg1) => {
                    let op = top.op;
                    open.pop();
                    value = emit(op, arg1, value);
                }
            }
        }
    }
}
