use proptest::prelude::*;

use calcdag::compiler::{ExpressionOutput, TaskIdSequence, compile_expression};
use calcdag::config::OperationTimes;
use calcdag::dag::{TaskGraph, TaskGraphStore};
use calcdag::exec::calculate;
use calcdag::types::{Argument, ExpressionId, Operator};

/// Random expression tree rendered fully parenthesised, plus its value
/// computed directly and its operator count.
#[derive(Debug, Clone)]
enum Expr {
    Num(u32),
    Bin(Box<Expr>, Operator, Box<Expr>),
}

impl Expr {
    fn render(&self) -> String {
        match self {
            Expr::Num(n) => n.to_string(),
            Expr::Bin(l, op, r) => format!("({}{}{})", l.render(), op, r.render()),
        }
    }

    fn eval(&self) -> f64 {
        match self {
            Expr::Num(n) => f64::from(*n),
            Expr::Bin(l, op, r) => {
                // Division is excluded from the strategy, so this never fails.
                calculate(*op, l.eval(), r.eval()).unwrap_or(f64::NAN)
            }
        }
    }

    fn operators(&self) -> usize {
        match self {
            Expr::Num(_) => 0,
            Expr::Bin(l, _, r) => 1 + l.operators() + r.operators(),
        }
    }
}

fn expr_strategy() -> impl Strategy<Value = Expr> {
    let leaf = (0u32..100).prop_map(Expr::Num);
    leaf.prop_recursive(6, 48, 2, |inner| {
        (
            inner.clone(),
            prop_oneof![
                Just(Operator::Add),
                Just(Operator::Subtract),
                Just(Operator::Multiply),
            ],
            inner,
        )
            .prop_map(|(l, op, r)| Expr::Bin(Box::new(l), op, Box::new(r)))
    })
}

/// Claim and complete tasks until none are ready.
fn evaluate_in_store(store: &TaskGraphStore) {
    while let Some(task) = store.claim_ready_task() {
        let resolve = |arg: Argument| match arg {
            Argument::Literal(v) => v,
            Argument::TaskRef(id) => store.task_result(id).unwrap(),
        };
        let value = calculate(task.operator, resolve(task.arg1), resolve(task.arg2)).unwrap();
        store.complete_task(task.id, value).unwrap();
    }
}

proptest! {
    #[test]
    fn compiled_tasks_mirror_the_tree(expr in expr_strategy()) {
        let compiled = compile_expression(
            &expr.render(),
            ExpressionId(1),
            &TaskIdSequence::new(),
            &OperationTimes::zero(),
        ).unwrap();

        prop_assert_eq!(compiled.tasks.len(), expr.operators());
        for (i, task) in compiled.tasks.iter().enumerate() {
            prop_assert!(task.dependencies().all(|dep| compiled.tasks[..i].iter().any(|t| t.id == dep)));
        }

        let graph = TaskGraph::from_compiled(&compiled).unwrap();
        match compiled.output {
            ExpressionOutput::Literal(_) => prop_assert!(graph.is_empty()),
            ExpressionOutput::Task(root) => prop_assert_eq!(graph.sinks(), vec![root]),
        }
    }

    #[test]
    fn store_evaluation_matches_direct_evaluation(expr in expr_strategy()) {
        let store = TaskGraphStore::new(OperationTimes::zero());
        let id = store.create_expression(&expr.render()).unwrap();

        evaluate_in_store(&store);

        let record = store.get_expression(id).unwrap();
        prop_assert!(record.is_done());
        prop_assert_eq!(record.result, Some(expr.eval()));
    }
}
