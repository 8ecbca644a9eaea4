// tests/compiler.rs

use std::time::Duration;

use calcdag::compiler::{
    ExprNode, ExpressionOutput, SyntaxError, TaskIdSequence, Token, build_expression_tree,
    compile_expression, tokenize, validate_expression,
};
use calcdag::config::OperationTimes;
use calcdag::dag::TaskGraph;
use calcdag::types::{Argument, ExpressionId, Operator, TaskId};

fn compile(text: &str) -> Result<calcdag::compiler::CompiledExpression, SyntaxError> {
    compile_expression(
        text,
        ExpressionId(1),
        &TaskIdSequence::new(),
        &OperationTimes::default(),
    )
}

#[test]
fn validation_checks_symbols_and_paren_balance() {
    for ok in ["1+2", "3.14*2", "(1+2)*3"] {
        assert!(compile(ok).is_ok(), "{ok} should compile");
    }

    assert_eq!(validate_expression("1+2a"), Err(SyntaxError::InvalidSymbol('a')));
    assert_eq!(validate_expression("1+2$"), Err(SyntaxError::InvalidSymbol('$')));
    assert_eq!(
        validate_expression("1+(2*3"),
        Err(SyntaxError::UnbalancedParentheses)
    );
    assert_eq!(validate_expression(")1+2("), Err(SyntaxError::UnbalancedParentheses));
}

#[test]
fn malformed_token_sequences_are_rejected() {
    for bad in ["", "1++2", "-1", "1+", "*2", "()", "1 2", "(1)(2)"] {
        assert_eq!(compile(bad), Err(SyntaxError::InvalidExpression), "{bad:?}");
    }
}

#[test]
fn bad_numbers_are_rejected() {
    assert_eq!(
        tokenize("1..2+3"),
        Err(SyntaxError::InvalidNumber("1..2".to_string()))
    );
    assert!(matches!(compile("."), Err(SyntaxError::InvalidNumber(_))));
}

#[test]
fn numbers_beyond_f64_range_are_rejected() {
    let huge = format!("1{}", "0".repeat(400));
    assert_eq!(
        tokenize(&format!("{huge}+1")),
        Err(SyntaxError::InvalidNumber(huge.clone()))
    );
    assert!(matches!(compile(&format!("2*{huge}")), Err(SyntaxError::InvalidNumber(_))));

    // Large but representable values still compile.
    let big = format!("1{}", "0".repeat(300));
    assert!(compile(&format!("{big}+1")).is_ok());
}

#[test]
fn long_operator_chains_compile() {
    const OPERATORS: usize = 200_000;

    let text = format!("1{}", "+1".repeat(OPERATORS));
    let compiled = compile(&text).unwrap();

    assert_eq!(compiled.tasks.len(), OPERATORS);
    assert_eq!(compiled.tasks[0].arg1, Argument::Literal(1.0));
    assert_eq!(compiled.tasks[0].arg2, Argument::Literal(1.0));
    for pair in compiled.tasks.windows(2) {
        assert_eq!(pair[1].arg1, Argument::TaskRef(pair[0].id));
        assert_eq!(pair[1].arg2, Argument::Literal(1.0));
    }
    assert_eq!(
        compiled.output,
        ExpressionOutput::Task(TaskId(OPERATORS as u64))
    );
}

#[test]
fn deeply_nested_right_chains_compile() {
    const DEPTH: usize = 100_000;

    let text = format!("{}1{}", "2*(".repeat(DEPTH), ")".repeat(DEPTH));
    let tree = build_expression_tree(&tokenize(&text).unwrap()).unwrap();
    assert_eq!(tree.operator_count(), DEPTH);
    drop(tree);

    let compiled = compile(&text).unwrap();
    assert_eq!(compiled.tasks.len(), DEPTH);
    // The innermost product is emitted first and the outermost is the root.
    assert_eq!(compiled.tasks[0].arg2, Argument::Literal(1.0));
    assert_eq!(compiled.root_task(), Some(TaskId(DEPTH as u64)));
}

#[test]
fn tokenizer_splits_numbers_operators_and_parens() {
    let tokens = tokenize(" (12.5 + 3)/ 4").unwrap();
    assert_eq!(
        tokens,
        vec![
            Token::LeftParen,
            Token::Number(12.5),
            Token::Operator(Operator::Add),
            Token::Number(3.0),
            Token::RightParen,
            Token::Operator(Operator::Divide),
            Token::Number(4.0),
        ]
    );
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let tokens = tokenize("1+2*3").unwrap();
    let tree = build_expression_tree(&tokens).unwrap();

    let ExprNode::Binary { op, left, right } = &tree else {
        panic!("expected a binary root");
    };
    assert_eq!(*op, Operator::Add);
    assert_eq!(**left, ExprNode::Literal(1.0));
    assert!(matches!(**right, ExprNode::Binary { op: Operator::Multiply, .. }));
}

#[test]
fn equal_precedence_is_left_associative() {
    let compiled = compile("8-3-2").unwrap();
    assert_eq!(compiled.tasks.len(), 2);

    let first = &compiled.tasks[0];
    assert_eq!(first.arg1, Argument::Literal(8.0));
    assert_eq!(first.arg2, Argument::Literal(3.0));

    let second = &compiled.tasks[1];
    assert_eq!(second.arg1, Argument::TaskRef(first.id));
    assert_eq!(second.arg2, Argument::Literal(2.0));
    assert_eq!(compiled.output, ExpressionOutput::Task(second.id));
}

#[test]
fn tasks_are_emitted_children_first_with_increasing_ids() {
    let compiled = compile("(1+2)*(3-4)").unwrap();
    let ids: Vec<TaskId> = compiled.tasks.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![TaskId(1), TaskId(2), TaskId(3)]);

    let root = &compiled.tasks[2];
    assert_eq!(root.operator, Operator::Multiply);
    assert_eq!(root.arg1, Argument::TaskRef(TaskId(1)));
    assert_eq!(root.arg2, Argument::TaskRef(TaskId(2)));

    for task in &compiled.tasks {
        assert!(task.dependencies().all(|dep| dep < task.id));
    }
}

#[test]
fn operation_time_follows_the_operator() {
    let times = OperationTimes {
        addition: Duration::from_millis(1),
        subtraction: Duration::from_millis(2),
        multiplication: Duration::from_millis(3),
        division: Duration::from_millis(4),
    };
    let compiled =
        compile_expression("1+2-3*4/5", ExpressionId(1), &TaskIdSequence::new(), &times).unwrap();

    for task in &compiled.tasks {
        assert_eq!(task.operation_time, times.for_operator(task.operator));
    }
}

#[test]
fn literal_expression_emits_no_tasks() {
    let compiled = compile(" 42 ").unwrap();
    assert!(compiled.tasks.is_empty());
    assert_eq!(compiled.output, ExpressionOutput::Literal(42.0));
    assert_eq!(compiled.root_task(), None);
}

#[test]
fn ids_are_shared_across_expressions() {
    let ids = TaskIdSequence::new();
    let times = OperationTimes::zero();

    let first = compile_expression("1+2", ExpressionId(1), &ids, &times).unwrap();
    let second = compile_expression("3*4", ExpressionId(2), &ids, &times).unwrap();

    assert_eq!(first.root_task(), Some(TaskId(1)));
    assert_eq!(second.root_task(), Some(TaskId(2)));
    assert_eq!(second.tasks[0].expression_id, ExpressionId(2));
}

#[test]
fn task_graph_groups_independent_tasks_into_waves() {
    let compiled = compile("(1+2)*(3+4)-5").unwrap();
    let graph = TaskGraph::from_compiled(&compiled).unwrap();

    assert_eq!(graph.len(), 4);
    assert_eq!(graph.sinks(), vec![TaskId(4)]);
    assert_eq!(graph.dependencies_of(TaskId(3)), vec![TaskId(1), TaskId(2)]);
    assert_eq!(
        graph.waves(),
        vec![vec![TaskId(1), TaskId(2)], vec![TaskId(3)], vec![TaskId(4)]]
    );
}
