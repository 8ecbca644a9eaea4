// src/compiler/tree.rs

use crate::compiler::SyntaxError;
use crate::compiler::tokenizer::Token;
use crate::types::Operator;

/// Node of the binary expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprNode {
    Literal(f64),
    Binary {
        op: Operator,
        left: Box<ExprNode>,
        right: Box<ExprNode>,
    },
}

impl ExprNode {
    /// Number of operator nodes, i.e. the number of tasks this tree emits.
    pub fn operator_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if let ExprNode::Binary { left, right, .. } = node {
                count += 1;
                stack.push(left);
                stack.push(right);
            }
        }
        count
    }
}

// Chains like `1+1+...+1` are as deep as they are long; dropping through an
// explicit stack keeps the call depth constant.
impl Drop for ExprNode {
    fn drop(&mut self) {
        let mut stack = Vec::new();
        detach_children(self, &mut stack);
        while let Some(mut node) = stack.pop() {
            detach_children(&mut node, &mut stack);
        }
    }
}

fn detach_children(node: &mut ExprNode, stack: &mut Vec<ExprNode>) {
    if let ExprNode::Binary { left, right, .. } = node {
        stack.push(std::mem::replace(left.as_mut(), ExprNode::Literal(0.0)));
        stack.push(std::mem::replace(right.as_mut(), ExprNode::Literal(0.0)));
    }
}

/// Entry on the operator stack.
#[derive(Debug, Clone, Copy)]
enum Pending {
    Op(Operator),
    LeftParen,
}

/// Shunting-yard construction of the expression tree.
///
/// Operators of equal precedence reduce eagerly, so everything is
/// left-associative. There are no unary operators: `-1` has too few operands
/// and fails with [`SyntaxError::InvalidExpression`].
pub fn build_expression_tree(tokens: &[Token]) -> Result<ExprNode, SyntaxError> {
    let mut output: Vec<ExprNode> = Vec::new();
    let mut operators: Vec<Pending> = Vec::new();

    for token in tokens {
        match *token {
            Token::Number(value) => output.push(ExprNode::Literal(value)),
            Token::Operator(op) => {
                while let Some(Pending::Op(top)) = operators.last().copied() {
                    if top.precedence() < op.precedence() {
                        break;
                    }
                    operators.pop();
                    reduce(&mut output, top)?;
                }
                operators.push(Pending::Op(op));
            }
            Token::LeftParen => operators.push(Pending::LeftParen),
            Token::RightParen => loop {
                match operators.pop() {
                    Some(Pending::Op(op)) => reduce(&mut output, op)?,
                    Some(Pending::LeftParen) => break,
                    None => return Err(SyntaxError::UnbalancedParentheses),
                }
            },
        }
    }

    while let Some(entry) = operators.pop() {
        match entry {
            Pending::Op(op) => reduce(&mut output, op)?,
            Pending::LeftParen => return Err(SyntaxError::UnbalancedParentheses),
        }
    }

    match (output.pop(), output.is_empty()) {
        (Some(root), true) => Ok(root),
        _ => Err(SyntaxError::InvalidExpression),
    }
}

fn reduce(output: &mut Vec<ExprNode>, op: Operator) -> Result<(), SyntaxError> {
    let right = output.pop().ok_or(SyntaxError::InvalidExpression)?;
    let left = output.pop().ok_or(SyntaxError::InvalidExpression)?;
    output.push(ExprNode::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    });
    Ok(())
}
