// src/compiler/tokenizer.rs

use crate::compiler::SyntaxError;
use crate::types::Operator;

/// Lexical token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token {
    Number(f64),
    Operator(Operator),
    LeftParen,
    RightParen,
}

/// Character whitelist and parenthesis balance pre-check.
///
/// Strictly narrower than what tokenizing and parsing enforce afterwards:
/// `1+2a` already fails here, `1++2` passes and fails later.
pub fn validate_expression(text: &str) -> Result<(), SyntaxError> {
    let mut depth: usize = 0;

    for ch in text.chars() {
        match ch {
            '0'..='9' | '.' | '+' | '-' | '*' | '/' => {}
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(SyntaxError::UnbalancedParentheses)?;
            }
            c if c.is_whitespace() => {}
            other => return Err(SyntaxError::InvalidSymbol(other)),
        }
    }

    if depth != 0 {
        return Err(SyntaxError::UnbalancedParentheses);
    }
    Ok(())
}

/// Split expression text into tokens.
///
/// Digits and `.` accumulate into a number; any other character closes it.
/// Whitespace separates tokens and is otherwise dropped, so `1 2` yields two
/// numbers (and is later rejected by the tree builder).
pub fn tokenize(text: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut tokens = Vec::new();
    let mut number = String::new();
    let mut depth: usize = 0;

    for ch in text.chars() {
        if ch.is_ascii_digit() || ch == '.' {
            number.push(ch);
            continue;
        }

        flush_number(&mut number, &mut tokens)?;

        match ch {
            '(' => {
                depth += 1;
                tokens.push(Token::LeftParen);
            }
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(SyntaxError::UnbalancedParentheses)?;
                tokens.push(Token::RightParen);
            }
            c if c.is_whitespace() => {}
            c => match Operator::from_symbol(c) {
                Some(op) => tokens.push(Token::Operator(op)),
                None => return Err(SyntaxError::InvalidSymbol(c)),
            },
        }
    }

    flush_number(&mut number, &mut tokens)?;

    if depth != 0 {
        return Err(SyntaxError::UnbalancedParentheses);
    }
    Ok(tokens)
}

fn flush_number(number: &mut String, tokens: &mut Vec<Token>) -> Result<(), SyntaxError> {
    if number.is_empty() {
        return Ok(());
    }
    // Overlong digit strings parse to infinity instead of failing.
    let value = number
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| SyntaxError::InvalidNumber(number.clone()))?;
    tokens.push(Token::Number(value));
    number.clear();
    Ok(())
}
