//! Parser error types

use thiserror::Error;

/// Parse error type
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    #[error("Unterminated string literal in: {0}")]
    UnterminatedString(String),
}

pub type Result<T> = std::result::Result<T, ParseError>;
