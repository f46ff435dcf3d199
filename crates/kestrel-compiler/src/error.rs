//! Compiler error types

use kestrel_parser::ParseError;
use thiserror::Error;

/// Compile error type
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Undeclared variable: {0}")]
    UndeclaredVariable(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Expression must return bool, int, or real, got {0}")]
    InvalidReturnType(String),
}

pub type Result<T> = std::result::Result<T, CompileError>;
