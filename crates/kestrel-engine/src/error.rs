//! Engine error types

use kestrel_compiler::CompileError;
use thiserror::Error;

/// Errors from engine management operations (load, reload, validate).
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to compile rule {rule_id}: {source}")]
    Compile {
        rule_id: String,
        #[source]
        source: CompileError,
    },

    #[error("rule config is required")]
    MissingConfig,
}

/// Errors raised while executing a compiled program.
///
/// These are recoverable per rule: the failing rule yields an `.err` outcome
/// and the evaluation continues.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("type error: {0}")]
    TypeError(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("stack underflow")]
    StackUnderflow,

    #[error("jump out of bounds")]
    InvalidJump,
}
