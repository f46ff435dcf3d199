//! Kestrel Compiler - turns rule expression text into executable programs
//!
//! Compilation is pure and deterministic: parse into an AST, type-check
//! against the fixed activation schema, then generate stack-machine IR.
//! The same text always produces an equivalent program.

mod codegen;
mod error;
mod typecheck;

pub use codegen::ExpressionCompiler;
pub use error::{CompileError, Result};
pub use typecheck::{ExprType, TypeChecker};

use kestrel_core::ir::{Instruction, Program, ProgramMetadata};
use kestrel_parser::ExpressionParser;

/// Rule expression compiler entry point.
pub struct RuleCompiler;

impl RuleCompiler {
    /// Compile an expression into a reusable program.
    ///
    /// Fails if the expression does not parse, references an undeclared
    /// variable, or cannot return a bool or numeric value.
    pub fn compile(expression: &str) -> Result<Program> {
        let ast = ExpressionParser::parse(expression)?;
        TypeChecker::check(&ast)?;

        let mut instructions = ExpressionCompiler::compile(&ast)?;
        instructions.push(Instruction::Return);

        Ok(Program::new(
            instructions,
            ProgramMetadata::for_expression(expression),
        ))
    }
}
