//! IR program
//!
//! A program is a sequence of IR instructions plus metadata about its source
//! expression. Programs are immutable after compilation and shared across all
//! evaluations that use the same rule snapshot.

use crate::ir::Instruction;
use serde::{Deserialize, Serialize};

/// A compiled expression ready for execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// The sequence of instructions
    pub instructions: Vec<Instruction>,

    /// Program metadata
    pub metadata: ProgramMetadata,
}

/// Metadata associated with a program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramMetadata {
    /// The source expression text
    pub source: String,

    /// Version of the compiler that generated this program
    pub compiler_version: String,
}

impl Program {
    /// Create a new program
    pub fn new(instructions: Vec<Instruction>, metadata: ProgramMetadata) -> Self {
        Self {
            instructions,
            metadata,
        }
    }

    /// Get the number of instructions
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// Check if program is empty
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl ProgramMetadata {
    /// Create metadata for a compiled expression
    pub fn for_expression(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            compiler_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
