//! IR instructions
//!
//! Low-level instructions for the stack-based expression executor.

use crate::ast::{Operator, UnaryOperator};
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// A single IR instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// Load a field value from the activation onto the stack
    LoadField {
        /// Field path (e.g., ["tx", "debtor_id"])
        path: Vec<String>,
    },

    /// Load a constant value onto the stack
    LoadConst {
        /// The constant value
        value: Value,
    },

    /// Perform an arithmetic or logical binary operation
    BinaryOp {
        /// The operator to apply
        op: Operator,
    },

    /// Perform a comparison operation (== != < > <= >=)
    Compare {
        /// The comparison operator
        op: Operator,
    },

    /// Perform a unary operation (! -)
    UnaryOp {
        /// The unary operator
        op: UnaryOperator,
    },

    /// Unconditional jump relative to the current instruction
    Jump {
        /// Offset to jump (can be negative)
        offset: isize,
    },

    /// Pop the stack and jump if the value is true
    JumpIfTrue {
        /// Offset to jump
        offset: isize,
    },

    /// Pop the stack and jump if the value is false
    JumpIfFalse {
        /// Offset to jump
        offset: isize,
    },

    /// Stop execution; the top of the stack is the program result
    Return,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_instructions() {
        let load_field = Instruction::LoadField {
            path: vec!["tx".to_string(), "amount".to_string()],
        };
        let load_const = Instruction::LoadConst {
            value: Value::Number(42.0),
        };

        assert!(matches!(load_field, Instruction::LoadField { .. }));
        assert!(matches!(load_const, Instruction::LoadConst { .. }));
    }

    #[test]
    fn test_control_flow_instructions() {
        let jump = Instruction::Jump { offset: 10 };
        let jump_if_false = Instruction::JumpIfFalse { offset: -3 };

        assert!(matches!(jump, Instruction::Jump { offset: 10 }));
        assert!(matches!(
            jump_if_false,
            Instruction::JumpIfFalse { offset: -3 }
        ));
    }

    #[test]
    fn test_instruction_serde() {
        let inst = Instruction::Compare { op: Operator::Ge };

        let json = serde_json::to_string(&inst).unwrap();
        assert!(json.contains("Compare"));

        let back: Instruction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, inst);
    }
}
