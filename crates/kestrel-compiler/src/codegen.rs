//! Expression code generation
//!
//! Compiles Expression AST nodes into IR instructions for the stack executor.

use crate::error::Result;
use kestrel_core::ast::Expression;
use kestrel_core::ir::Instruction;

/// Expression compiler
pub struct ExpressionCompiler;

impl ExpressionCompiler {
    /// Compile an expression into IR instructions
    pub fn compile(expr: &Expression) -> Result<Vec<Instruction>> {
        match expr {
            Expression::Literal(value) => Ok(vec![Instruction::LoadConst {
                value: value.clone(),
            }]),

            Expression::FieldAccess(path) => Ok(vec![Instruction::LoadField { path: path.clone() }]),

            Expression::Binary { left, op, right } => {
                let mut instructions = Vec::new();

                instructions.extend(Self::compile(left)?);
                instructions.extend(Self::compile(right)?);

                if op.is_comparison() {
                    instructions.push(Instruction::Compare { op: *op });
                } else {
                    instructions.push(Instruction::BinaryOp { op: *op });
                }

                Ok(instructions)
            }

            Expression::Unary { op, operand } => {
                let mut instructions = Self::compile(operand)?;
                instructions.push(Instruction::UnaryOp { op: *op });
                Ok(instructions)
            }

            Expression::Ternary {
                condition,
                true_expr,
                false_expr,
            } => {
                let mut instructions = Self::compile(condition)?;

                let true_instructions = Self::compile(true_expr)?;
                let false_instructions = Self::compile(false_expr)?;

                // Layout:
                //   <condition>
                //   JumpIfFalse  --+   (to first false instruction)
                //   <true branch>  |
                //   Jump  ---------|-+ (past the false branch)
                //   <false branch><+ |
                //   ...          <---+
                //
                // Jumps are pc-relative: pc = pc + offset, so skipping N
                // instructions takes an offset of N + 1.
                instructions.push(Instruction::JumpIfFalse {
                    offset: (true_instructions.len() + 2) as isize,
                });
                instructions.extend(true_instructions);
                instructions.push(Instruction::Jump {
                    offset: (false_instructions.len() + 1) as isize,
                });
                instructions.extend(false_instructions);

                Ok(instructions)
            }
        }
    }
}
