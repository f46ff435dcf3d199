//! IR program executor
//!
//! Executes compiled programs in a stack-based virtual machine against a
//! read-only activation. Execution is deterministic and CPU-bound; failures
//! are reported as `RuntimeError` and never abort the process.

use crate::activation::Activation;
use crate::error::RuntimeError;
use crate::operators;
use kestrel_core::ir::{Instruction, Program};
use kestrel_core::Value;

/// IR program executor
pub struct Executor;

impl Executor {
    /// Execute a program against an activation and return its result value.
    pub fn execute(program: &Program, activation: &Activation) -> Result<Value, RuntimeError> {
        let mut stack: Vec<Value> = Vec::with_capacity(8);
        let mut pc = 0usize;

        while pc < program.instructions.len() {
            match &program.instructions[pc] {
                Instruction::LoadField { path } => {
                    stack.push(Self::load_field(activation, path));
                    pc += 1;
                }

                Instruction::LoadConst { value } => {
                    stack.push(value.clone());
                    pc += 1;
                }

                Instruction::BinaryOp { op } => {
                    let right = stack.pop().ok_or(RuntimeError::StackUnderflow)?;
                    let left = stack.pop().ok_or(RuntimeError::StackUnderflow)?;
                    stack.push(operators::execute_binary(&left, op, &right)?);
                    pc += 1;
                }

                Instruction::Compare { op } => {
                    let right = stack.pop().ok_or(RuntimeError::StackUnderflow)?;
                    let left = stack.pop().ok_or(RuntimeError::StackUnderflow)?;
                    stack.push(Value::Bool(operators::execute_compare(&left, op, &right)?));
                    pc += 1;
                }

                Instruction::UnaryOp { op } => {
                    let operand = stack.pop().ok_or(RuntimeError::StackUnderflow)?;
                    stack.push(operators::execute_unary(&operand, op)?);
                    pc += 1;
                }

                Instruction::Jump { offset } => {
                    pc = Self::apply_offset(pc, *offset, program.instructions.len())?;
                }

                Instruction::JumpIfTrue { offset } => {
                    let condition = stack.pop().ok_or(RuntimeError::StackUnderflow)?;
                    if condition.is_truthy() {
                        pc = Self::apply_offset(pc, *offset, program.instructions.len())?;
                    } else {
                        pc += 1;
                    }
                }

                Instruction::JumpIfFalse { offset } => {
                    let condition = stack.pop().ok_or(RuntimeError::StackUnderflow)?;
                    if !condition.is_truthy() {
                        pc = Self::apply_offset(pc, *offset, program.instructions.len())?;
                    } else {
                        pc += 1;
                    }
                }

                Instruction::Return => break,
            }
        }

        stack.pop().ok_or(RuntimeError::StackUnderflow)
    }

    /// Resolve a field path against the activation. Unknown fields resolve to
    /// `Null`; comparisons against `Null` are false rather than errors.
    fn load_field(activation: &Activation, path: &[String]) -> Value {
        let Some(head) = path.first() else {
            return Value::Null;
        };

        let mut current = match activation.get(head) {
            Some(value) => value.clone(),
            None => return Value::Null,
        };

        for segment in &path[1..] {
            current = match current {
                Value::Object(ref map) => map.get(segment).cloned().unwrap_or(Value::Null),
                _ => Value::Null,
            };
        }

        current
    }

    fn apply_offset(pc: usize, offset: isize, len: usize) -> Result<usize, RuntimeError> {
        let target = pc as isize + offset;
        // Landing exactly at `len` terminates the loop, which is fine
        if target < 0 || target as usize > len {
            return Err(RuntimeError::InvalidJump);
        }
        Ok(target as usize)
    }
}
