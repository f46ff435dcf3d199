//! Operator execution for the stack executor

use crate::error::RuntimeError;
use kestrel_core::ast::{Operator, UnaryOperator};
use kestrel_core::Value;

/// Execute an arithmetic or logical binary operation.
pub(crate) fn execute_binary(
    left: &Value,
    op: &Operator,
    right: &Value,
) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => {
            let result = match op {
                Operator::Add => a + b,
                Operator::Sub => a - b,
                Operator::Mul => a * b,
                Operator::Div => {
                    if *b == 0.0 {
                        return Err(RuntimeError::InvalidOperation(
                            "division by zero".to_string(),
                        ));
                    }
                    a / b
                }
                Operator::Mod => {
                    if *b == 0.0 {
                        return Err(RuntimeError::InvalidOperation("modulo by zero".to_string()));
                    }
                    a % b
                }
                _ => {
                    return Err(RuntimeError::TypeError(format!(
                        "invalid operation {} for numbers",
                        op.symbol()
                    )))
                }
            };
            Ok(Value::Number(result))
        }

        (Value::Bool(a), Value::Bool(b)) => {
            let result = match op {
                Operator::And => *a && *b,
                Operator::Or => *a || *b,
                _ => {
                    return Err(RuntimeError::TypeError(format!(
                        "invalid operation {} for booleans",
                        op.symbol()
                    )))
                }
            };
            Ok(Value::Bool(result))
        }

        _ => Err(RuntimeError::TypeError(format!(
            "cannot apply {} to {} and {}",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ))),
    }
}

/// Execute a comparison operation.
///
/// Comparing `null` with anything yields `false`, which lets rules tolerate
/// missing fields instead of erroring.
pub(crate) fn execute_compare(
    left: &Value,
    op: &Operator,
    right: &Value,
) -> Result<bool, RuntimeError> {
    if matches!(left, Value::Null) || matches!(right, Value::Null) {
        return Ok(false);
    }

    match (left, op, right) {
        (Value::Number(l), Operator::Eq, Value::Number(r)) => Ok(l == r),
        (Value::Number(l), Operator::Ne, Value::Number(r)) => Ok(l != r),
        (Value::Number(l), Operator::Gt, Value::Number(r)) => Ok(l > r),
        (Value::Number(l), Operator::Ge, Value::Number(r)) => Ok(l >= r),
        (Value::Number(l), Operator::Lt, Value::Number(r)) => Ok(l < r),
        (Value::Number(l), Operator::Le, Value::Number(r)) => Ok(l <= r),

        (Value::String(l), Operator::Eq, Value::String(r)) => Ok(l == r),
        (Value::String(l), Operator::Ne, Value::String(r)) => Ok(l != r),

        (Value::Bool(l), Operator::Eq, Value::Bool(r)) => Ok(l == r),
        (Value::Bool(l), Operator::Ne, Value::Bool(r)) => Ok(l != r),

        _ => Err(RuntimeError::TypeError(format!(
            "cannot compare {} and {} with {}",
            left.type_name(),
            right.type_name(),
            op.symbol()
        ))),
    }
}

/// Execute a unary operation.
pub(crate) fn execute_unary(operand: &Value, op: &UnaryOperator) -> Result<Value, RuntimeError> {
    match (op, operand) {
        (UnaryOperator::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOperator::Negate, Value::Number(n)) => Ok(Value::Number(-n)),
        _ => Err(RuntimeError::TypeError(format!(
            "cannot apply unary {:?} to {}",
            op,
            operand.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_arithmetic() {
        let result = execute_binary(&Value::Number(6.0), &Operator::Mul, &Value::Number(7.0));
        assert_eq!(result.unwrap(), Value::Number(42.0));
    }

    #[test]
    fn test_division_by_zero_is_an_error() {
        let result = execute_binary(&Value::Number(1.0), &Operator::Div, &Value::Number(0.0));
        assert!(matches!(result, Err(RuntimeError::InvalidOperation(_))));
    }

    #[test]
    fn test_null_comparison_is_false() {
        assert!(!execute_compare(&Value::Null, &Operator::Eq, &Value::Null).unwrap());
        assert!(!execute_compare(&Value::Null, &Operator::Gt, &Value::Number(1.0)).unwrap());
    }

    #[test]
    fn test_string_ordering_is_rejected() {
        let result = execute_compare(
            &Value::String("a".to_string()),
            &Operator::Lt,
            &Value::String("b".to_string()),
        );
        assert!(matches!(result, Err(RuntimeError::TypeError(_))));
    }

    #[test]
    fn test_unary() {
        assert_eq!(
            execute_unary(&Value::Bool(true), &UnaryOperator::Not).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            execute_unary(&Value::Number(5.0), &UnaryOperator::Negate).unwrap(),
            Value::Number(-5.0)
        );
    }
}
