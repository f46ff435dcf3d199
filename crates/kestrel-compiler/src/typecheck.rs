//! Semantic analysis for rule expressions
//!
//! Types every expression against the fixed activation schema and rejects
//! programs whose result cannot be coerced to a score. `tx.*` lookups and
//! values supplied through `additional_data` are dynamically typed; the
//! checker treats them as `Dyn` and defers to runtime coercion.

use crate::error::{CompileError, Result};
use kestrel_core::ast::{Expression, Operator, UnaryOperator};
use kestrel_core::Value;

/// Static type of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprType {
    Bool,
    Number,
    String,
    Null,
    /// Unknown until runtime (map lookups)
    Dyn,
}

impl ExprType {
    fn name(&self) -> &'static str {
        match self {
            ExprType::Bool => "bool",
            ExprType::Number => "number",
            ExprType::String => "string",
            ExprType::Null => "null",
            ExprType::Dyn => "dyn",
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self, ExprType::Number | ExprType::Dyn)
    }

    fn is_boolean(&self) -> bool {
        matches!(self, ExprType::Bool | ExprType::Dyn)
    }
}

/// Type checker for the activation schema.
pub struct TypeChecker;

impl TypeChecker {
    /// Check that the expression is well-typed and returns bool or number.
    pub fn check(expr: &Expression) -> Result<()> {
        match Self::infer(expr)? {
            ExprType::Bool | ExprType::Number | ExprType::Dyn => Ok(()),
            other => Err(CompileError::InvalidReturnType(other.name().to_string())),
        }
    }

    /// Static type of a declared activation variable, if it exists.
    fn variable_type(name: &str) -> Option<ExprType> {
        match name {
            "tx" => Some(ExprType::Dyn),
            "amount" | "old_balance" | "new_balance" | "velocity_count" => Some(ExprType::Number),
            "currency" | "debtor_id" | "creditor_id" | "tx_type" => Some(ExprType::String),
            _ => None,
        }
    }

    fn infer(expr: &Expression) -> Result<ExprType> {
        match expr {
            Expression::Literal(value) => Ok(match value {
                Value::Null => ExprType::Null,
                Value::Bool(_) => ExprType::Bool,
                Value::Number(_) => ExprType::Number,
                Value::String(_) => ExprType::String,
                Value::Array(_) | Value::Object(_) => ExprType::Dyn,
            }),

            Expression::FieldAccess(path) => {
                let head = path.first().map(String::as_str).unwrap_or_default();
                let Some(head_type) = Self::variable_type(head) else {
                    return Err(CompileError::UndeclaredVariable(head.to_string()));
                };

                if path.len() == 1 {
                    return Ok(head_type);
                }

                // Only the tx map supports nested access
                if head == "tx" {
                    Ok(ExprType::Dyn)
                } else {
                    Err(CompileError::TypeMismatch(format!(
                        "{head} is a scalar and has no field {}",
                        path[1..].join(".")
                    )))
                }
            }

            Expression::Binary { left, op, right } => {
                let lt = Self::infer(left)?;
                let rt = Self::infer(right)?;

                match op {
                    Operator::And | Operator::Or => {
                        if lt.is_boolean() && rt.is_boolean() {
                            Ok(ExprType::Bool)
                        } else {
                            Err(CompileError::TypeMismatch(format!(
                                "{} requires booleans, got {} and {}",
                                op.symbol(),
                                lt.name(),
                                rt.name()
                            )))
                        }
                    }
                    Operator::Eq | Operator::Ne => {
                        // Null compares with anything (always false at runtime)
                        let compatible = lt == rt
                            || matches!(lt, ExprType::Dyn | ExprType::Null)
                            || matches!(rt, ExprType::Dyn | ExprType::Null);
                        if compatible {
                            Ok(ExprType::Bool)
                        } else {
                            Err(CompileError::TypeMismatch(format!(
                                "cannot compare {} and {} with {}",
                                lt.name(),
                                rt.name(),
                                op.symbol()
                            )))
                        }
                    }
                    Operator::Lt | Operator::Gt | Operator::Le | Operator::Ge => {
                        if lt.is_numeric() && rt.is_numeric() {
                            Ok(ExprType::Bool)
                        } else {
                            Err(CompileError::TypeMismatch(format!(
                                "{} requires numbers, got {} and {}",
                                op.symbol(),
                                lt.name(),
                                rt.name()
                            )))
                        }
                    }
                    Operator::Add
                    | Operator::Sub
                    | Operator::Mul
                    | Operator::Div
                    | Operator::Mod => {
                        if lt.is_numeric() && rt.is_numeric() {
                            Ok(ExprType::Number)
                        } else {
                            Err(CompileError::TypeMismatch(format!(
                                "{} requires numbers, got {} and {}",
                                op.symbol(),
                                lt.name(),
                                rt.name()
                            )))
                        }
                    }
                }
            }

            Expression::Unary { op, operand } => {
                let t = Self::infer(operand)?;
                match op {
                    UnaryOperator::Not => {
                        if t.is_boolean() {
                            Ok(ExprType::Bool)
                        } else {
                            Err(CompileError::TypeMismatch(format!(
                                "! requires a boolean, got {}",
                                t.name()
                            )))
                        }
                    }
                    UnaryOperator::Negate => {
                        if t.is_numeric() {
                            Ok(ExprType::Number)
                        } else {
                            Err(CompileError::TypeMismatch(format!(
                                "- requires a number, got {}",
                                t.name()
                            )))
                        }
                    }
                }
            }

            Expression::Ternary {
                condition,
                true_expr,
                false_expr,
            } => {
                let ct = Self::infer(condition)?;
                if !ct.is_boolean() {
                    return Err(CompileError::TypeMismatch(format!(
                        "ternary condition must be a boolean, got {}",
                        ct.name()
                    )));
                }

                let tt = Self::infer(true_expr)?;
                let ft = Self::infer(false_expr)?;
                Self::unify(tt, ft)
            }
        }
    }

    /// Unify ternary branch types.
    fn unify(a: ExprType, b: ExprType) -> Result<ExprType> {
        if a == b {
            return Ok(a);
        }
        match (a, b) {
            (ExprType::Dyn, other) | (other, ExprType::Dyn) => Ok(other),
            (ExprType::Null, other) | (other, ExprType::Null) => Ok(other),
            _ => Err(CompileError::TypeMismatch(format!(
                "ternary branches disagree: {} vs {}",
                a.name(),
                b.name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_parser::ExpressionParser;

    fn check(src: &str) -> Result<()> {
        TypeChecker::check(&ExpressionParser::parse(src).unwrap())
    }

    #[test]
    fn test_accepts_boolean_and_numeric_roots() {
        assert!(check("amount > 10000").is_ok());
        assert!(check("amount * 2").is_ok());
        assert!(check("amount > 10000 ? 1.0 : 0.0").is_ok());
        assert!(check("true").is_ok());
        assert!(check("velocity_count").is_ok());
    }

    #[test]
    fn test_accepts_dynamic_tx_lookups() {
        assert!(check("tx.amount > 100").is_ok());
        assert!(check("tx.risk_score").is_ok());
    }

    #[test]
    fn test_rejects_string_root() {
        assert!(matches!(
            check("currency"),
            Err(CompileError::InvalidReturnType(_))
        ));
        assert!(matches!(
            check(r#"amount > 1 ? "a" : "b""#),
            Err(CompileError::InvalidReturnType(_))
        ));
    }

    #[test]
    fn test_rejects_null_root() {
        assert!(matches!(
            check("null"),
            Err(CompileError::InvalidReturnType(_))
        ));
    }

    #[test]
    fn test_rejects_undeclared_variable() {
        assert!(matches!(
            check("unknown_field > 1"),
            Err(CompileError::UndeclaredVariable(_))
        ));
    }

    #[test]
    fn test_rejects_scalar_field_access() {
        assert!(matches!(
            check("amount.value > 1"),
            Err(CompileError::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_rejects_type_mismatches() {
        assert!(matches!(
            check("amount && true"),
            Err(CompileError::TypeMismatch(_))
        ));
        assert!(matches!(
            check("currency > 10"),
            Err(CompileError::TypeMismatch(_))
        ));
        assert!(matches!(
            check(r#"amount + "x""#),
            Err(CompileError::TypeMismatch(_))
        ));
        assert!(matches!(
            check(r#"amount == "EUR""#),
            Err(CompileError::TypeMismatch(_))
        ));
        assert!(matches!(
            check("amount ? 1 : 0"),
            Err(CompileError::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_string_equality_is_allowed() {
        assert!(check(r#"currency == "EUR""#).is_ok());
        assert!(check("debtor_id == creditor_id").is_ok());
    }
}
