//! Expression AST nodes

use super::operator::Operator;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Expression AST node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Literal value
    Literal(Value),

    /// Field access (e.g., amount, tx.debtor_id)
    FieldAccess(Vec<String>),

    /// Binary operation
    Binary {
        left: Box<Expression>,
        op: Operator,
        right: Box<Expression>,
    },

    /// Unary operation
    Unary {
        op: UnaryOperator,
        operand: Box<Expression>,
    },

    /// Ternary conditional (condition ? true_expr : false_expr)
    Ternary {
        condition: Box<Expression>,
        true_expr: Box<Expression>,
        false_expr: Box<Expression>,
    },
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperator {
    /// Logical NOT (!)
    Not,
    /// Arithmetic negation (-)
    Negate,
}

impl Expression {
    /// Create a literal expression
    pub fn literal(value: Value) -> Self {
        Expression::Literal(value)
    }

    /// Create a field access expression
    pub fn field_access(path: Vec<String>) -> Self {
        Expression::FieldAccess(path)
    }

    /// Create a binary expression
    pub fn binary(left: Expression, op: Operator, right: Expression) -> Self {
        Expression::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Create a unary expression
    pub fn unary(op: UnaryOperator, operand: Expression) -> Self {
        Expression::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// Create a ternary expression
    pub fn ternary(condition: Expression, true_expr: Expression, false_expr: Expression) -> Self {
        Expression::Ternary {
            condition: Box::new(condition),
            true_expr: Box::new(true_expr),
            false_expr: Box::new(false_expr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_expression() {
        // amount > 10000
        let expr = Expression::binary(
            Expression::field_access(vec!["amount".to_string()]),
            Operator::Gt,
            Expression::literal(Value::Number(10000.0)),
        );

        match expr {
            Expression::Binary { left, op, right } => {
                assert_eq!(op, Operator::Gt);
                assert_eq!(*left, Expression::FieldAccess(vec!["amount".to_string()]));
                assert_eq!(*right, Expression::Literal(Value::Number(10000.0)));
            }
            _ => panic!("Expected Binary expression"),
        }
    }

    #[test]
    fn test_ternary_expression() {
        // amount > 10000 ? 1.0 : 0.0
        let expr = Expression::ternary(
            Expression::binary(
                Expression::field_access(vec!["amount".to_string()]),
                Operator::Gt,
                Expression::literal(Value::Number(10000.0)),
            ),
            Expression::literal(Value::Number(1.0)),
            Expression::literal(Value::Number(0.0)),
        );

        match expr {
            Expression::Ternary {
                condition,
                true_expr,
                false_expr,
            } => {
                assert!(matches!(*condition, Expression::Binary { .. }));
                assert_eq!(*true_expr, Expression::Literal(Value::Number(1.0)));
                assert_eq!(*false_expr, Expression::Literal(Value::Number(0.0)));
            }
            _ => panic!("Expected Ternary expression"),
        }
    }

    #[test]
    fn test_field_access_path() {
        let expr = Expression::field_access(vec!["tx".to_string(), "debtor_id".to_string()]);
        assert_eq!(
            expr,
            Expression::FieldAccess(vec!["tx".to_string(), "debtor_id".to_string()])
        );
    }
}
