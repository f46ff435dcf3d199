//! Expression parser
//!
//! Parses string expressions into `Expression` AST nodes by precedence-ordered
//! operator splitting: the input is scanned at parenthesis depth 0 for the
//! loosest-binding operator, split, and both sides parsed recursively. The
//! right-to-left scan yields left associativity for binary operators.
//!
//! The ternary conditional is handled first (loosest of all), scanning
//! left-to-right for `?` and its matching `:` so the false branch may itself
//! be a ternary (right associativity).

use crate::error::{ParseError, Result};
use kestrel_core::ast::{Expression, Operator, UnaryOperator};
use kestrel_core::Value;

/// Expression parser
pub struct ExpressionParser;

/// Binary operator groups, loosest first. Comparison before additive so that
/// `a + b > c` splits at `>`.
const OPERATOR_LEVELS: &[&[&str]] = &[
    &["||"],
    &["&&"],
    &["==", "!=", "<=", ">=", "<", ">"],
    &["+", "-"],
    &["*", "/", "%"],
];

impl ExpressionParser {
    /// Parse an expression from a string
    pub fn parse(input: &str) -> Result<Expression> {
        let input = input.trim();

        if input.is_empty() {
            return Err(ParseError::InvalidExpression("Empty expression".to_string()));
        }

        Self::parse_expression(input)
    }

    /// Parse a complete expression (ternary, then binary operators by precedence)
    fn parse_expression(input: &str) -> Result<Expression> {
        let input = input.trim();
        let mask = Self::string_mask(input)?;

        if let Some((cond, true_expr, false_expr)) = Self::split_ternary(input, &mask)? {
            return Ok(Expression::ternary(
                Self::parse_expression(cond)?,
                Self::parse_expression(true_expr)?,
                Self::parse_expression(false_expr)?,
            ));
        }

        for level in OPERATOR_LEVELS {
            if let Some((left, op, right)) = Self::split_by_operator(input, &mask, level) {
                let op = Self::parse_operator(op)?;
                return Ok(Expression::binary(
                    Self::parse_expression(left)?,
                    op,
                    Self::parse_expression(right)?,
                ));
            }
        }

        Self::parse_primary(input)
    }

    /// Parse a primary expression
    fn parse_primary(input: &str) -> Result<Expression> {
        let input = input.trim();

        if input.is_empty() {
            return Err(ParseError::InvalidExpression("Empty expression".to_string()));
        }

        // Unary operators
        if let Some(rest) = input.strip_prefix('!') {
            return Ok(Expression::unary(
                UnaryOperator::Not,
                Self::parse_primary(rest.trim())?,
            ));
        }

        if let Some(rest) = input.strip_prefix('-') {
            let rest = rest.trim();
            // Negative number literals are handled by the f64 parse below
            if !rest.starts_with(|c: char| c.is_ascii_digit()) {
                return Ok(Expression::unary(
                    UnaryOperator::Negate,
                    Self::parse_primary(rest)?,
                ));
            }
        }

        // Parentheses (only when the outermost pair matches)
        if input.starts_with('(') && input.ends_with(')') && Self::outer_parens_match(input)? {
            return Self::parse_expression(&input[1..input.len() - 1]);
        }

        // String literals
        if input.len() >= 2 && input.starts_with('"') && input.ends_with('"') {
            let inner = &input[1..input.len() - 1];
            if !inner.contains('"') {
                return Ok(Expression::literal(Value::String(inner.to_string())));
            }
        }

        // Keyword literals
        match input {
            "true" => return Ok(Expression::literal(Value::Bool(true))),
            "false" => return Ok(Expression::literal(Value::Bool(false))),
            "null" => return Ok(Expression::literal(Value::Null)),
            _ => {}
        }

        // Number literals
        if let Ok(num) = input.parse::<f64>() {
            return Ok(Expression::literal(Value::Number(num)));
        }

        // Field access: identifier or dotted path
        if input
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        {
            let parts: Vec<String> = input.split('.').map(str::to_string).collect();
            let valid = parts.iter().all(|p| {
                p.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                    && p.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            });
            if valid {
                return Ok(Expression::field_access(parts));
            }
        }

        Err(ParseError::InvalidExpression(format!(
            "Cannot parse: {input}"
        )))
    }

    /// Mark which byte positions sit inside a string literal (quotes included),
    /// so operator scans never split inside one.
    fn string_mask(input: &str) -> Result<Vec<bool>> {
        let mut mask = vec![false; input.len()];
        let mut in_string = false;

        for (i, b) in input.bytes().enumerate() {
            if b == b'"' {
                in_string = !in_string;
                mask[i] = true;
            } else {
                mask[i] = in_string;
            }
        }

        if in_string {
            return Err(ParseError::UnterminatedString(input.to_string()));
        }

        Ok(mask)
    }

    /// Split `cond ? true : false` at depth 0. The matching `:` is found by
    /// counting nested `?`, so the false branch can be another ternary.
    fn split_ternary<'a>(
        input: &'a str,
        mask: &[bool],
    ) -> Result<Option<(&'a str, &'a str, &'a str)>> {
        let bytes = input.as_bytes();
        let mut depth = 0i32;
        let mut question_pos = None;

        for i in 0..bytes.len() {
            if mask[i] {
                continue;
            }
            match bytes[i] {
                b'(' => depth += 1,
                b')' => depth -= 1,
                b'?' if depth == 0 => {
                    question_pos = Some(i);
                    break;
                }
                _ => {}
            }
        }

        let Some(q) = question_pos else {
            return Ok(None);
        };

        let mut depth = 0i32;
        let mut nesting = 0i32;
        for i in (q + 1)..bytes.len() {
            if mask[i] {
                continue;
            }
            match bytes[i] {
                b'(' => depth += 1,
                b')' => depth -= 1,
                b'?' if depth == 0 => nesting += 1,
                b':' if depth == 0 => {
                    if nesting == 0 {
                        return Ok(Some((
                            input[..q].trim(),
                            input[q + 1..i].trim(),
                            input[i + 1..].trim(),
                        )));
                    }
                    nesting -= 1;
                }
                _ => {}
            }
        }

        Err(ParseError::InvalidExpression(format!(
            "Ternary '?' without matching ':' in: {input}"
        )))
    }

    /// Split input by a binary operator at parenthesis depth 0, scanning
    /// right-to-left for left associativity.
    fn split_by_operator<'a>(
        input: &'a str,
        mask: &[bool],
        operators: &[&str],
    ) -> Option<(&'a str, &'a str, &'a str)> {
        let bytes = input.as_bytes();
        let mut paren_depth = 0i32;

        for i in (0..input.len()).rev() {
            if mask[i] {
                continue;
            }

            let c = bytes[i] as char;
            if c == ')' {
                paren_depth += 1;
            } else if c == '(' {
                paren_depth -= 1;
            }

            if paren_depth != 0 {
                continue;
            }

            for &op in operators {
                // Byte comparison: safe on any UTF-8 input
                if i + op.len() > input.len() || &bytes[i..i + op.len()] != op.as_bytes() {
                    continue;
                }

                // Not part of a longer operator (e.g. the '=' inside '>=')
                let clean_before = i == 0 || !Self::is_operator_char(bytes[i - 1] as char);
                let clean_after = i + op.len() >= input.len()
                    || !Self::is_operator_char(bytes[i + op.len()] as char);
                if !clean_before || !clean_after {
                    continue;
                }

                // A binary operator needs a left operand: the last non-space
                // character before it must exist and must be able to end one.
                // Rules out unary minus ("-b", "a * -b").
                let prev = input[..i].trim_end().chars().last();
                match prev {
                    None => continue,
                    Some(p) if Self::is_operator_char(p) || p == '(' => continue,
                    _ => {}
                }

                return Some((
                    input[..i].trim(),
                    &input[i..i + op.len()],
                    input[i + op.len()..].trim(),
                ));
            }
        }

        None
    }

    /// Check if a character can be part of an operator
    fn is_operator_char(c: char) -> bool {
        matches!(c, '=' | '!' | '<' | '>' | '&' | '|' | '+' | '-' | '*' | '/' | '%')
    }

    /// True if the first '(' matches the final ')' (depth only returns to zero
    /// at the end of the input).
    fn outer_parens_match(input: &str) -> Result<bool> {
        let mask = Self::string_mask(input)?;
        let mut depth = 0i32;

        for (i, b) in input.bytes().enumerate() {
            if mask[i] {
                continue;
            }
            match b {
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(i == input.len() - 1);
                    }
                }
                _ => {}
            }
        }

        Ok(false)
    }

    /// Parse an operator string
    fn parse_operator(op: &str) -> Result<Operator> {
        match op {
            "==" => Ok(Operator::Eq),
            "!=" => Ok(Operator::Ne),
            "<" => Ok(Operator::Lt),
            ">" => Ok(Operator::Gt),
            "<=" => Ok(Operator::Le),
            ">=" => Ok(Operator::Ge),
            "+" => Ok(Operator::Add),
            "-" => Ok(Operator::Sub),
            "*" => Ok(Operator::Mul),
            "/" => Ok(Operator::Div),
            "%" => Ok(Operator::Mod),
            "&&" => Ok(Operator::And),
            "||" => Ok(Operator::Or),
            _ => Err(ParseError::InvalidOperator(op.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_literal() {
        let expr = ExpressionParser::parse("42").unwrap();
        assert_eq!(expr, Expression::literal(Value::Number(42.0)));

        let expr = ExpressionParser::parse("3.14").unwrap();
        assert_eq!(expr, Expression::literal(Value::Number(3.14)));

        let expr = ExpressionParser::parse("-5").unwrap();
        assert_eq!(expr, Expression::literal(Value::Number(-5.0)));
    }

    #[test]
    fn test_parse_string_literal() {
        let expr = ExpressionParser::parse(r#""TRANSFER""#).unwrap();
        assert_eq!(expr, Expression::literal(Value::String("TRANSFER".to_string())));
    }

    #[test]
    fn test_parse_keyword_literals() {
        assert_eq!(
            ExpressionParser::parse("true").unwrap(),
            Expression::literal(Value::Bool(true))
        );
        assert_eq!(
            ExpressionParser::parse("false").unwrap(),
            Expression::literal(Value::Bool(false))
        );
        assert_eq!(
            ExpressionParser::parse("null").unwrap(),
            Expression::literal(Value::Null)
        );
    }

    #[test]
    fn test_parse_field_access() {
        let expr = ExpressionParser::parse("amount").unwrap();
        assert_eq!(expr, Expression::field_access(vec!["amount".to_string()]));

        let expr = ExpressionParser::parse("tx.debtor_id").unwrap();
        assert_eq!(
            expr,
            Expression::field_access(vec!["tx".to_string(), "debtor_id".to_string()])
        );
    }

    #[test]
    fn test_parse_comparison() {
        let expr = ExpressionParser::parse("amount > 10000").unwrap();
        assert_eq!(
            expr,
            Expression::binary(
                Expression::field_access(vec!["amount".to_string()]),
                Operator::Gt,
                Expression::literal(Value::Number(10000.0)),
            )
        );

        let expr = ExpressionParser::parse("velocity_count >= 10").unwrap();
        assert!(matches!(
            expr,
            Expression::Binary {
                op: Operator::Ge,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_string_comparison() {
        let expr = ExpressionParser::parse(r#"tx_type == "CASH_OUT""#).unwrap();
        match expr {
            Expression::Binary { left, op, right } => {
                assert_eq!(op, Operator::Eq);
                assert_eq!(*left, Expression::field_access(vec!["tx_type".to_string()]));
                assert_eq!(
                    *right,
                    Expression::literal(Value::String("CASH_OUT".to_string()))
                );
            }
            _ => panic!("Expected Binary expression"),
        }
    }

    #[test]
    fn test_operators_inside_strings_do_not_split() {
        // The '>' and '&&' inside the literal must be ignored by the scanner
        let expr = ExpressionParser::parse(r#"currency == "A>B&&C""#).unwrap();
        match expr {
            Expression::Binary { op, right, .. } => {
                assert_eq!(op, Operator::Eq);
                assert_eq!(
                    *right,
                    Expression::literal(Value::String("A>B&&C".to_string()))
                );
            }
            _ => panic!("Expected Binary expression"),
        }
    }

    #[test]
    fn test_parse_ternary() {
        let expr = ExpressionParser::parse("amount > 10000 ? 1.0 : 0.0").unwrap();
        match expr {
            Expression::Ternary {
                condition,
                true_expr,
                false_expr,
            } => {
                assert!(matches!(*condition, Expression::Binary { .. }));
                assert_eq!(*true_expr, Expression::literal(Value::Number(1.0)));
                assert_eq!(*false_expr, Expression::literal(Value::Number(0.0)));
            }
            _ => panic!("Expected Ternary expression"),
        }
    }

    #[test]
    fn test_parse_nested_ternary_right_associative() {
        // a > 1 ? 2 : a > 0 ? 1 : 0
        let expr = ExpressionParser::parse("amount > 1 ? 2 : amount > 0 ? 1 : 0").unwrap();
        match expr {
            Expression::Ternary { false_expr, .. } => {
                assert!(matches!(*false_expr, Expression::Ternary { .. }));
            }
            _ => panic!("Expected Ternary expression"),
        }
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        // a || b && c must parse as a || (b && c)
        let expr = ExpressionParser::parse("a || b && c").unwrap();
        match expr {
            Expression::Binary { op, right, .. } => {
                assert_eq!(op, Operator::Or);
                assert!(matches!(
                    *right,
                    Expression::Binary {
                        op: Operator::And,
                        ..
                    }
                ));
            }
            _ => panic!("Expected Binary expression"),
        }
    }

    #[test]
    fn test_multiplication_binds_tighter_than_addition() {
        // a + b * c must parse as a + (b * c)
        let expr = ExpressionParser::parse("a + b * c").unwrap();
        match expr {
            Expression::Binary { op, right, .. } => {
                assert_eq!(op, Operator::Add);
                assert!(matches!(
                    *right,
                    Expression::Binary {
                        op: Operator::Mul,
                        ..
                    }
                ));
            }
            _ => panic!("Expected Binary expression"),
        }
    }

    #[test]
    fn test_parse_with_parentheses() {
        // (a + b) * c
        let expr = ExpressionParser::parse("(a + b) * c").unwrap();
        match expr {
            Expression::Binary { op, left, .. } => {
                assert_eq!(op, Operator::Mul);
                assert!(matches!(
                    *left,
                    Expression::Binary {
                        op: Operator::Add,
                        ..
                    }
                ));
            }
            _ => panic!("Expected Binary expression"),
        }

        // (a) && (b) must not be treated as one parenthesised group
        let expr = ExpressionParser::parse("(a) && (b)").unwrap();
        assert!(matches!(
            expr,
            Expression::Binary {
                op: Operator::And,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_unary() {
        let expr = ExpressionParser::parse("!a").unwrap();
        assert!(matches!(
            expr,
            Expression::Unary {
                op: UnaryOperator::Not,
                ..
            }
        ));

        let expr = ExpressionParser::parse("-amount").unwrap();
        assert!(matches!(
            expr,
            Expression::Unary {
                op: UnaryOperator::Negate,
                ..
            }
        ));
    }

    #[test]
    fn test_unary_minus_after_operator() {
        // a * -b: the '-' is unary, not a subtraction split
        let expr = ExpressionParser::parse("amount * -old_balance").unwrap();
        match expr {
            Expression::Binary { op, right, .. } => {
                assert_eq!(op, Operator::Mul);
                assert!(matches!(
                    *right,
                    Expression::Unary {
                        op: UnaryOperator::Negate,
                        ..
                    }
                ));
            }
            _ => panic!("Expected Binary expression"),
        }
    }

    #[test]
    fn test_same_account_expression() {
        let expr = ExpressionParser::parse("debtor_id == creditor_id ? 1.0 : 0.0").unwrap();
        assert!(matches!(expr, Expression::Ternary { .. }));
    }

    #[test]
    fn test_account_drain_expression() {
        let expr = ExpressionParser::parse(
            "old_balance > 0 && new_balance <= 0 && amount > 1000 ? 1.0 : 0.0",
        )
        .unwrap();
        assert!(matches!(expr, Expression::Ternary { .. }));
    }

    #[test]
    fn test_invalid_expressions() {
        assert!(ExpressionParser::parse("").is_err());
        assert!(ExpressionParser::parse("@#$").is_err());
        assert!(ExpressionParser::parse("amount > 1 ? 2").is_err());
        assert!(matches!(
            ExpressionParser::parse(r#"currency == "EUR"#),
            Err(ParseError::UnterminatedString(_))
        ));
    }
}
