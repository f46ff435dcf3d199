//! Kestrel Parser - parses rule expression text into AST nodes
//!
//! The rule language is a small, pure expression language over a fixed
//! activation schema:
//! - Field access: `amount`, `tx.debtor_id`
//! - Literals: `42`, `3.14`, `"string"`, `true`, `false`, `null`
//! - Binary operators: `> < >= <= == != + - * / % && ||`
//! - Unary operators: `!`, `-`
//! - Ternary conditional: `amount > 10000 ? 1.0 : 0.0`
//! - Parentheses for grouping

mod error;
mod expression_parser;

pub use error::{ParseError, Result};
pub use expression_parser::ExpressionParser;
