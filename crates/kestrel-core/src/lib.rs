//! Kestrel Core - shared types for the Kestrel evaluation engine
//!
//! This crate provides the fundamental types used across the Kestrel
//! workspace:
//! - `Value` for runtime expression data
//! - Expression AST definitions
//! - IR (intermediate representation) definitions
//! - The domain model: rules, bands, typologies, transactions, evaluations
//! - Error types

pub mod ast;
pub mod domain;
pub mod error;
pub mod ir;
pub mod value;

pub use error::CoreError;
pub use value::Value;
