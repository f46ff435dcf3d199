//! Kestrel Engine - rule evaluation, typology scoring, and decision processing
//!
//! The engines own the live (compiled) rule and typology sets. Publication is
//! atomic: reloads build a fresh keyed set and swap it in; in-flight
//! evaluations finish against the snapshot they started with.

pub mod activation;
pub mod bus;
pub mod cache;
mod engine;
mod error;
mod executor;
mod operators;
mod processor;
mod typology;
mod velocity;

pub use engine::{CompiledRule, EvaluateInput, RuleEngine};
pub use error::{EngineError, RuntimeError};
pub use executor::Executor;
pub use processor::{AggregateResult, DecisionInput, Processor};
pub use typology::TypologyEngine;
pub use velocity::VelocityProvider;

/// Engine version string stamped into evaluation metadata.
pub const ENGINE_VERSION: &str = concat!("kestrel-", env!("CARGO_PKG_VERSION"));
