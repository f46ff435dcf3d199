//! Domain model for transaction evaluation
//!
//! The records exchanged between the engines, the repository, and the HTTP
//! surface: rule configurations and results, typologies, transactions, and
//! final evaluations.

mod evaluation;
mod mode;
mod rule;
mod transaction;
mod typology;

pub use evaluation::{Evaluation, EvaluationMetadata, EvaluationStatus};
pub use mode::EvaluationMode;
pub use rule::{RuleBand, RuleConfig, RuleOutcome, RuleResult};
pub use transaction::Transaction;
pub use typology::{RuleContribution, Typology, TypologyResult, TypologyRuleWeight};

/// Tenant id for definitions visible to all tenants.
pub const GLOBAL_TENANT_ID: &str = "*";
