//! Typology configuration and results
//!
//! A typology groups rules with weights to compute a composite risk score,
//! e.g. "Account Takeover" = account-drain (0.4) + high-value (0.25) +
//! rapid-movement (0.2) + tx-type-risk (0.15).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A weighted bundle of rules with an alert threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Typology {
    pub id: String,
    #[serde(default)]
    pub tenant_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub version: String,

    /// The rules contributing to this typology and their weights
    pub rules: Vec<TypologyRuleWeight>,

    /// Minimum composite score to trigger an alert, in (0, 1]
    pub alert_threshold: f64,

    /// Whether the typology is active
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One rule's weight within a typology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypologyRuleWeight {
    pub rule_id: String,
    /// Weight in [0, 1]
    pub weight: f64,
}

/// How one rule contributed to a typology score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleContribution {
    pub rule_id: String,
    pub rule_score: f64,
    pub weight: f64,
    /// rule_score * weight
    pub contribution: f64,
}

/// The evaluated result of a single typology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypologyResult {
    pub typology_id: String,
    pub typology_name: String,
    pub score: f64,
    pub threshold: f64,
    pub triggered: bool,
    #[serde(default)]
    pub contributions: Vec<RuleContribution>,
    #[serde(default)]
    pub process_ms: i64,
}
