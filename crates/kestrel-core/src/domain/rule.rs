//! Rule configuration and evaluation results

use serde::{Deserialize, Serialize};
use std::fmt;

/// A user-authored detection rule: an expression, outcome bands, and a weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleConfig {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub version: String,

    /// Expression evaluated against the transaction activation
    pub expression: String,

    /// Outcome bands for score-to-decision mapping, matched in order
    #[serde(default)]
    pub bands: Vec<RuleBand>,

    /// Rule weight in aggregation and typology calculation
    pub weight: f64,

    /// Whether the rule is active
    pub enabled: bool,
}

/// Maps a half-open score interval `[lower, upper)` to an outcome.
///
/// A missing `lower_limit` means 0.0; a missing `upper_limit` means unbounded
/// above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleBand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_limit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_limit: Option<f64>,
    pub sub_rule_ref: RuleOutcome,
    pub reason: String,
}

/// The closed set of rule outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleOutcome {
    /// Rule passed, no concern
    #[serde(rename = ".pass")]
    Pass,
    /// Rule flagged the transaction for review
    #[serde(rename = ".review")]
    Review,
    /// Critical failure; escalates the evaluation to an alert
    #[serde(rename = ".fail")]
    Fail,
    /// The rule's execution raised an error
    #[serde(rename = ".err")]
    Err,
}

impl fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RuleOutcome::Pass => ".pass",
            RuleOutcome::Review => ".review",
            RuleOutcome::Fail => ".fail",
            RuleOutcome::Err => ".err",
        };
        f.write_str(s)
    }
}

/// The output of one rule evaluation for one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleResult {
    pub rule_id: String,
    pub tenant_id: String,
    pub tx_id: String,
    pub sub_rule_ref: RuleOutcome,
    /// The computed numeric value of the expression
    pub score: f64,
    pub reason: String,
    pub weight: f64,
    /// Processing time in milliseconds
    pub process_ms: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_serde_tags() {
        let json = serde_json::to_string(&RuleOutcome::Fail).unwrap();
        assert_eq!(json, "\".fail\"");

        let back: RuleOutcome = serde_json::from_str("\".review\"").unwrap();
        assert_eq!(back, RuleOutcome::Review);
    }

    #[test]
    fn test_band_serde_optional_limits() {
        let band: RuleBand = serde_json::from_str(
            r#"{"lowerLimit": 1.0, "subRuleRef": ".fail", "reason": "same account"}"#,
        )
        .unwrap();

        assert_eq!(band.lower_limit, Some(1.0));
        assert_eq!(band.upper_limit, None);
        assert_eq!(band.sub_rule_ref, RuleOutcome::Fail);
    }

    #[test]
    fn test_rule_config_round_trip() {
        let cfg = RuleConfig {
            id: "high-value".to_string(),
            tenant_id: "*".to_string(),
            name: "High value transfer".to_string(),
            description: String::new(),
            version: "1.0.0".to_string(),
            expression: "amount > 10000 ? 1.0 : 0.0".to_string(),
            bands: vec![RuleBand {
                lower_limit: Some(1.0),
                upper_limit: None,
                sub_rule_ref: RuleOutcome::Review,
                reason: "high value".to_string(),
            }],
            weight: 0.3,
            enabled: true,
        };

        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("tenantId"));
        let back: RuleConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }
}
