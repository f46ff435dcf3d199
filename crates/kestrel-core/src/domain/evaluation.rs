//! Evaluation results

use super::rule::{RuleOutcome, RuleResult};
use super::typology::TypologyResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal status of an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvaluationStatus {
    /// Alert - suspicious transaction
    #[serde(rename = "ALRT")]
    Alert,
    /// No alert - transaction passed
    #[serde(rename = "NALT")]
    NoAlert,
}

impl fmt::Display for EvaluationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationStatus::Alert => f.write_str("ALRT"),
            EvaluationStatus::NoAlert => f.write_str("NALT"),
        }
    }
}

/// The complete evaluation result for a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub id: String,
    pub tenant_id: String,
    pub tx_id: String,
    pub status: EvaluationStatus,
    pub score: f64,
    pub timestamp: DateTime<Utc>,

    pub rule_results: Vec<RuleResult>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub typology_results: Vec<TypologyResult>,

    pub metadata: EvaluationMetadata,
}

/// Processing metadata attached to every evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationMetadata {
    pub trace_id: String,
    #[serde(default)]
    pub ingest_ms: i64,
    pub decision_ms: i64,
    pub total_ms: i64,
    pub rules_evaluated: usize,
    pub typologies_evaluated: usize,
    pub engine_version: String,
}

impl Evaluation {
    /// Human-readable reasons: the reason strings of every `.review` and
    /// `.fail` rule result, in result order.
    pub fn reasons(&self) -> Vec<String> {
        self.rule_results
            .iter()
            .filter(|r| {
                matches!(r.sub_rule_ref, RuleOutcome::Fail | RuleOutcome::Review)
                    && !r.reason.is_empty()
            })
            .map(|r| r.reason.clone())
            .collect()
    }

    /// True if the evaluation should raise an alert.
    pub fn should_alert(&self) -> bool {
        self.status == EvaluationStatus::Alert
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_result(outcome: RuleOutcome, reason: &str) -> RuleResult {
        RuleResult {
            rule_id: "r1".to_string(),
            tenant_id: "t1".to_string(),
            tx_id: "tx1".to_string(),
            sub_rule_ref: outcome,
            score: 1.0,
            reason: reason.to_string(),
            weight: 1.0,
            process_ms: 0,
        }
    }

    fn evaluation(results: Vec<RuleResult>) -> Evaluation {
        Evaluation {
            id: "e1".to_string(),
            tenant_id: "t1".to_string(),
            tx_id: "tx1".to_string(),
            status: EvaluationStatus::NoAlert,
            score: 0.0,
            timestamp: Utc::now(),
            rule_results: results,
            typology_results: vec![],
            metadata: EvaluationMetadata::default(),
        }
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(
            serde_json::to_string(&EvaluationStatus::Alert).unwrap(),
            "\"ALRT\""
        );
        assert_eq!(
            serde_json::to_string(&EvaluationStatus::NoAlert).unwrap(),
            "\"NALT\""
        );
    }

    #[test]
    fn test_reasons_filter_outcomes() {
        let eval = evaluation(vec![
            rule_result(RuleOutcome::Pass, "fine"),
            rule_result(RuleOutcome::Review, "needs review"),
            rule_result(RuleOutcome::Fail, "critical"),
            rule_result(RuleOutcome::Err, "boom"),
        ]);

        assert_eq!(eval.reasons(), vec!["needs review", "critical"]);
    }

    #[test]
    fn test_reasons_skip_empty() {
        let eval = evaluation(vec![rule_result(RuleOutcome::Fail, "")]);
        assert!(eval.reasons().is_empty());
    }
}
