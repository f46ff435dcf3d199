//! Decision processor
//!
//! Aggregates rule and typology results into the final evaluation. Stateless
//! apart from its configuration; safe to share across requests.

use crate::ENGINE_VERSION;
use chrono::Utc;
use kestrel_core::domain::{
    Evaluation, EvaluationMetadata, EvaluationMode, EvaluationStatus, RuleOutcome, RuleResult,
    TypologyResult,
};
use std::time::Instant;
use uuid::Uuid;

const DEFAULT_ALERT_THRESHOLD: f64 = 0.7;

/// Aggregates rule results and produces a final decision.
#[derive(Debug, Clone)]
pub struct Processor {
    /// Aggregate score at or above which a transaction is flagged
    pub alert_threshold: f64,
    /// Whether rule weights participate in aggregation
    pub use_weighted_scoring: bool,
    /// Evaluation strategy, stamped into logs and gating behaviour upstream
    pub mode: EvaluationMode,
}

/// All data needed for one decision.
#[derive(Debug, Clone)]
pub struct DecisionInput {
    pub tenant_id: String,
    pub tx_id: String,
    pub trace_id: String,
    pub rule_results: Vec<RuleResult>,
    pub typology_results: Vec<TypologyResult>,
    /// When the request entered the system
    pub start_time: Instant,
    /// Time spent parsing and persisting the request before evaluation
    pub ingest_ms: i64,
}

/// Aggregated scoring over all rule results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateResult {
    pub aggregate_score: f64,
    pub total_weight: f64,
    pub rules_triggered: usize,
    pub has_critical_failure: bool,
}

impl Default for Processor {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor {
    /// Processor with default settings: threshold 0.7, weighted scoring,
    /// detection mode.
    pub fn new() -> Self {
        Self {
            alert_threshold: DEFAULT_ALERT_THRESHOLD,
            use_weighted_scoring: true,
            mode: EvaluationMode::Detection,
        }
    }

    pub fn with_mode(mut self, mode: EvaluationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Evaluate rule and typology results into a final decision.
    pub fn process(&self, input: &DecisionInput) -> Evaluation {
        let start = Instant::now();

        let agg = self.aggregate(&input.rule_results);

        let (status, score) = if !input.typology_results.is_empty() {
            let any_triggered = input.typology_results.iter().any(|t| t.triggered);
            let max_score = input
                .typology_results
                .iter()
                .map(|t| t.score)
                .fold(0.0, f64::max);

            let status = if any_triggered || agg.has_critical_failure {
                EvaluationStatus::Alert
            } else {
                EvaluationStatus::NoAlert
            };
            (status, max_score)
        } else {
            let status = if agg.has_critical_failure || agg.aggregate_score >= self.alert_threshold
            {
                EvaluationStatus::Alert
            } else {
                EvaluationStatus::NoAlert
            };
            (status, agg.aggregate_score)
        };

        Evaluation {
            id: Uuid::new_v4().to_string(),
            tenant_id: input.tenant_id.clone(),
            tx_id: input.tx_id.clone(),
            status,
            score,
            timestamp: Utc::now(),
            rule_results: input.rule_results.clone(),
            typology_results: input.typology_results.clone(),
            metadata: EvaluationMetadata {
                trace_id: input.trace_id.clone(),
                ingest_ms: input.ingest_ms,
                decision_ms: start.elapsed().as_millis() as i64,
                total_ms: input.start_time.elapsed().as_millis() as i64,
                rules_evaluated: input.rule_results.len(),
                typologies_evaluated: input.typology_results.len(),
                engine_version: ENGINE_VERSION.to_string(),
            },
        }
    }

    /// Weighted mean of rule scores. Non-positive weights count as 1.0 so no
    /// rule is silently discarded.
    pub fn aggregate(&self, results: &[RuleResult]) -> AggregateResult {
        let mut agg = AggregateResult::default();
        if results.is_empty() {
            return agg;
        }

        for result in results {
            let weight = if result.weight <= 0.0 {
                1.0
            } else {
                result.weight
            };

            match result.sub_rule_ref {
                RuleOutcome::Fail => {
                    agg.has_critical_failure = true;
                    agg.rules_triggered += 1;
                }
                RuleOutcome::Review => {
                    agg.rules_triggered += 1;
                }
                _ => {}
            }

            if self.use_weighted_scoring {
                agg.aggregate_score += result.score * weight;
                agg.total_weight += weight;
            } else {
                agg.aggregate_score += result.score;
                agg.total_weight += 1.0;
            }
        }

        if agg.total_weight > 0.0 {
            agg.aggregate_score /= agg.total_weight;
        }

        agg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_core::domain::RuleContribution;

    fn rule_result(rule_id: &str, outcome: RuleOutcome, score: f64, weight: f64) -> RuleResult {
        RuleResult {
            rule_id: rule_id.to_string(),
            tenant_id: "t1".to_string(),
            tx_id: "tx1".to_string(),
            sub_rule_ref: outcome,
            score,
            reason: format!("{rule_id} reason"),
            weight,
            process_ms: 1,
        }
    }

    fn typology_result(id: &str, score: f64, threshold: f64) -> TypologyResult {
        TypologyResult {
            typology_id: id.to_string(),
            typology_name: id.to_string(),
            score,
            threshold,
            triggered: score >= threshold,
            contributions: vec![RuleContribution {
                rule_id: "r1".to_string(),
                rule_score: score,
                weight: 1.0,
                contribution: score,
            }],
            process_ms: 0,
        }
    }

    fn decision_input(
        rule_results: Vec<RuleResult>,
        typology_results: Vec<TypologyResult>,
    ) -> DecisionInput {
        DecisionInput {
            tenant_id: "t1".to_string(),
            tx_id: "tx1".to_string(),
            trace_id: "trace1".to_string(),
            rule_results,
            typology_results,
            start_time: Instant::now(),
            ingest_ms: 0,
        }
    }

    #[test]
    fn test_all_pass_is_no_alert() {
        let processor = Processor::new();
        let input = decision_input(
            vec![
                rule_result("high-value", RuleOutcome::Pass, 0.0, 0.3),
                rule_result("same-account", RuleOutcome::Pass, 0.0, 1.0),
            ],
            vec![],
        );

        let eval = processor.process(&input);
        assert_eq!(eval.status, EvaluationStatus::NoAlert);
        assert_eq!(eval.score, 0.0);
        assert!(eval.reasons().is_empty());
    }

    #[test]
    fn test_critical_failure_always_alerts() {
        let processor = Processor::new();
        // Aggregate well below the threshold; the .fail outcome dominates
        let input = decision_input(
            vec![
                rule_result("high-value", RuleOutcome::Pass, 0.0, 0.3),
                rule_result("same-account", RuleOutcome::Fail, 1.0, 1.0),
            ],
            vec![],
        );

        let eval = processor.process(&input);
        assert_eq!(eval.status, EvaluationStatus::Alert);
        // score = (0*0.3 + 1*1.0) / (0.3 + 1.0)
        assert!((eval.score - 1.0 / 1.3).abs() < 1e-9);
    }

    #[test]
    fn test_critical_failure_alerts_even_with_untriggered_typologies() {
        let processor = Processor::new().with_mode(EvaluationMode::Compliance);
        let input = decision_input(
            vec![rule_result("r1", RuleOutcome::Fail, 1.0, 1.0)],
            vec![typology_result("t1", 0.1, 0.9)],
        );

        let eval = processor.process(&input);
        assert_eq!(eval.status, EvaluationStatus::Alert);
    }

    #[test]
    fn test_aggregate_threshold_alert() {
        let processor = Processor::new();
        let input = decision_input(
            vec![rule_result("r1", RuleOutcome::Review, 0.9, 1.0)],
            vec![],
        );

        let eval = processor.process(&input);
        assert_eq!(eval.status, EvaluationStatus::Alert);
        assert!((eval.score - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_non_positive_weight_counts_as_one() {
        let processor = Processor::new();
        let agg = processor.aggregate(&[
            rule_result("r1", RuleOutcome::Pass, 1.0, 0.0),
            rule_result("r2", RuleOutcome::Pass, 0.0, -2.0),
        ]);

        assert_eq!(agg.total_weight, 2.0);
        assert!((agg.aggregate_score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_unweighted_scoring() {
        let processor = Processor {
            use_weighted_scoring: false,
            ..Processor::new()
        };
        let agg = processor.aggregate(&[
            rule_result("r1", RuleOutcome::Pass, 1.0, 5.0),
            rule_result("r2", RuleOutcome::Pass, 0.0, 5.0),
        ]);

        assert_eq!(agg.total_weight, 2.0);
        assert!((agg.aggregate_score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_results_aggregate_to_zero() {
        let processor = Processor::new();
        let agg = processor.aggregate(&[]);
        assert_eq!(agg, AggregateResult::default());

        let eval = processor.process(&decision_input(vec![], vec![]));
        assert_eq!(eval.status, EvaluationStatus::NoAlert);
        assert_eq!(eval.score, 0.0);
    }

    #[test]
    fn test_typology_results_drive_status_and_score() {
        let processor = Processor::new().with_mode(EvaluationMode::Compliance);
        let input = decision_input(
            vec![rule_result("r1", RuleOutcome::Pass, 0.8, 1.0)],
            vec![
                typology_result("t1", 0.8, 0.5),
                typology_result("t2", 0.3, 0.9),
            ],
        );

        let eval = processor.process(&input);
        assert_eq!(eval.status, EvaluationStatus::Alert);
        // Reported score is the max typology score
        assert!((eval.score - 0.8).abs() < 1e-9);
        assert_eq!(eval.metadata.typologies_evaluated, 2);
    }

    #[test]
    fn test_untriggered_typologies_no_alert() {
        let processor = Processor::new().with_mode(EvaluationMode::Compliance);
        let input = decision_input(
            vec![rule_result("r1", RuleOutcome::Pass, 0.2, 1.0)],
            vec![typology_result("t1", 0.2, 0.5)],
        );

        let eval = processor.process(&input);
        assert_eq!(eval.status, EvaluationStatus::NoAlert);
        assert!((eval.score - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_metadata_is_populated() {
        let processor = Processor::new();
        let input = decision_input(vec![rule_result("r1", RuleOutcome::Pass, 0.0, 1.0)], vec![]);

        let eval = processor.process(&input);
        assert_eq!(eval.metadata.trace_id, "trace1");
        assert_eq!(eval.metadata.rules_evaluated, 1);
        assert_eq!(eval.metadata.typologies_evaluated, 0);
        assert!(eval.metadata.engine_version.starts_with("kestrel-"));
        assert!(!eval.id.is_empty());
    }
}
