//! Typology engine
//!
//! Composes already-computed rule scores into weighted composite scores.
//! Read-heavy: evaluations only clone the `Arc` snapshot; publication
//! replaces the whole map.

use kestrel_core::domain::{RuleContribution, RuleResult, Typology, TypologyResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

type TypologySet = HashMap<String, Arc<Typology>>;

/// The typology evaluation engine.
#[derive(Default)]
pub struct TypologyEngine {
    typologies: RwLock<Arc<TypologySet>>,
}

impl TypologyEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a new typology set, keeping enabled entries only.
    pub async fn load_all(&self, typologies: Vec<Typology>) {
        let next: TypologySet = typologies
            .into_iter()
            .filter(|t| t.enabled)
            .map(|t| (t.id.clone(), Arc::new(t)))
            .collect();

        let mut guard = self.typologies.write().await;
        *guard = Arc::new(next);
    }

    /// Hot reload: alias of `load_all`, the swap is atomic either way.
    pub async fn reload_all(&self, typologies: Vec<Typology>) {
        self.load_all(typologies).await;
    }

    /// Snapshot of the currently loaded typologies.
    pub async fn list_loaded(&self) -> Vec<Typology> {
        let guard = self.typologies.read().await;
        guard.values().map(|t| (**t).clone()).collect()
    }

    /// Number of loaded typologies.
    pub async fn count(&self) -> usize {
        self.typologies.read().await.len()
    }

    /// Evaluate every loaded typology against the rule results.
    ///
    /// Rules that did not participate in the evaluation are skipped, not
    /// zero-substituted: a typology whose rules are all absent scores 0 and
    /// does not trigger.
    pub async fn evaluate(&self, rule_results: &[RuleResult]) -> Vec<TypologyResult> {
        let start = Instant::now();

        let snapshot = {
            let guard = self.typologies.read().await;
            Arc::clone(&guard)
        };

        if snapshot.is_empty() {
            return Vec::new();
        }

        let scores = rule_score_map(rule_results);

        snapshot
            .values()
            .map(|typology| {
                let mut result = evaluate_typology(typology, &scores);
                result.process_ms = start.elapsed().as_millis() as i64;
                result
            })
            .collect()
    }

    /// Evaluate a single typology by id. Returns `None` when it is not loaded.
    pub async fn evaluate_one(
        &self,
        typology_id: &str,
        rule_results: &[RuleResult],
    ) -> Option<TypologyResult> {
        let typology = {
            let guard = self.typologies.read().await;
            guard.get(typology_id).cloned()
        }?;

        let start = Instant::now();
        let scores = rule_score_map(rule_results);
        let mut result = evaluate_typology(&typology, &scores);
        result.process_ms = start.elapsed().as_millis() as i64;
        Some(result)
    }

    /// Only the typologies that exceeded their threshold.
    pub async fn get_triggered(&self, rule_results: &[RuleResult]) -> Vec<TypologyResult> {
        self.evaluate(rule_results)
            .await
            .into_iter()
            .filter(|t| t.triggered)
            .collect()
    }
}

fn rule_score_map(rule_results: &[RuleResult]) -> HashMap<&str, f64> {
    rule_results
        .iter()
        .map(|r| (r.rule_id.as_str(), r.score))
        .collect()
}

/// Weighted sum over the typology's rules that appear in the score map.
fn evaluate_typology(typology: &Typology, scores: &HashMap<&str, f64>) -> TypologyResult {
    let mut contributions = Vec::with_capacity(typology.rules.len());
    let mut total_score = 0.0;

    for rule_weight in &typology.rules {
        let Some(&rule_score) = scores.get(rule_weight.rule_id.as_str()) else {
            continue;
        };

        let contribution = rule_score * rule_weight.weight;
        total_score += contribution;

        contributions.push(RuleContribution {
            rule_id: rule_weight.rule_id.clone(),
            rule_score,
            weight: rule_weight.weight,
            contribution,
        });
    }

    TypologyResult {
        typology_id: typology.id.clone(),
        typology_name: typology.name.clone(),
        score: total_score,
        threshold: typology.alert_threshold,
        triggered: total_score >= typology.alert_threshold,
        contributions,
        process_ms: 0,
    }
}
