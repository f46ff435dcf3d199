//! Rule engine
//!
//! Holds the live set of compiled rules and evaluates them in parallel
//! against incoming transactions. The live set is published atomically: every
//! mutation builds a fresh map behind an `Arc` and swaps it in under the
//! write lock, so readers snapshot either the old or the new set, never a
//! partially built one.

use crate::activation::{build_activation, Activation};
use crate::error::EngineError;
use crate::executor::Executor;
use crate::velocity::VelocityProvider;
use kestrel_compiler::RuleCompiler;
use kestrel_core::domain::{RuleBand, RuleConfig, RuleOutcome, RuleResult};
use kestrel_core::ir::Program;
use kestrel_core::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{RwLock, Semaphore};
use tokio::task::JoinSet;
use tracing::warn;

const DEFAULT_MAX_WORKERS: usize = 10;

/// A rule config paired with its compiled program. Never mutated after
/// publication; shared across all evaluations using the snapshot.
#[derive(Debug)]
pub struct CompiledRule {
    pub config: RuleConfig,
    pub program: Program,
}

/// Transaction data for rule evaluation.
#[derive(Debug, Clone, Default)]
pub struct EvaluateInput {
    pub tenant_id: String,
    pub tx_id: String,
    pub tx_type: String,
    pub debtor_id: String,
    pub creditor_id: String,
    pub amount: f64,
    pub currency: String,
    /// Velocity window in seconds; 0 disables the velocity lookup
    pub velocity_window: i64,
    pub additional_data: HashMap<String, serde_json::Value>,
}

type RuleSet = HashMap<String, Arc<CompiledRule>>;

/// The rule evaluation engine.
pub struct RuleEngine {
    rules: RwLock<Arc<RuleSet>>,
    velocity: Option<Arc<dyn VelocityProvider>>,
    max_workers: usize,
}

impl RuleEngine {
    /// Create a new rule engine. `max_workers` bounds per-request evaluation
    /// parallelism; non-positive values fall back to a small default.
    pub fn new(velocity: Option<Arc<dyn VelocityProvider>>, max_workers: usize) -> Self {
        let max_workers = if max_workers == 0 {
            DEFAULT_MAX_WORKERS
        } else {
            max_workers
        };

        Self {
            rules: RwLock::new(Arc::new(HashMap::new())),
            velocity,
            max_workers,
        }
    }

    /// Compile-check a rule without touching the live set.
    pub fn validate(config: &RuleConfig) -> Result<(), EngineError> {
        Self::compile_rule(config).map(|_| ())
    }

    /// Compile and publish a single rule, replacing any entry with the same
    /// id. Compile errors leave the live set unchanged. Disabled configs are
    /// ignored.
    pub async fn load_one(&self, config: RuleConfig) -> Result<(), EngineError> {
        if !config.enabled {
            return Ok(());
        }

        let compiled = Self::compile_rule(&config)?;

        let mut guard = self.rules.write().await;
        let mut next: RuleSet = (**guard).clone();
        next.insert(config.id.clone(), Arc::new(compiled));
        *guard = Arc::new(next);

        Ok(())
    }

    /// Load several rules, preserving existing entries whose ids are not in
    /// `configs`.
    pub async fn load_all(&self, configs: Vec<RuleConfig>) -> Result<(), EngineError> {
        for config in configs {
            self.load_one(config).await?;
        }
        Ok(())
    }

    /// Replace the entire live set. All-or-nothing: every config must compile
    /// before the swap happens; a single failure leaves the live set as-is.
    pub async fn reload_all(&self, configs: Vec<RuleConfig>) -> Result<(), EngineError> {
        let mut next: RuleSet = HashMap::with_capacity(configs.len());

        for config in configs {
            if !config.enabled {
                continue;
            }
            let compiled = Self::compile_rule(&config)?;
            next.insert(config.id.clone(), Arc::new(compiled));
        }

        let mut guard = self.rules.write().await;
        *guard = Arc::new(next);

        Ok(())
    }

    /// Snapshot of the currently loaded rule configs.
    pub async fn list_loaded(&self) -> Vec<RuleConfig> {
        let guard = self.rules.read().await;
        guard.values().map(|r| r.config.clone()).collect()
    }

    /// Number of loaded rules.
    pub async fn rules_count(&self) -> usize {
        self.rules.read().await.len()
    }

    /// Evaluate all loaded rules against the input, in parallel, bounded by
    /// the configured worker limit. Results keep the positions of the
    /// snapshot taken at the start of the call.
    pub async fn evaluate_all(&self, input: &EvaluateInput) -> Vec<RuleResult> {
        let snapshot: Vec<Arc<CompiledRule>> = {
            let guard = self.rules.read().await;
            guard.values().cloned().collect()
        };

        if snapshot.is_empty() {
            return Vec::new();
        }

        let velocity_count = self.velocity_count(input).await;
        let activation = Arc::new(build_activation(input, velocity_count));
        let semaphore = Arc::new(Semaphore::new(self.max_workers));

        let mut tasks: JoinSet<(usize, RuleResult)> = JoinSet::new();
        for (idx, rule) in snapshot.iter().enumerate() {
            let rule = Arc::clone(rule);
            let activation = Arc::clone(&activation);
            let semaphore = Arc::clone(&semaphore);
            let tenant_id = input.tenant_id.clone();
            let tx_id = input.tx_id.clone();

            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            idx,
                            error_result(&rule.config, &tenant_id, &tx_id, "evaluation cancelled"),
                        )
                    }
                };

                (idx, evaluate_rule(&rule, &activation, &tenant_id, &tx_id))
            });
        }

        let mut slots: Vec<Option<RuleResult>> = vec![None; snapshot.len()];
        while let Some(joined) = tasks.join_next().await {
            if let Ok((idx, result)) = joined {
                slots[idx] = Some(result);
            }
        }

        slots.into_iter().flatten().collect()
    }

    async fn velocity_count(&self, input: &EvaluateInput) -> i64 {
        let Some(provider) = &self.velocity else {
            return 0;
        };
        if input.velocity_window <= 0 {
            return 0;
        }

        match provider
            .transaction_count(&input.tenant_id, &input.debtor_id, input.velocity_window)
            .await
        {
            Ok(count) => count,
            Err(error) => {
                warn!(
                    tenant_id = %input.tenant_id,
                    entity_id = %input.debtor_id,
                    window_secs = input.velocity_window,
                    %error,
                    "velocity lookup failed, defaulting count to 0"
                );
                0
            }
        }
    }

    fn compile_rule(config: &RuleConfig) -> Result<CompiledRule, EngineError> {
        let program =
            RuleCompiler::compile(&config.expression).map_err(|source| EngineError::Compile {
                rule_id: config.id.clone(),
                source,
            })?;

        Ok(CompiledRule {
            config: config.clone(),
            program,
        })
    }
}

/// Evaluate a single rule against the shared activation.
fn evaluate_rule(
    rule: &CompiledRule,
    activation: &Activation,
    tenant_id: &str,
    tx_id: &str,
) -> RuleResult {
    let start = Instant::now();

    let mut result = RuleResult {
        rule_id: rule.config.id.clone(),
        tenant_id: tenant_id.to_string(),
        tx_id: tx_id.to_string(),
        sub_rule_ref: RuleOutcome::Pass,
        score: 0.0,
        reason: String::new(),
        weight: rule.config.weight,
        process_ms: 0,
    };

    match Executor::execute(&rule.program, activation) {
        Ok(value) => {
            result.score = to_score(&value);
            let (outcome, reason) = match_band(result.score, &rule.config.bands);
            result.sub_rule_ref = outcome;
            result.reason = reason;
        }
        Err(error) => {
            result.sub_rule_ref = RuleOutcome::Err;
            result.reason = format!("evaluation error: {error}");
        }
    }

    result.process_ms = start.elapsed().as_millis() as i64;
    result
}

fn error_result(config: &RuleConfig, tenant_id: &str, tx_id: &str, reason: &str) -> RuleResult {
    RuleResult {
        rule_id: config.id.clone(),
        tenant_id: tenant_id.to_string(),
        tx_id: tx_id.to_string(),
        sub_rule_ref: RuleOutcome::Err,
        score: 0.0,
        reason: reason.to_string(),
        weight: config.weight,
        process_ms: 0,
    }
}

/// Convert a program result to a numeric score.
fn to_score(value: &Value) -> f64 {
    match value {
        Value::Bool(true) => 1.0,
        Value::Bool(false) => 0.0,
        Value::Number(n) => *n,
        _ => 0.0,
    }
}

/// Find the matching band for a score.
///
/// Bands are matched in declaration order over `[lower, upper)`: lower
/// inclusive (default 0.0), upper exclusive (absent means unbounded above).
fn match_band(score: f64, bands: &[RuleBand]) -> (RuleOutcome, String) {
    for band in bands {
        let lower = band.lower_limit.unwrap_or(0.0);
        if score < lower {
            continue;
        }
        match band.upper_limit {
            None => return (band.sub_rule_ref, band.reason.clone()),
            Some(upper) if score < upper => return (band.sub_rule_ref, band.reason.clone()),
            Some(_) => {}
        }
    }

    (RuleOutcome::Pass, "no matching band".to_string())
}
