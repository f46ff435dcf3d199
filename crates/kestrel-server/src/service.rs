//! Evaluation orchestrator
//!
//! One pipeline, two entry points: the HTTP handler (which also validates
//! and persists the incoming transaction) and the async bus worker (which
//! receives pre-ingested transactions). Scoring and mode gating live here so
//! neither path can drift from the other.

use chrono::Utc;
use kestrel_core::domain::{Evaluation, EvaluationMode, Transaction, GLOBAL_TENANT_ID};
use kestrel_engine::bus::EventBus;
use kestrel_engine::cache::Cache;
use kestrel_engine::{DecisionInput, EvaluateInput, Processor, RuleEngine, TypologyEngine};
use kestrel_repository::Repository;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Default velocity window applied to synchronous evaluations, in seconds.
pub const DEFAULT_VELOCITY_WINDOW_SECS: i64 = 3600;

/// Orchestrator-level errors; the API layer maps them onto HTTP statuses.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    NotReady(String),
}

/// A transaction submitted for evaluation.
#[derive(Debug, Clone, Default)]
pub struct EvaluateRequest {
    pub tx_type: String,
    pub debtor_id: String,
    pub debtor_account_id: String,
    pub creditor_id: String,
    pub creditor_account_id: String,
    pub amount: f64,
    pub currency: String,
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

/// The evaluation orchestrator. Reentrant: concurrent evaluations share no
/// mutable state beyond the engines' live sets.
pub struct EvaluationService {
    repo: Arc<dyn Repository>,
    cache: Arc<dyn Cache>,
    bus: Arc<dyn EventBus>,
    rule_engine: Arc<RuleEngine>,
    typology_engine: Arc<TypologyEngine>,
    processor: Processor,
    mode: EvaluationMode,
}

impl EvaluationService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repo: Arc<dyn Repository>,
        cache: Arc<dyn Cache>,
        bus: Arc<dyn EventBus>,
        rule_engine: Arc<RuleEngine>,
        typology_engine: Arc<TypologyEngine>,
        processor: Processor,
        mode: EvaluationMode,
    ) -> Self {
        Self {
            repo,
            cache,
            bus,
            rule_engine,
            typology_engine,
            processor,
            mode,
        }
    }

    pub fn mode(&self) -> EvaluationMode {
        self.mode
    }

    pub fn repo(&self) -> &Arc<dyn Repository> {
        &self.repo
    }

    pub fn bus(&self) -> &Arc<dyn EventBus> {
        &self.bus
    }

    pub fn rule_engine(&self) -> &Arc<RuleEngine> {
        &self.rule_engine
    }

    pub fn typology_engine(&self) -> &Arc<TypologyEngine> {
        &self.typology_engine
    }

    /// Mode readiness: detection is always ready; compliance needs at least
    /// one loaded typology.
    pub async fn ready(&self) -> bool {
        match self.mode {
            EvaluationMode::Detection => true,
            EvaluationMode::Compliance => self.typology_engine.count().await > 0,
        }
    }

    /// Health summary: degraded when unready or when a dependency ping fails.
    pub async fn health_status(&self) -> &'static str {
        if !self.ready().await {
            return "degraded";
        }
        if self.repo.ping().await.is_err() {
            return "degraded";
        }
        if self.cache.ping().await.is_err() {
            return "degraded";
        }
        "healthy"
    }

    /// The synchronous evaluation path: validate, gate on mode readiness,
    /// persist the transaction (best-effort), then run the pipeline.
    pub async fn evaluate(
        &self,
        tenant_id: &str,
        trace_id: &str,
        request: EvaluateRequest,
        start: Instant,
    ) -> Result<Evaluation, ServiceError> {
        if !self.ready().await {
            return Err(ServiceError::NotReady(
                "compliance mode requires at least one typology; create one via POST /typologies"
                    .to_string(),
            ));
        }

        validate_request(&request)?;

        let tx_id = Uuid::new_v4().to_string();
        let ingest_ms = start.elapsed().as_millis() as i64;

        let now = Utc::now();
        let tx = Transaction {
            id: tx_id.clone(),
            tenant_id: tenant_id.to_string(),
            tx_type: request.tx_type.clone(),
            debtor_id: request.debtor_id.clone(),
            debtor_account_id: request.debtor_account_id.clone(),
            creditor_id: request.creditor_id.clone(),
            creditor_account_id: request.creditor_account_id.clone(),
            amount: request.amount,
            currency: request.currency.clone(),
            timestamp: now,
            created_at: now,
            metadata: request.metadata.clone(),
        };

        // Best-effort: producing a verdict outranks persisting the input
        if let Err(error) = self.repo.save_transaction(tenant_id, &tx).await {
            error!(tenant_id, tx_id, %error, "failed to save transaction");
        }

        let input = EvaluateInput {
            tenant_id: tenant_id.to_string(),
            tx_id,
            tx_type: request.tx_type,
            debtor_id: request.debtor_id,
            creditor_id: request.creditor_id,
            amount: request.amount,
            currency: request.currency,
            velocity_window: DEFAULT_VELOCITY_WINDOW_SECS,
            additional_data: request.metadata.unwrap_or_default(),
        };

        Ok(self.run_pipeline(tenant_id, trace_id, input, start, ingest_ms).await)
    }

    /// The shared rules → typologies → decision pipeline, including
    /// best-effort persistence of the evaluation.
    pub async fn run_pipeline(
        &self,
        tenant_id: &str,
        trace_id: &str,
        input: EvaluateInput,
        start: Instant,
        ingest_ms: i64,
    ) -> Evaluation {
        let tx_id = input.tx_id.clone();

        let rule_results = self.rule_engine.evaluate_all(&input).await;

        let typology_results = if self.mode == EvaluationMode::Compliance
            && self.typology_engine.count().await > 0
        {
            self.typology_engine.evaluate(&rule_results).await
        } else {
            Vec::new()
        };

        let evaluation = self.processor.process(&DecisionInput {
            tenant_id: tenant_id.to_string(),
            tx_id: tx_id.clone(),
            trace_id: trace_id.to_string(),
            rule_results,
            typology_results,
            start_time: start,
            ingest_ms,
        });

        if let Err(error) = self.repo.save_evaluation(tenant_id, &evaluation).await {
            error!(tenant_id, tx_id, %error, "failed to save evaluation");
        }

        info!(
            tenant_id,
            tx_id,
            status = %evaluation.status,
            score = evaluation.score,
            rules = evaluation.metadata.rules_evaluated,
            "transaction evaluated"
        );

        evaluation
    }

    /// Load rules and typologies from the repository into the engines.
    /// Used at startup and by the reload endpoints; an empty table is fine.
    pub async fn load_rules_from_repository(&self) -> Result<usize, anyhow::Error> {
        let configs = self.repo.list_rule_configs(GLOBAL_TENANT_ID).await?;
        let count = configs.len();
        self.rule_engine.reload_all(configs).await?;
        Ok(count)
    }

    pub async fn load_typologies_from_repository(&self) -> Result<usize, anyhow::Error> {
        let typologies = self.repo.list_typologies(GLOBAL_TENANT_ID).await?;
        let count = typologies.len();
        self.typology_engine.reload_all(typologies).await;
        Ok(count)
    }

    /// Startup load: a missing or empty configuration store is not fatal,
    /// rules can be added through the API afterwards.
    pub async fn load_at_startup(&self) {
        match self.load_rules_from_repository().await {
            Ok(count) => info!(count, "rules loaded from repository"),
            Err(error) => warn!(%error, "failed to load rules at startup, starting empty"),
        }
        match self.load_typologies_from_repository().await {
            Ok(count) => info!(count, "typologies loaded from repository"),
            Err(error) => warn!(%error, "failed to load typologies at startup, starting empty"),
        }
    }
}

fn validate_request(request: &EvaluateRequest) -> Result<(), ServiceError> {
    if request.tx_type.is_empty() {
        return Err(ServiceError::Invalid("type is required".to_string()));
    }
    if request.debtor_id.is_empty() || request.creditor_id.is_empty() {
        return Err(ServiceError::Invalid(
            "debtor.id and creditor.id are required".to_string(),
        ));
    }
    if request.amount <= 0.0 {
        return Err(ServiceError::Invalid(
            "amount.value must be positive".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(amount: f64) -> EvaluateRequest {
        EvaluateRequest {
            tx_type: "TRANSFER".to_string(),
            debtor_id: "A".to_string(),
            debtor_account_id: "ACC-A".to_string(),
            creditor_id: "B".to_string(),
            creditor_account_id: "ACC-B".to_string(),
            amount,
            currency: "EUR".to_string(),
            metadata: None,
        }
    }

    #[test]
    fn test_validate_request() {
        assert!(validate_request(&request(100.0)).is_ok());

        let mut missing_type = request(100.0);
        missing_type.tx_type.clear();
        assert!(validate_request(&missing_type).is_err());

        let mut missing_party = request(100.0);
        missing_party.creditor_id.clear();
        assert!(validate_request(&missing_party).is_err());

        assert!(validate_request(&request(0.0)).is_err());
        assert!(validate_request(&request(-5.0)).is_err());
    }
}
