//! API endpoint handlers

use super::extractors::{JsonExtractor, TenantId, TraceId};
use super::types::*;
use crate::error::ServerError;
use crate::service::EvaluateRequest;
use crate::state::AppState;
use crate::VERSION;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use kestrel_core::domain::{RuleConfig, Typology, GLOBAL_TENANT_ID};
use kestrel_engine::RuleEngine;
use std::time::Instant;
use tracing::{error, info, warn};

/// GET /health - liveness plus a degraded flag when dependencies are down or
/// the mode is unready. Always 200.
pub(super) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: state.service.health_status().await.to_string(),
        version: VERSION.to_string(),
        mode: state.service.mode().to_string(),
    })
}

/// GET /ready - 503 until the configured mode can actually evaluate.
pub(super) async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    if state.service.ready().await {
        (
            StatusCode::OK,
            Json(ReadyResponse {
                ready: "true".to_string(),
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyResponse {
                ready: "false".to_string(),
            }),
        )
    }
}

/// POST /evaluate - the synchronous evaluation path.
pub(super) async fn evaluate(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    TraceId(trace_id): TraceId,
    JsonExtractor(payload): JsonExtractor<TransactionRequest>,
) -> Result<Json<EvaluateResponse>, ServerError> {
    let start = Instant::now();

    let request = EvaluateRequest {
        tx_type: payload.tx_type,
        debtor_id: payload.debtor.id,
        debtor_account_id: payload.debtor.account_id,
        creditor_id: payload.creditor.id,
        creditor_account_id: payload.creditor.account_id,
        amount: payload.amount.value,
        currency: payload.amount.currency,
        metadata: payload.metadata,
    };

    let evaluation = state
        .service
        .evaluate(&tenant_id, &trace_id, request, start)
        .await?;

    Ok(Json(EvaluateResponse {
        evaluation_id: evaluation.id.clone(),
        tx_id: evaluation.tx_id.clone(),
        status: evaluation.status.to_string(),
        score: evaluation.score,
        reasons: evaluation.reasons(),
        metadata: EvaluateResponseMetadata {
            trace_id,
            ingest_ms: evaluation.metadata.ingest_ms,
            total_ms: evaluation.metadata.total_ms,
            version: VERSION.to_string(),
        },
    }))
}

/// GET /evaluations/{id}
pub(super) async fn get_evaluation(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    Path(eval_id): Path<String>,
) -> Result<Json<kestrel_core::domain::Evaluation>, ServerError> {
    let evaluation = state.service.repo().get_evaluation(&tenant_id, &eval_id).await?;
    Ok(Json(evaluation))
}

/// GET /transactions/{id}
pub(super) async fn get_transaction(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    Path(tx_id): Path<String>,
) -> Result<Json<kestrel_core::domain::Transaction>, ServerError> {
    let tx = state.service.repo().get_transaction(&tenant_id, &tx_id).await?;
    Ok(Json(tx))
}

/// GET /rules - the live rule set.
pub(super) async fn list_rules(State(state): State<AppState>) -> Json<RuleListResponse> {
    let rules = state.service.rule_engine().list_loaded().await;

    Json(RuleListResponse {
        count: rules.len(),
        rules,
        source: "database".to_string(),
    })
}

/// GET /rules/{id}
pub(super) async fn get_rule(
    State(state): State<AppState>,
    Path(rule_id): Path<String>,
) -> Result<Json<RuleConfig>, ServerError> {
    state
        .service
        .rule_engine()
        .list_loaded()
        .await
        .into_iter()
        .find(|r| r.id == rule_id)
        .map(Json)
        .ok_or_else(|| ServerError::NotFound("rule not found".to_string()))
}

/// POST /rules - validate and persist a rule. The live set is untouched
/// until POST /rules/reload.
pub(super) async fn create_rule(
    State(state): State<AppState>,
    JsonExtractor(payload): JsonExtractor<CreateRuleRequest>,
) -> Result<(StatusCode, Json<CreateRuleResponse>), ServerError> {
    if payload.id.is_empty() || payload.name.is_empty() || payload.expression.is_empty() {
        return Err(ServerError::BadRequest(
            "id, name, and expression are required".to_string(),
        ));
    }

    // Rules are stored globally so they apply to every tenant
    let rule = RuleConfig {
        id: payload.id,
        tenant_id: GLOBAL_TENANT_ID.to_string(),
        name: payload.name,
        description: payload.description,
        version: "1.0.0".to_string(),
        expression: payload.expression,
        bands: payload.bands,
        weight: payload.weight,
        enabled: payload.enabled,
    };

    if let Err(error) = RuleEngine::validate(&rule) {
        return Err(ServerError::BadRequest(format!(
            "invalid expression: {error}"
        )));
    }

    state
        .service
        .repo()
        .save_rule_config(GLOBAL_TENANT_ID, &rule)
        .await
        .map_err(|error| {
            error!(rule_id = rule.id, %error, "failed to save rule config");
            ServerError::Internal(anyhow::anyhow!("failed to save rule"))
        })?;

    info!(rule_id = rule.id, name = rule.name, "rule created");
    Ok((
        StatusCode::CREATED,
        Json(CreateRuleResponse {
            rule,
            message: "Rule created. Call POST /rules/reload to apply changes.".to_string(),
        }),
    ))
}

/// POST /rules/reload - atomically swap the live rule set from persisted
/// configuration.
pub(super) async fn reload_rules(
    State(state): State<AppState>,
) -> Result<Json<ReloadResponse>, ServerError> {
    let count = state
        .service
        .load_rules_from_repository()
        .await
        .map_err(|error| {
            error!(%error, "failed to reload rules");
            ServerError::Internal(error)
        })?;

    info!(count, "rules reloaded from repository");
    Ok(Json(ReloadResponse {
        message: "rules reloaded successfully".to_string(),
        count,
    }))
}

/// GET /typologies - the live typology set.
pub(super) async fn list_typologies(State(state): State<AppState>) -> Json<TypologyListResponse> {
    let typologies = state.service.typology_engine().list_loaded().await;

    Json(TypologyListResponse {
        count: typologies.len(),
        typologies,
        source: "database".to_string(),
    })
}

/// GET /typologies/{id}
pub(super) async fn get_typology(
    State(state): State<AppState>,
    Path(typology_id): Path<String>,
) -> Result<Json<Typology>, ServerError> {
    state
        .service
        .typology_engine()
        .list_loaded()
        .await
        .into_iter()
        .find(|t| t.id == typology_id)
        .map(Json)
        .ok_or_else(|| ServerError::NotFound("typology not found".to_string()))
}

/// POST /typologies - validate and persist a typology. Not live until
/// POST /typologies/reload.
pub(super) async fn create_typology(
    State(state): State<AppState>,
    JsonExtractor(payload): JsonExtractor<CreateTypologyRequest>,
) -> Result<(StatusCode, Json<TypologyResponse>), ServerError> {
    if payload.id.is_empty() || payload.name.is_empty() {
        return Err(ServerError::BadRequest(
            "id and name are required".to_string(),
        ));
    }

    validate_typology_rules(&payload)?;

    // Referenced rules must exist at creation time
    let loaded = state.service.rule_engine().list_loaded().await;
    for rule in &payload.rules {
        if !loaded.iter().any(|r| r.id == rule.rule_id) {
            return Err(ServerError::BadRequest(format!(
                "rule_id '{}' does not exist in rule engine",
                rule.rule_id
            )));
        }
    }

    let typology = typology_from_request(payload.id.clone(), payload);
    save_typology(&state, typology.clone()).await?;

    info!(typology_id = typology.id, name = typology.name, "typology created");
    Ok((
        StatusCode::CREATED,
        Json(TypologyResponse {
            typology,
            message: "Typology created. Call POST /typologies/reload to apply changes.".to_string(),
        }),
    ))
}

/// PUT /typologies/{id}
pub(super) async fn update_typology(
    State(state): State<AppState>,
    Path(typology_id): Path<String>,
    JsonExtractor(payload): JsonExtractor<CreateTypologyRequest>,
) -> Result<Json<TypologyResponse>, ServerError> {
    if payload.name.is_empty() {
        return Err(ServerError::BadRequest("name is required".to_string()));
    }

    validate_typology_rules(&payload)?;

    let typology = typology_from_request(typology_id.clone(), payload);
    save_typology(&state, typology.clone()).await?;

    info!(typology_id, "typology updated");
    Ok(Json(TypologyResponse {
        typology,
        message: "Typology updated. Call POST /typologies/reload to apply changes.".to_string(),
    }))
}

/// DELETE /typologies/{id} - the one mutation that auto-reloads, since a
/// stale typology would keep evaluating against deleted configuration.
pub(super) async fn delete_typology(
    State(state): State<AppState>,
    Path(typology_id): Path<String>,
) -> Result<Json<MessageResponse>, ServerError> {
    state
        .service
        .repo()
        .delete_typology(GLOBAL_TENANT_ID, &typology_id)
        .await
        .map_err(|_| ServerError::NotFound("typology not found".to_string()))?;

    match state.service.load_typologies_from_repository().await {
        Ok(count) => info!(typology_id, count, "typologies auto-reloaded after delete"),
        Err(error) => error!(%error, "failed to reload typologies after delete"),
    }

    Ok(Json(MessageResponse {
        message: "Typology deleted and engine reloaded.".to_string(),
    }))
}

/// POST /typologies/reload
pub(super) async fn reload_typologies(
    State(state): State<AppState>,
) -> Result<Json<ReloadResponse>, ServerError> {
    let count = state
        .service
        .load_typologies_from_repository()
        .await
        .map_err(|error| {
            error!(%error, "failed to reload typologies");
            ServerError::Internal(error)
        })?;

    info!(count, "typologies reloaded from repository");
    Ok(Json(ReloadResponse {
        message: "typologies reloaded successfully".to_string(),
        count,
    }))
}

fn validate_typology_rules(payload: &CreateTypologyRequest) -> Result<(), ServerError> {
    if payload.rules.is_empty() {
        return Err(ServerError::BadRequest(
            "at least one rule is required".to_string(),
        ));
    }

    let mut total_weight = 0.0;
    for rule in &payload.rules {
        if rule.rule_id.is_empty() {
            return Err(ServerError::BadRequest(
                "rule_id cannot be empty".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&rule.weight) {
            return Err(ServerError::BadRequest(
                "rule weight must be between 0 and 1".to_string(),
            ));
        }
        total_weight += rule.weight;
    }

    // Warned, not enforced: downstream scores may exceed 1.0
    if !(0.99..=1.01).contains(&total_weight) {
        warn!(
            typology_id = payload.id,
            total_weight, "typology weights do not sum to 1.0"
        );
    }

    if payload.alert_threshold <= 0.0 || payload.alert_threshold > 1.0 {
        return Err(ServerError::BadRequest(
            "alertThreshold must be between 0 (exclusive) and 1".to_string(),
        ));
    }

    Ok(())
}

fn typology_from_request(id: String, payload: CreateTypologyRequest) -> Typology {
    Typology {
        id,
        tenant_id: GLOBAL_TENANT_ID.to_string(),
        name: payload.name,
        description: payload.description,
        version: "1.0.0".to_string(),
        rules: payload.rules,
        alert_threshold: payload.alert_threshold,
        enabled: payload.enabled,
        created_at: None,
        updated_at: None,
    }
}

async fn save_typology(state: &AppState, typology: Typology) -> Result<(), ServerError> {
    state
        .service
        .repo()
        .save_typology(GLOBAL_TENANT_ID, &typology)
        .await
        .map_err(|error| {
            error!(typology_id = typology.id, %error, "failed to save typology");
            ServerError::Internal(anyhow::anyhow!("failed to save typology"))
        })
}
