//! API wire types

use kestrel_core::domain::{RuleBand, RuleConfig, Typology, TypologyRuleWeight};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Request body for POST /evaluate.
#[derive(Debug, Deserialize)]
pub struct TransactionRequest {
    #[serde(rename = "type")]
    pub tx_type: String,
    pub debtor: PartyInfo,
    pub creditor: PartyInfo,
    pub amount: AmountInfo,
    #[serde(default)]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

/// A debtor or creditor.
#[derive(Debug, Deserialize)]
pub struct PartyInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "accountId")]
    pub account_id: String,
}

/// The transaction amount.
#[derive(Debug, Deserialize)]
pub struct AmountInfo {
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub currency: String,
}

/// Response body for POST /evaluate.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponse {
    pub evaluation_id: String,
    pub tx_id: String,
    pub status: String,
    pub score: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
    pub metadata: EvaluateResponseMetadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponseMetadata {
    pub trace_id: String,
    pub ingest_ms: i64,
    pub total_ms: i64,
    pub version: String,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub mode: String,
}

/// Response body for GET /ready.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub ready: String,
}

/// Request body for POST /rules.
#[derive(Debug, Deserialize)]
pub struct CreateRuleRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub expression: String,
    #[serde(default)]
    pub bands: Vec<RuleBand>,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub enabled: bool,
}

/// Response body for GET /rules.
#[derive(Debug, Serialize)]
pub struct RuleListResponse {
    pub rules: Vec<RuleConfig>,
    pub count: usize,
    pub source: String,
}

/// Response body for POST /rules (201).
#[derive(Debug, Serialize)]
pub struct CreateRuleResponse {
    pub rule: RuleConfig,
    pub message: String,
}

/// Response body for the reload endpoints.
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub message: String,
    pub count: usize,
}

/// Request body for POST /typologies and PUT /typologies/{id}.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTypologyRequest {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rules: Vec<TypologyRuleWeight>,
    #[serde(default)]
    pub alert_threshold: f64,
    #[serde(default)]
    pub enabled: bool,
}

/// Response body for GET /typologies.
#[derive(Debug, Serialize)]
pub struct TypologyListResponse {
    pub typologies: Vec<Typology>,
    pub count: usize,
    pub source: String,
}

/// Response body for POST /typologies (201) and PUT /typologies/{id}.
#[derive(Debug, Serialize)]
pub struct TypologyResponse {
    pub typology: Typology,
    pub message: String,
}

/// Response body for DELETE /typologies/{id}.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
