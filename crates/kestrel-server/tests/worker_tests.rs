//! Async worker integration tests
//!
//! The worker must produce the same verdicts as the synchronous path and
//! publish them to the decision/alert topics.

use kestrel_core::domain::{EvaluationMode, RuleBand, RuleConfig, RuleOutcome, GLOBAL_TENANT_ID};
use kestrel_engine::bus::{ChannelBus, TOPIC_ALERT, TOPIC_DECISION, TOPIC_TRANSACTION_INGESTED};
use kestrel_engine::cache::LruCache;
use kestrel_engine::{Processor, RuleEngine, TypologyEngine};
use kestrel_repository::{Repository, RepositoryConfig, SqliteRepository};
use kestrel_server::service::EvaluationService;
use kestrel_server::worker::Worker;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

async fn service(dir: &tempfile::TempDir) -> Arc<EvaluationService> {
    let config = RepositoryConfig {
        sqlite_path: dir
            .path()
            .join("worker-test.db")
            .to_string_lossy()
            .into_owned(),
        ..RepositoryConfig::default()
    };

    let repo: Arc<dyn Repository> =
        Arc::new(SqliteRepository::new(&config).await.expect("open sqlite"));
    let rule_engine = Arc::new(RuleEngine::new(None, 4));

    rule_engine
        .load_one(RuleConfig {
            id: "same-account".to_string(),
            tenant_id: GLOBAL_TENANT_ID.to_string(),
            name: "Same account".to_string(),
            description: String::new(),
            version: "1.0.0".to_string(),
            expression: "debtor_id == creditor_id ? 1.0 : 0.0".to_string(),
            bands: vec![RuleBand {
                lower_limit: Some(1.0),
                upper_limit: None,
                sub_rule_ref: RuleOutcome::Fail,
                reason: "same account transfer".to_string(),
            }],
            weight: 1.0,
            enabled: true,
        })
        .await
        .expect("load rule");

    Arc::new(EvaluationService::new(
        repo,
        Arc::new(LruCache::new(100)),
        Arc::new(ChannelBus::new(16)),
        rule_engine,
        Arc::new(TypologyEngine::new()),
        Processor::new(),
        EvaluationMode::Detection,
    ))
}

fn ingest_message(tx_id: &str, debtor: &str, creditor: &str, amount: f64) -> Vec<u8> {
    json!({
        "txId": tx_id,
        "tenantId": "t1",
        "traceId": format!("trace-{tx_id}"),
        "type": "TRANSFER",
        "debtorId": debtor,
        "creditorId": creditor,
        "amount": amount,
        "currency": "EUR"
    })
    .to_string()
    .into_bytes()
}

#[tokio::test]
async fn worker_publishes_decision_for_clean_transaction() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(&dir).await;
    let bus = Arc::clone(service.bus());

    let mut decisions = bus.subscribe("t1", TOPIC_DECISION).await.unwrap();
    let mut alerts = bus.subscribe("t1", TOPIC_ALERT).await.unwrap();

    let mut worker = Worker::new(Arc::clone(&service));
    worker.start(&["t1".to_string()]).await.unwrap();

    bus.publish(
        "t1",
        TOPIC_TRANSACTION_INGESTED,
        ingest_message("tx-clean", "A", "B", 100.0),
    )
    .await
    .unwrap();

    let decision = timeout(Duration::from_secs(5), decisions.recv())
        .await
        .expect("decision within deadline")
        .expect("decision message");
    let evaluation: serde_json::Value = serde_json::from_slice(&decision.payload).unwrap();
    assert_eq!(evaluation["status"], "NALT");
    assert_eq!(evaluation["txId"], "tx-clean");
    assert_eq!(evaluation["metadata"]["traceId"], "trace-tx-clean");

    // No alert for a clean transaction
    assert!(timeout(Duration::from_millis(200), alerts.recv())
        .await
        .is_err());

    // The evaluation was persisted
    let eval_id = evaluation["id"].as_str().unwrap();
    let stored = service.repo().get_evaluation("t1", eval_id).await.unwrap();
    assert_eq!(stored.tx_id, "tx-clean");

    worker.stop().await;
}

#[tokio::test]
async fn worker_publishes_alert_on_critical_failure() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(&dir).await;
    let bus = Arc::clone(service.bus());

    let mut alerts = bus.subscribe("t1", TOPIC_ALERT).await.unwrap();

    let mut worker = Worker::new(Arc::clone(&service));
    worker.start(&["t1".to_string()]).await.unwrap();

    bus.publish(
        "t1",
        TOPIC_TRANSACTION_INGESTED,
        ingest_message("tx-hot", "X", "X", 100.0),
    )
    .await
    .unwrap();

    let alert = timeout(Duration::from_secs(5), alerts.recv())
        .await
        .expect("alert within deadline")
        .expect("alert message");
    let evaluation: serde_json::Value = serde_json::from_slice(&alert.payload).unwrap();
    assert_eq!(evaluation["status"], "ALRT");
    assert_eq!(evaluation["txId"], "tx-hot");

    worker.stop().await;
}
