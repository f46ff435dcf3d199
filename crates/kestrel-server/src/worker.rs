//! Async evaluation worker
//!
//! Subscribes to `transaction.ingested` on the event bus and runs each
//! message through the same orchestrator pipeline as the HTTP path, then
//! publishes the evaluation to `decision` (and `alert` when it alerts).

use crate::service::{EvaluationService, DEFAULT_VELOCITY_WINDOW_SECS};
use kestrel_engine::bus::{
    BusError, Message, TOPIC_ALERT, TOPIC_DECISION, TOPIC_TRANSACTION_INGESTED,
};
use kestrel_engine::EvaluateInput;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Payload of a `transaction.ingested` message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMessage {
    pub tx_id: String,
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub trace_id: String,
    #[serde(rename = "type")]
    pub tx_type: String,
    pub debtor_id: String,
    pub creditor_id: String,
    pub amount: f64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub velocity_window: i64,
    #[serde(default)]
    pub additional_data: HashMap<String, serde_json::Value>,
}

/// Processes transactions asynchronously from the event bus.
pub struct Worker {
    service: Arc<EvaluationService>,
    handles: Vec<JoinHandle<()>>,
}

impl Worker {
    pub fn new(service: Arc<EvaluationService>) -> Self {
        Self {
            service,
            handles: Vec::new(),
        }
    }

    /// Start one subscription per tenant; an empty list subscribes under the
    /// global tenant for single-process development setups.
    pub async fn start(&mut self, tenants: &[String]) -> Result<(), BusError> {
        let tenants: Vec<String> = if tenants.is_empty() {
            vec!["_global".to_string()]
        } else {
            tenants.to_vec()
        };

        for tenant_id in tenants {
            let mut subscription = self
                .service
                .bus()
                .subscribe(&tenant_id, TOPIC_TRANSACTION_INGESTED)
                .await?;

            let service = Arc::clone(&self.service);
            let handle = tokio::spawn(async move {
                while let Some(message) = subscription.recv().await {
                    process_message(&service, message).await;
                }
                debug!(tenant_id, "worker subscription ended");
            });

            self.handles.push(handle);
        }

        info!(subscriptions = self.handles.len(), "async worker started");
        Ok(())
    }

    /// Stop all subscriptions.
    pub async fn stop(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        info!("async worker stopped");
    }
}

async fn process_message(service: &EvaluationService, message: Message) {
    let start = Instant::now();

    let tx_msg: TransactionMessage = match serde_json::from_slice(&message.payload) {
        Ok(parsed) => parsed,
        Err(error) => {
            error!(message_id = message.id, %error, "failed to parse transaction message");
            return;
        }
    };

    // The payload's tenant wins over the subscription tenant
    let tenant_id = if tx_msg.tenant_id.is_empty() {
        message.tenant_id.clone()
    } else {
        tx_msg.tenant_id.clone()
    };

    let trace_id = if tx_msg.trace_id.is_empty() {
        message.id.clone()
    } else {
        tx_msg.trace_id.clone()
    };

    let velocity_window = if tx_msg.velocity_window > 0 {
        tx_msg.velocity_window
    } else {
        DEFAULT_VELOCITY_WINDOW_SECS
    };

    let input = EvaluateInput {
        tenant_id: tenant_id.clone(),
        tx_id: tx_msg.tx_id.clone(),
        tx_type: tx_msg.tx_type,
        debtor_id: tx_msg.debtor_id,
        creditor_id: tx_msg.creditor_id,
        amount: tx_msg.amount,
        currency: tx_msg.currency,
        velocity_window,
        additional_data: tx_msg.additional_data,
    };

    let evaluation = service
        .run_pipeline(&tenant_id, &trace_id, input, start, 0)
        .await;

    let payload = match serde_json::to_vec(&evaluation) {
        Ok(payload) => payload,
        Err(error) => {
            error!(tx_id = tx_msg.tx_id, %error, "failed to encode evaluation");
            return;
        }
    };

    if let Err(error) = service
        .bus()
        .publish(&tenant_id, TOPIC_DECISION, payload.clone())
        .await
    {
        error!(tx_id = tx_msg.tx_id, %error, "failed to publish decision");
    }

    if evaluation.should_alert() {
        if let Err(error) = service.bus().publish(&tenant_id, TOPIC_ALERT, payload).await {
            error!(tx_id = tx_msg.tx_id, %error, "failed to publish alert");
        }
    }
}
