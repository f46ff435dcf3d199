//! Event bus capability
//!
//! Tenant-scoped publish/subscribe used by the async evaluation worker.
//! Publishes are fire-and-forget. Two implementations: an in-process channel
//! bus (community profile, single process) and a NATS-backed bus (pro
//! profile, reconnecting client).

mod channel;
mod nats;

pub use channel::ChannelBus;
pub use nats::NatsBus;

use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Topic for transactions accepted into the system.
pub const TOPIC_TRANSACTION_INGESTED: &str = "transaction.ingested";
/// Topic for completed evaluations.
pub const TOPIC_DECISION: &str = "decision";
/// Topic for evaluations that raised an alert.
pub const TOPIC_ALERT: &str = "alert";

/// Event bus error type
#[derive(Error, Debug)]
pub enum BusError {
    #[error("tenant id is required")]
    TenantRequired,

    #[error("bus is closed")]
    Closed,

    #[error("connect failed: {0}")]
    Connect(String),

    #[error("bus backend error: {0}")]
    Backend(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The envelope every subscriber receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub tenant_id: String,
    pub topic: String,
    pub payload: Vec<u8>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Unix timestamp in nanoseconds
    pub timestamp: i64,
}

impl Message {
    pub fn new(tenant_id: &str, topic: &str, payload: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            topic: topic.to_string(),
            payload,
            metadata: HashMap::new(),
            timestamp: Utc::now().timestamp_nanos_opt().unwrap_or_default(),
        }
    }
}

/// An active subscription. Dropping it unsubscribes.
pub struct Subscription {
    topic: String,
    inner: SubscriptionInner,
}

enum SubscriptionInner {
    Channel(mpsc::Receiver<Message>),
    Nats(async_nats::Subscriber),
}

impl Subscription {
    pub(crate) fn channel(topic: String, receiver: mpsc::Receiver<Message>) -> Self {
        Self {
            topic,
            inner: SubscriptionInner::Channel(receiver),
        }
    }

    pub(crate) fn nats(topic: String, subscriber: async_nats::Subscriber) -> Self {
        Self {
            topic,
            inner: SubscriptionInner::Nats(subscriber),
        }
    }

    /// The subscribed topic.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Receive the next message. `None` when the bus side has closed.
    pub async fn recv(&mut self) -> Option<Message> {
        match &mut self.inner {
            SubscriptionInner::Channel(receiver) => receiver.recv().await,
            SubscriptionInner::Nats(subscriber) => loop {
                let raw = subscriber.next().await?;
                match serde_json::from_slice::<Message>(&raw.payload) {
                    Ok(message) => return Some(message),
                    Err(error) => {
                        tracing::warn!(%error, "discarding undecodable bus message");
                    }
                }
            },
        }
    }
}

/// The event bus capability. All operations are tenant-scoped.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish a message to a topic. Fire-and-forget: slow subscribers may
    /// miss messages, publishers never block on them.
    async fn publish(&self, tenant_id: &str, topic: &str, payload: Vec<u8>) -> Result<(), BusError>;

    /// Subscribe to a topic.
    async fn subscribe(&self, tenant_id: &str, topic: &str) -> Result<Subscription, BusError>;

    /// Health check.
    async fn ping(&self) -> Result<(), BusError>;

    /// Release resources. Must run before process exit.
    async fn close(&self) -> Result<(), BusError>;
}

pub(crate) fn require_tenant(tenant_id: &str) -> Result<(), BusError> {
    if tenant_id.is_empty() {
        Err(BusError::TenantRequired)
    } else {
        Ok(())
    }
}
