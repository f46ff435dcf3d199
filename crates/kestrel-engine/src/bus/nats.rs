//! NATS-backed event bus
//!
//! The pro-profile bus. The client reconnects with backoff on its own;
//! subjects are tenant-scoped as `kestrel.<tenant>.<topic>`.

use super::{require_tenant, BusError, EventBus, Message, Subscription};
use async_trait::async_trait;

/// NATS event bus.
pub struct NatsBus {
    client: async_nats::Client,
}

impl NatsBus {
    /// Connect to a NATS server, e.g. `nats://localhost:4222`.
    pub async fn new(url: &str) -> Result<Self, BusError> {
        let client = async_nats::connect(url)
            .await
            .map_err(|e| BusError::Connect(e.to_string()))?;

        Ok(Self { client })
    }

    fn subject(tenant_id: &str, topic: &str) -> String {
        format!("kestrel.{tenant_id}.{topic}")
    }
}

#[async_trait]
impl EventBus for NatsBus {
    async fn publish(&self, tenant_id: &str, topic: &str, payload: Vec<u8>) -> Result<(), BusError> {
        require_tenant(tenant_id)?;

        let message = Message::new(tenant_id, topic, payload);
        let encoded = serde_json::to_vec(&message)?;

        self.client
            .publish(Self::subject(tenant_id, topic), encoded.into())
            .await
            .map_err(|e| BusError::Backend(e.to_string()))
    }

    async fn subscribe(&self, tenant_id: &str, topic: &str) -> Result<Subscription, BusError> {
        require_tenant(tenant_id)?;

        let subscriber = self
            .client
            .subscribe(Self::subject(tenant_id, topic))
            .await
            .map_err(|e| BusError::Backend(e.to_string()))?;

        Ok(Subscription::nats(topic.to_string(), subscriber))
    }

    async fn ping(&self) -> Result<(), BusError> {
        self.client
            .flush()
            .await
            .map_err(|e| BusError::Backend(e.to_string()))
    }

    async fn close(&self) -> Result<(), BusError> {
        // Flush pending publishes; the connection closes on drop
        self.client
            .flush()
            .await
            .map_err(|e| BusError::Backend(e.to_string()))
    }
}
