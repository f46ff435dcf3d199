//! Channel-backed event bus
//!
//! Single-process bus built on bounded tokio channels. Each subscriber has
//! its own buffer; when it is full the publisher drops the message for that
//! subscriber instead of blocking.

use super::{require_tenant, BusError, EventBus, Message, Subscription};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::sync::RwLock;
use tracing::debug;

const DEFAULT_BUFFER_SIZE: usize = 1000;

struct ChannelBusInner {
    subscriptions: HashMap<String, Vec<mpsc::Sender<Message>>>,
    closed: bool,
}

/// In-process event bus.
pub struct ChannelBus {
    buffer_size: usize,
    inner: RwLock<ChannelBusInner>,
}

impl ChannelBus {
    pub fn new(buffer_size: usize) -> Self {
        let buffer_size = if buffer_size == 0 {
            DEFAULT_BUFFER_SIZE
        } else {
            buffer_size
        };

        Self {
            buffer_size,
            inner: RwLock::new(ChannelBusInner {
                subscriptions: HashMap::new(),
                closed: false,
            }),
        }
    }

    fn make_key(tenant_id: &str, topic: &str) -> String {
        format!("{tenant_id}:{topic}")
    }
}

#[async_trait]
impl EventBus for ChannelBus {
    async fn publish(&self, tenant_id: &str, topic: &str, payload: Vec<u8>) -> Result<(), BusError> {
        require_tenant(tenant_id)?;

        let message = Message::new(tenant_id, topic, payload);
        let key = Self::make_key(tenant_id, topic);
        let mut any_closed = false;

        {
            let inner = self.inner.read().await;
            if inner.closed {
                return Err(BusError::Closed);
            }

            if let Some(senders) = inner.subscriptions.get(&key) {
                for sender in senders {
                    match sender.try_send(message.clone()) {
                        Ok(()) => {}
                        Err(mpsc::error::TrySendError::Full(_)) => {
                            debug!(topic, "subscriber buffer full, dropping message");
                        }
                        Err(mpsc::error::TrySendError::Closed(_)) => {
                            any_closed = true;
                        }
                    }
                }
            }
        }

        // Prune subscribers that went away
        if any_closed {
            let mut inner = self.inner.write().await;
            if let Some(senders) = inner.subscriptions.get_mut(&key) {
                senders.retain(|s| !s.is_closed());
            }
        }

        Ok(())
    }

    async fn subscribe(&self, tenant_id: &str, topic: &str) -> Result<Subscription, BusError> {
        require_tenant(tenant_id)?;

        let mut inner = self.inner.write().await;
        if inner.closed {
            return Err(BusError::Closed);
        }

        let (sender, receiver) = mpsc::channel(self.buffer_size);
        inner
            .subscriptions
            .entry(Self::make_key(tenant_id, topic))
            .or_default()
            .push(sender);

        Ok(Subscription::channel(topic.to_string(), receiver))
    }

    async fn ping(&self) -> Result<(), BusError> {
        if self.inner.read().await.closed {
            return Err(BusError::Closed);
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), BusError> {
        let mut inner = self.inner.write().await;
        inner.closed = true;
        // Dropping the senders ends every subscription stream
        inner.subscriptions.clear();
        Ok(())
    }
}
