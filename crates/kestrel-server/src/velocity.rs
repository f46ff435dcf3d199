//! Repository-backed velocity provider

use async_trait::async_trait;
use chrono::{Duration, Utc};
use kestrel_engine::VelocityProvider;
use kestrel_repository::Repository;
use std::sync::Arc;

/// Counts an entity's transactions through the repository.
pub struct RepositoryVelocity {
    repo: Arc<dyn Repository>,
}

impl RepositoryVelocity {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl VelocityProvider for RepositoryVelocity {
    async fn transaction_count(
        &self,
        tenant_id: &str,
        entity_id: &str,
        window_secs: i64,
    ) -> anyhow::Result<i64> {
        if tenant_id.is_empty() || entity_id.is_empty() {
            anyhow::bail!("tenant id and entity id are required");
        }

        let since = Utc::now() - Duration::seconds(window_secs);
        let count = self
            .repo
            .count_transactions_by_entity(tenant_id, entity_id, since)
            .await?;

        Ok(count)
    }
}
