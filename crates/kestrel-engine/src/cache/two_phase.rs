//! Two-phase cache
//!
//! L1: in-process LRU for fast reads. L2: Redis for distributed caching.
//! Reads check L1 then L2 and populate L1 on an L2 hit with a clamped TTL.
//! Writes go through both layers. Counters bypass L1 entirely so they stay
//! accurate across nodes.

use super::{Cache, CacheError, LruCache, RedisCache};
use async_trait::async_trait;
use std::time::Duration;

const DEFAULT_L1_TTL: Duration = Duration::from_secs(300);

/// Layered L1/L2 cache.
pub struct TwoPhaseCache {
    local: LruCache,
    remote: RedisCache,
    l1_ttl: Duration,
}

impl TwoPhaseCache {
    pub fn new(local: LruCache, remote: RedisCache, l1_ttl: Duration) -> Self {
        let l1_ttl = if l1_ttl.is_zero() {
            DEFAULT_L1_TTL
        } else {
            l1_ttl
        };

        Self {
            local,
            remote,
            l1_ttl,
        }
    }

    fn clamp_l1_ttl(&self, ttl: Duration) -> Duration {
        self.l1_ttl.min(ttl)
    }
}

#[async_trait]
impl Cache for TwoPhaseCache {
    async fn get(&self, tenant_id: &str, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        if let Some(value) = self.local.get(tenant_id, key).await? {
            return Ok(Some(value));
        }

        let Some(value) = self.remote.get(tenant_id, key).await? else {
            return Ok(None);
        };

        // Populate L1 for future reads; best-effort
        let _ = self
            .local
            .set(tenant_id, key, value.clone(), self.l1_ttl)
            .await;

        Ok(Some(value))
    }

    async fn set(
        &self,
        tenant_id: &str,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.local
            .set(tenant_id, key, value.clone(), self.clamp_l1_ttl(ttl))
            .await?;
        self.remote.set(tenant_id, key, value, ttl).await
    }

    async fn delete(&self, tenant_id: &str, key: &str) -> Result<(), CacheError> {
        self.local.delete(tenant_id, key).await?;
        self.remote.delete(tenant_id, key).await
    }

    async fn increment_counter(
        &self,
        tenant_id: &str,
        key: &str,
        window: Duration,
    ) -> Result<i64, CacheError> {
        // L2 only: local counters would diverge across processes
        self.remote.increment_counter(tenant_id, key, window).await
    }

    async fn ping(&self) -> Result<(), CacheError> {
        self.local.ping().await?;
        self.remote.ping().await
    }

    async fn close(&self) -> Result<(), CacheError> {
        self.local.close().await?;
        self.remote.close().await
    }
}
