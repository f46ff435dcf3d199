//! Cache capability
//!
//! Tenant-scoped caching with a typed transaction cache and fixed-window
//! counters. Two implementations ship in-tree: an in-process LRU for the
//! community profile and a Redis-backed cache for distributed deployments,
//! composable as a two-phase (L1/L2) cache.

mod lru;
mod redis;
mod two_phase;

pub use lru::LruCache;
pub use redis::RedisCache;
pub use two_phase::TwoPhaseCache;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Cache error type
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("tenant id is required")]
    TenantRequired,

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("cache backend error: {0}")]
    Backend(String),
}

/// Cached transaction data passed through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataCache {
    #[serde(rename = "dbtrId")]
    pub debtor_id: String,
    #[serde(rename = "cdtrId")]
    pub creditor_id: String,
    #[serde(rename = "dbtrAcctId")]
    pub debtor_account_id: String,
    #[serde(rename = "cdtrAcctId")]
    pub creditor_account_id: String,
    #[serde(rename = "amt")]
    pub amount: f64,
    #[serde(rename = "ccy")]
    pub currency: String,
    pub timestamp: String,
}

/// The cache capability. Every method is tenant-scoped; an empty tenant id is
/// a hard input error.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Retrieve a value. `Ok(None)` on miss.
    async fn get(&self, tenant_id: &str, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store a value with an expiration.
    async fn set(
        &self,
        tenant_id: &str,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<(), CacheError>;

    /// Remove a value.
    async fn delete(&self, tenant_id: &str, key: &str) -> Result<(), CacheError>;

    /// Atomically increment a fixed-window counter and return the new value.
    /// Used for velocity-style counts.
    async fn increment_counter(
        &self,
        tenant_id: &str,
        key: &str,
        window: Duration,
    ) -> Result<i64, CacheError>;

    /// Health check.
    async fn ping(&self) -> Result<(), CacheError>;

    /// Release resources. Must run before process exit.
    async fn close(&self) -> Result<(), CacheError>;

    /// Retrieve cached transaction data.
    async fn get_transaction(
        &self,
        tenant_id: &str,
        tx_id: &str,
    ) -> Result<Option<DataCache>, CacheError> {
        let Some(raw) = self.get(tenant_id, &tx_key(tx_id)).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    /// Cache transaction data for pipeline processing.
    async fn set_transaction(
        &self,
        tenant_id: &str,
        tx_id: &str,
        data: &DataCache,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let raw = serde_json::to_vec(data)?;
        self.set(tenant_id, &tx_key(tx_id), raw, ttl).await
    }
}

fn tx_key(tx_id: &str) -> String {
    format!("tx:{tx_id}")
}

pub(crate) fn make_key(tenant_id: &str, key: &str) -> String {
    format!("{tenant_id}:{key}")
}

pub(crate) fn require_tenant(tenant_id: &str) -> Result<(), CacheError> {
    if tenant_id.is_empty() {
        Err(CacheError::TenantRequired)
    } else {
        Ok(())
    }
}
