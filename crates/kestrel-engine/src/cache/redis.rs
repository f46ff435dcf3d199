//! Redis-backed cache
//!
//! The distributed cache for the pro profile. Counters use `INCR` with an
//! expiry set on the first increment, so they are correct across processes.

use super::{make_key, require_tenant, Cache, CacheError};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

/// Redis cache client. `ConnectionManager` reconnects on failure and is
/// cheap to clone per operation.
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connect to Redis. `addr` is `host:port`.
    pub async fn new(addr: &str, password: &str, db: i64) -> Result<Self, CacheError> {
        let url = if password.is_empty() {
            format!("redis://{addr}/{db}")
        } else {
            format!("redis://:{password}@{addr}/{db}")
        };

        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;

        Ok(Self { conn })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, tenant_id: &str, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        require_tenant(tenant_id)?;
        let mut conn = self.conn.clone();

        let value: Option<Vec<u8>> = conn.get(make_key(tenant_id, key)).await?;
        Ok(value)
    }

    async fn set(
        &self,
        tenant_id: &str,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        require_tenant(tenant_id)?;
        let mut conn = self.conn.clone();

        let ttl_secs = ttl.as_secs().max(1);
        let _: () = conn
            .set_ex(make_key(tenant_id, key), value, ttl_secs)
            .await?;
        Ok(())
    }

    async fn delete(&self, tenant_id: &str, key: &str) -> Result<(), CacheError> {
        require_tenant(tenant_id)?;
        let mut conn = self.conn.clone();

        let _: () = conn.del(make_key(tenant_id, key)).await?;
        Ok(())
    }

    async fn increment_counter(
        &self,
        tenant_id: &str,
        key: &str,
        window: Duration,
    ) -> Result<i64, CacheError> {
        require_tenant(tenant_id)?;
        let mut conn = self.conn.clone();
        let full_key = make_key(tenant_id, &format!("counter:{key}"));

        let count: i64 = conn.incr(&full_key, 1).await?;
        if count == 1 {
            // First increment opens the window
            let _: bool = conn
                .expire(&full_key, window.as_secs().max(1) as i64)
                .await?;
        }

        Ok(count)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), CacheError> {
        // ConnectionManager has no explicit shutdown; dropping closes sockets
        Ok(())
    }
}
