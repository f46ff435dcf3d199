//! In-process LRU cache with TTL support
//!
//! The community-tier cache, also used as L1 in two-phase caching. Counters
//! here are single-process correct only; distributed deployments route
//! counters through the Redis layer.

use super::{make_key, require_tenant, Cache, CacheError};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const DEFAULT_MAX_SIZE: usize = 10_000;

struct CacheEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

struct CounterEntry {
    count: i64,
    expires_at: Instant,
}

struct LruInner {
    entries: HashMap<String, CacheEntry>,
    /// Most recently used keys at the front
    order: VecDeque<String>,
    counters: HashMap<String, CounterEntry>,
}

/// Thread-safe LRU cache with per-entry TTL.
pub struct LruCache {
    max_size: usize,
    inner: Mutex<LruInner>,
}

impl LruCache {
    pub fn new(max_size: usize) -> Self {
        let max_size = if max_size == 0 {
            DEFAULT_MAX_SIZE
        } else {
            max_size
        };

        Self {
            max_size,
            inner: Mutex::new(LruInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
                counters: HashMap::new(),
            }),
        }
    }

    /// Current entry count and capacity.
    pub async fn stats(&self) -> (usize, usize) {
        let inner = self.inner.lock().await;
        (inner.entries.len(), self.max_size)
    }
}

impl LruInner {
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        self.order.push_front(key.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
    }

    fn evict_oldest(&mut self) {
        if let Some(key) = self.order.pop_back() {
            self.entries.remove(&key);
        }
    }
}

#[async_trait]
impl Cache for LruCache {
    async fn get(&self, tenant_id: &str, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        require_tenant(tenant_id)?;
        let full_key = make_key(tenant_id, key);

        let mut inner = self.inner.lock().await;

        let expired = match inner.entries.get(&full_key) {
            None => return Ok(None),
            Some(entry) => Instant::now() > entry.expires_at,
        };

        if expired {
            inner.remove(&full_key);
            return Ok(None);
        }

        inner.touch(&full_key);
        Ok(inner.entries.get(&full_key).map(|e| e.value.clone()))
    }

    async fn set(
        &self,
        tenant_id: &str,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        require_tenant(tenant_id)?;
        let full_key = make_key(tenant_id, key);

        let mut inner = self.inner.lock().await;

        inner.entries.insert(
            full_key.clone(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        inner.touch(&full_key);

        while inner.entries.len() > self.max_size {
            inner.evict_oldest();
        }

        Ok(())
    }

    async fn delete(&self, tenant_id: &str, key: &str) -> Result<(), CacheError> {
        require_tenant(tenant_id)?;
        let full_key = make_key(tenant_id, key);

        let mut inner = self.inner.lock().await;
        inner.remove(&full_key);
        Ok(())
    }

    async fn increment_counter(
        &self,
        tenant_id: &str,
        key: &str,
        window: Duration,
    ) -> Result<i64, CacheError> {
        require_tenant(tenant_id)?;
        let full_key = make_key(tenant_id, &format!("counter:{key}"));

        let mut inner = self.inner.lock().await;
        let now = Instant::now();

        match inner.counters.get_mut(&full_key) {
            Some(entry) if now <= entry.expires_at => {
                entry.count += 1;
                Ok(entry.count)
            }
            _ => {
                // Start a new counter window
                inner.counters.insert(
                    full_key,
                    CounterEntry {
                        count: 1,
                        expires_at: now + window,
                    },
                );
                Ok(1)
            }
        }
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), CacheError> {
        let mut inner = self.inner.lock().await;
        inner.entries.clear();
        inner.order.clear();
        inner.counters.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = LruCache::new(10);

        cache
            .set("t1", "k1", b"v1".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("t1", "k1").await.unwrap(), Some(b"v1".to_vec()));

        cache.delete("t1", "k1").await.unwrap();
        assert_eq!(cache.get("t1", "k1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_tenant_isolation() {
        let cache = LruCache::new(10);

        cache
            .set("t1", "k", b"t1-value".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(cache.get("t2", "k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_empty_tenant_is_an_error() {
        let cache = LruCache::new(10);
        assert!(matches!(
            cache.get("", "k").await,
            Err(CacheError::TenantRequired)
        ));
    }

    #[tokio::test]
    async fn test_expired_entries_are_gone() {
        let cache = LruCache::new(10);

        cache
            .set("t1", "k", b"v".to_vec(), Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.get("t1", "k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_eviction_over_capacity() {
        let cache = LruCache::new(2);

        for key in ["a", "b", "c"] {
            cache
                .set("t1", key, key.as_bytes().to_vec(), Duration::from_secs(60))
                .await
                .unwrap();
        }

        let (size, capacity) = cache.stats().await;
        assert_eq!(size, 2);
        assert_eq!(capacity, 2);
        // The oldest entry was evicted
        assert_eq!(cache.get("t1", "a").await.unwrap(), None);
        assert!(cache.get("t1", "c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_recently_used_survives_eviction() {
        let cache = LruCache::new(2);

        cache
            .set("t1", "a", b"a".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("t1", "b", b"b".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();

        // Touch "a" so "b" becomes the eviction candidate
        cache.get("t1", "a").await.unwrap();
        cache
            .set("t1", "c", b"c".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();

        assert!(cache.get("t1", "a").await.unwrap().is_some());
        assert_eq!(cache.get("t1", "b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_counter_window() {
        let cache = LruCache::new(10);

        assert_eq!(
            cache
                .increment_counter("t1", "tx", Duration::from_secs(60))
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            cache
                .increment_counter("t1", "tx", Duration::from_secs(60))
                .await
                .unwrap(),
            2
        );

        // A different tenant gets its own counter
        assert_eq!(
            cache
                .increment_counter("t2", "tx", Duration::from_secs(60))
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_counter_window_resets_after_expiry() {
        let cache = LruCache::new(10);

        cache
            .increment_counter("t1", "tx", Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(
            cache
                .increment_counter("t1", "tx", Duration::from_millis(10))
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_typed_transaction_cache() {
        let cache = LruCache::new(10);
        let data = super::super::DataCache {
            debtor_id: "A".to_string(),
            creditor_id: "B".to_string(),
            debtor_account_id: "ACC-A".to_string(),
            creditor_account_id: "ACC-B".to_string(),
            amount: 125.0,
            currency: "EUR".to_string(),
            timestamp: "2025-01-01T00:00:00Z".to_string(),
        };

        cache
            .set_transaction("t1", "tx9", &data, Duration::from_secs(60))
            .await
            .unwrap();
        let cached = cache.get_transaction("t1", "tx9").await.unwrap();
        assert_eq!(cached, Some(data));
    }
}
