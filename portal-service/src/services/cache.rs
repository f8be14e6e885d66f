//! Response caching over the key-value store.
//!
//! Keys are derived explicitly per endpoint; mutations invalidate the
//! exact keys and glob patterns they know they touched. Cached bodies
//! are the serialized response JSON, returned verbatim on a hit.

use std::sync::Arc;

use crate::services::kv::KeyValueStore;

const KEY_PREFIX: &str = "cache:";

pub mod keys {
    pub fn person(id: i64) -> String {
        format!("cache:person:{}", id)
    }

    pub fn person_pattern() -> String {
        "cache:person:*".to_string()
    }

    pub fn branches() -> String {
        "cache:branches".to_string()
    }
}

#[derive(Clone)]
pub struct ResponseCache {
    kv: Arc<dyn KeyValueStore>,
    expiry_seconds: i64,
}

impl ResponseCache {
    pub fn new(kv: Arc<dyn KeyValueStore>, expiry_seconds: i64) -> Self {
        Self { kv, expiry_seconds }
    }

    /// Fetch a cached response body. Store failures degrade to a miss
    /// so caching never takes a read path down.
    pub async fn get(&self, key: &str) -> Option<String> {
        debug_assert!(key.starts_with(KEY_PREFIX));
        match self.kv.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %key, "Cache read failed: {}", e);
                None
            }
        }
    }

    pub async fn put(&self, key: &str, body: &str) {
        debug_assert!(key.starts_with(KEY_PREFIX));
        if let Err(e) = self.kv.set_ex(key, body, self.expiry_seconds).await {
            tracing::warn!(key = %key, "Cache write failed: {}", e);
        }
    }

    /// Drop the named keys and everything matching the glob patterns.
    pub async fn invalidate(&self, keys: &[String], patterns: &[String]) {
        for key in keys {
            if let Err(e) = self.kv.delete(key).await {
                tracing::warn!(key = %key, "Cache invalidation failed: {}", e);
            }
        }
        for pattern in patterns {
            if let Err(e) = self.kv.delete_by_pattern(pattern).await {
                tracing::warn!(pattern = %pattern, "Cache pattern invalidation failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::kv::MemoryKv;

    fn cache() -> ResponseCache {
        ResponseCache::new(Arc::new(MemoryKv::new()), 3600)
    }

    #[tokio::test]
    async fn test_put_then_get_returns_body_verbatim() {
        let cache = cache();
        let key = keys::person(7);
        cache.put(&key, r#"{"id":7,"first_name":"Ada"}"#).await;
        assert_eq!(
            cache.get(&key).await.as_deref(),
            Some(r#"{"id":7,"first_name":"Ada"}"#)
        );
    }

    #[tokio::test]
    async fn test_miss_returns_none() {
        assert!(cache().get(&keys::person(404)).await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_exact_key() {
        let cache = cache();
        cache.put(&keys::branches(), "[]").await;
        cache.invalidate(&[keys::branches()], &[]).await;
        assert!(cache.get(&keys::branches()).await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_pattern_clears_all_entries() {
        let cache = cache();
        cache.put(&keys::person(1), "{}").await;
        cache.put(&keys::person(2), "{}").await;
        cache.put(&keys::branches(), "[]").await;

        cache.invalidate(&[], &[keys::person_pattern()]).await;

        assert!(cache.get(&keys::person(1)).await.is_none());
        assert!(cache.get(&keys::person(2)).await.is_none());
        // Unrelated keys survive
        assert!(cache.get(&keys::branches()).await.is_some());
    }
}
