//! Key-value store access.
//!
//! A single object-safe trait fronts Redis so that the verification
//! state machine, rate-limit counters and the response cache can be
//! exercised against an in-memory double in tests.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client};

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error>;
    async fn set_ex(&self, key: &str, value: &str, expiry_seconds: i64)
        -> Result<(), anyhow::Error>;
    async fn delete(&self, key: &str) -> Result<(), anyhow::Error>;
    /// Delete every key matching a glob pattern, via cursor-based SCAN.
    async fn delete_by_pattern(&self, pattern: &str) -> Result<(), anyhow::Error>;
    /// Atomic increment-and-get.
    async fn incr(&self, key: &str) -> Result<i64, anyhow::Error>;
    async fn expire(&self, key: &str, seconds: i64) -> Result<(), anyhow::Error>;
    async fn ping(&self) -> Result<(), anyhow::Error>;
}

#[derive(Clone)]
pub struct RedisKv {
    _client: Client,
    manager: ConnectionManager,
}

impl RedisKv {
    pub async fn new(config: &crate::config::RedisConfig) -> Result<Self, anyhow::Error> {
        tracing::info!(url = %config.url, "Connecting to Redis");
        let client = Client::open(config.url.clone())?;

        // ConnectionManager reconnects automatically
        let manager = client.get_connection_manager().await.map_err(|e| {
            tracing::error!("Failed to get Redis connection manager: {}", e);
            anyhow::anyhow!("Failed to connect to Redis: {}", e)
        })?;

        tracing::info!("Successfully connected to Redis");

        Ok(Self {
            _client: client,
            manager,
        })
    }
}

#[async_trait]
impl KeyValueStore for RedisKv {
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get key {}: {}", key, e))
    }

    async fn set_ex(
        &self,
        key: &str,
        value: &str,
        expiry_seconds: i64,
    ) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(expiry_seconds)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to set key {}: {}", key, e))
    }

    async fn delete(&self, key: &str) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("DEL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to delete key {}: {}", key, e))
    }

    async fn delete_by_pattern(&self, pattern: &str) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        let mut cursor: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to scan pattern {}: {}", pattern, e))?;

            if !keys.is_empty() {
                redis::cmd("DEL")
                    .arg(&keys)
                    .query_async::<_, ()>(&mut conn)
                    .await
                    .map_err(|e| anyhow::anyhow!("Failed to delete scanned keys: {}", e))?;
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64, anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("INCR")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to increment key {}: {}", key, e))
    }

    async fn expire(&self, key: &str, seconds: i64) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("EXPIRE")
            .arg(key)
            .arg(seconds)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to set expiry on key {}: {}", key, e))
    }

    async fn ping(&self) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Redis health check failed: {}", e))
    }
}

/// In-memory double for tests. Expiries are recorded but only consulted
/// for counters reset explicitly by tests.
#[derive(Default)]
pub struct MemoryKv {
    entries: std::sync::Mutex<std::collections::HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<
        std::sync::MutexGuard<'_, std::collections::HashMap<String, String>>,
        anyhow::Error,
    > {
        self.entries
            .lock()
            .map_err(|e| anyhow::anyhow!("MemoryKv mutex poisoned: {}", e))
    }
}

#[async_trait]
impl KeyValueStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set_ex(
        &self,
        key: &str,
        value: &str,
        _expiry_seconds: i64,
    ) -> Result<(), anyhow::Error> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), anyhow::Error> {
        self.lock()?.remove(key);
        Ok(())
    }

    async fn delete_by_pattern(&self, pattern: &str) -> Result<(), anyhow::Error> {
        // Supports the prefix* patterns the cache layer emits
        let prefix = pattern.trim_end_matches('*');
        self.lock()?.retain(|k, _| !k.starts_with(prefix));
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64, anyhow::Error> {
        let mut entries = self.lock()?;
        let current: i64 = entries
            .get(key)
            .map(|v| v.parse().unwrap_or(0))
            .unwrap_or(0);
        let next = current + 1;
        entries.insert(key.to_string(), next.to_string());
        Ok(next)
    }

    async fn expire(&self, _key: &str, _seconds: i64) -> Result<(), anyhow::Error> {
        Ok(())
    }

    async fn ping(&self) -> Result<(), anyhow::Error> {
        Ok(())
    }
}
