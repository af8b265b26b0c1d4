//! Redis-backed read-through cache.
//!
//! Used exclusively in front of list-style read endpoints; the relational
//! store stays authoritative. An unreachable Redis at startup degrades the
//! client to a no-op so reads fall through to the store.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::core::config::RedisConfig;
use crate::modules::metrics;

/// Cache key for an owner's list of a resource kind, e.g. `items:7`.
pub fn owner_key(resource_kind: &str, owner_id: i32) -> String {
    format!("{}:{}", resource_kind, owner_id)
}

#[derive(Clone)]
pub struct CacheClient {
    manager: Option<ConnectionManager>,
    ttl_secs: u64,
}

impl CacheClient {
    /// Connect to Redis. A connection failure is logged and yields a
    /// disabled client: gets always miss, sets and deletes are no-ops.
    pub async fn connect(config: &RedisConfig) -> Self {
        let manager = match redis::Client::open(config.url.as_str()) {
            Ok(client) => match client.get_connection_manager().await {
                Ok(manager) => {
                    tracing::info!("Redis cache connected: {}", config.url);
                    Some(manager)
                }
                Err(e) => {
                    tracing::warn!("Redis unavailable, cache disabled: {}", e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Invalid Redis URL, cache disabled: {}", e);
                None
            }
        };

        Self {
            manager,
            ttl_secs: config.cache_ttl_secs,
        }
    }

    #[cfg(test)]
    pub fn disabled() -> Self {
        Self {
            manager: None,
            ttl_secs: 60,
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Look up a serialized value. `Ok(None)` on miss or when disabled.
    pub async fn get(&self, key: &str) -> Result<Option<String>, redis::RedisError> {
        let Some(manager) = &self.manager else {
            return Ok(None);
        };

        let mut conn = manager.clone();
        let result: Result<Option<String>, _> = conn.get(key).await;
        match &result {
            Ok(_) => metrics::record_redis_operation("get", "success"),
            Err(_) => metrics::record_redis_operation("get", "error"),
        }
        result
    }

    /// Store a serialized value with the configured TTL.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), redis::RedisError> {
        let Some(manager) = &self.manager else {
            return Ok(());
        };

        let mut conn = manager.clone();
        let result: Result<(), _> = conn.set_ex(key, value, self.ttl_secs).await;
        match &result {
            Ok(_) => metrics::record_redis_operation("setex", "success"),
            Err(_) => metrics::record_redis_operation("setex", "error"),
        }
        result
    }

    /// Delete a key outright. Invalidation must remove the entry, not mark
    /// it stale, so the next read for the owner hits the store.
    pub async fn delete(&self, key: &str) -> Result<(), redis::RedisError> {
        let Some(manager) = &self.manager else {
            return Ok(());
        };

        let mut conn = manager.clone();
        let result: Result<(), _> = conn.del(key).await;
        match &result {
            Ok(_) => metrics::record_redis_operation("del", "success"),
            Err(_) => metrics::record_redis_operation("del", "error"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_key_format() {
        assert_eq!(owner_key("items", 7), "items:7");
        assert_eq!(owner_key("files", 42), "files:42");
    }

    #[tokio::test]
    async fn disabled_client_degrades_to_store() {
        let cache = CacheClient::disabled();

        // Reads miss, writes and deletes succeed as no-ops
        assert_eq!(cache.get("items:7").await.unwrap(), None);
        assert!(cache.set("items:7", "[]").await.is_ok());
        assert!(cache.delete("items:7").await.is_ok());
    }
}
