use std::time::Duration;

use moka::future::Cache;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Two-tier lookup cache: a small in-process moka tier in front of Redis.
///
/// Holds geocoding results and the seeded catalogs. Both are effectively
/// immutable, so entries just age out on the configured TTL; there is no
/// invalidation traffic between instances.
pub struct CacheManager {
    redis: ConnectionManager,
    local: Cache<String, String>,
    ttl: Duration,
}

impl CacheManager {
    pub async fn new(redis_url: &str, local_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let ttl = Duration::from_secs(ttl_secs);
        let redis = ConnectionManager::new(redis::Client::open(redis_url)?).await?;

        let local = Cache::builder()
            .max_capacity(local_size)
            .time_to_live(ttl)
            .build();

        Ok(Self { redis, local, ttl })
    }

    /// Look a key up, local tier first. `Ok(None)` means a miss in both
    /// tiers; a Redis hit repopulates the local tier on the way out.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        if let Some(json) = self.local.get(key).await {
            tracing::trace!("local cache hit: {}", key);
            return Ok(Some(serde_json::from_str(&json)?));
        }

        // ConnectionManager clones share one multiplexed connection
        let mut redis = self.redis.clone();
        let json: Option<String> = redis.get(key).await?;

        match json {
            Some(json) => {
                tracing::trace!("redis cache hit: {}", key);
                self.local.insert(key.to_string(), json.clone()).await;
                Ok(Some(serde_json::from_str(&json)?))
            }
            None => {
                tracing::trace!("cache miss: {}", key);
                Ok(None)
            }
        }
    }

    /// Write a value through to both tiers.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let json = serde_json::to_string(value)?;
        self.local.insert(key.to_string(), json.clone()).await;

        let mut redis = self.redis.clone();
        redis.set_ex::<_, _, ()>(key, json, self.ttl.as_secs()).await?;

        Ok(())
    }

    /// Drop a key from both tiers.
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.local.invalidate(key).await;

        let mut redis = self.redis.clone();
        redis.del::<_, ()>(key).await?;

        Ok(())
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Key for a geocoded postal code
    pub fn geocode_postal(postal_code: &str) -> String {
        format!("geocode:pc:{}", postal_code)
    }

    /// Key for a geocoded free-form address
    pub fn geocode_address(address: &str) -> String {
        format!("geocode:addr:{}", address)
    }

    /// Key for a seeded catalog (weekdays, schedules)
    pub fn catalog(name: &str) -> String {
        format!("catalog:{}", name)
    }
}
