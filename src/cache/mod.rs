use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use tracing::{debug, warn};

use crate::error::AppResult;

pub const MOVIES_KEY: &str = "catalog:movies";
pub const THEATRES_KEY: &str = "catalog:theatres";
pub const SNACKS_KEY: &str = "catalog:snacks";

/// Read-through JSON cache for immutable reference lists.
///
/// Seat and booking state never pass through here. Every Redis failure is
/// logged and treated as a miss, so a dead Redis only costs a database read.
#[derive(Clone)]
pub struct CacheService {
    redis: Option<ConnectionManager>,
    ttl_secs: u64,
}

impl CacheService {
    pub async fn connect(redis_url: &str, ttl_secs: u64) -> redis::RedisResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { redis: Some(conn), ttl_secs })
    }

    pub fn disabled() -> Self {
        Self { redis: None, ttl_secs: 0 }
    }

    pub fn is_enabled(&self) -> bool {
        self.redis.is_some()
    }

    pub async fn get_or_load<T, F, Fut>(&self, key: &str, load: F) -> AppResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        if let Some(hit) = self.get_json::<T>(key).await {
            debug!(key, "catalog cache hit");
            return Ok(hit);
        }

        let value = load().await?;
        self.set_json(key, &value).await;
        Ok(value)
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = self.redis.clone()?;

        let data = match conn.get::<_, Option<String>>(key).await {
            Ok(data) => data,
            Err(e) => {
                warn!(key, error = %e, "catalog cache read failed");
                return None;
            }
        };

        match serde_json::from_str(&data?) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "discarding unreadable cache entry");
                None
            }
        }
    }

    async fn set_json<T: Serialize>(&self, key: &str, value: &T) {
        let Some(mut conn) = self.redis.clone() else {
            return;
        };

        let data = match serde_json::to_string(value) {
            Ok(data) => data,
            Err(e) => {
                warn!(key, error = %e, "failed to serialize cache entry");
                return;
            }
        };

        let res: redis::RedisResult<()> = conn.set_ex(key, data, self.ttl_secs).await;
        if let Err(e) = res {
            warn!(key, error = %e, "catalog cache write failed");
        }
    }
}
