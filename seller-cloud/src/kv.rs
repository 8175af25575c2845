//! Redis connection pool and key-value store errors

use deadpool_redis::{Config as RedisConfig, Pool as RedisPool, Runtime};
use thiserror::Error;

/// Redis keys used by the service
pub mod keys {
    /// The single marketplace credential record
    pub const PRIMARY_TOKEN: &str = "ml:tokens:primary";
    /// Inbound webhook notifications, newest first
    pub const NOTIFICATIONS: &str = "ml:notifications";
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<deadpool_redis::PoolError> for StoreError {
    fn from(e: deadpool_redis::PoolError) -> Self {
        StoreError::Redis(e.to_string())
    }
}

impl From<deadpool_redis::redis::RedisError> for StoreError {
    fn from(e: deadpool_redis::redis::RedisError) -> Self {
        StoreError::Redis(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Build the Redis pool and check the server answers
pub async fn connect(url: &str) -> Result<RedisPool, StoreError> {
    let pool = RedisConfig::from_url(url)
        .create_pool(Some(Runtime::Tokio1))
        .map_err(|e| StoreError::Redis(e.to_string()))?;

    let mut conn = pool.get().await?;
    let _: String = deadpool_redis::redis::cmd("PING")
        .query_async(&mut *conn)
        .await?;

    Ok(pool)
}
