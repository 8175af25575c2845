//! Durable holder of the single credential record

use async_trait::async_trait;
use deadpool_redis::{Pool as RedisPool, redis::AsyncCommands};
use tokio::sync::RwLock;

use super::CredentialRecord;
use crate::kv::{StoreError, keys};

/// Plain get/set of the one live credential record
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self) -> Result<Option<CredentialRecord>, StoreError>;
    async fn set(&self, record: &CredentialRecord) -> Result<(), StoreError>;
}

/// Credential record stored as JSON under `ml:tokens:primary`
pub struct RedisTokenStore {
    pool: RedisPool,
}

impl RedisTokenStore {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for RedisTokenStore {
    async fn get(&self) -> Result<Option<CredentialRecord>, StoreError> {
        let mut conn = self.pool.get().await?;
        let raw: Option<String> = conn.get(keys::PRIMARY_TOKEN).await?;
        raw.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(Into::into)
    }

    async fn set(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string(record)?;
        let mut conn = self.pool.get().await?;
        conn.set::<_, _, ()>(keys::PRIMARY_TOKEN, json).await?;
        Ok(())
    }
}

/// Process-local store, used in tests and local runs without Redis
#[derive(Default)]
pub struct InMemoryTokenStore {
    record: RwLock<Option<CredentialRecord>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: CredentialRecord) -> Self {
        Self {
            record: RwLock::new(Some(record)),
        }
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn get(&self) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self.record.read().await.clone())
    }

    async fn set(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        *self.record.write().await = Some(record.clone());
        Ok(())
    }
}
