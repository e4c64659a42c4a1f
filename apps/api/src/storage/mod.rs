//! Key-value persistence substrate.
//!
//! The profile store only needs `get(key)` and `set(key, value)`. Three backends
//! implement that contract: PostgreSQL, Redis and an in-process map.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

pub mod postgres;
pub mod redis_store;

pub use self::postgres::PgStore;
pub use self::redis_store::RedisStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Process-local store. Used by tests and by `STORE_BACKEND=memory`.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
