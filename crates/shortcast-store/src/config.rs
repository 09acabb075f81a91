//! Store configuration.

use std::sync::Arc;

use tracing::info;

use crate::error::StoreResult;
use crate::keys::KeySpace;
use crate::kv::{KvStore, MemoryKvStore};
use crate::redis_kv::RedisKvStore;

/// Store configuration.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Redis URL; the in-memory backend is used when absent
    pub redis_url: Option<String>,
    /// Optional prefix for every key
    pub namespace: Option<String>,
}

impl StoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL").ok().filter(|s| !s.is_empty()),
            namespace: std::env::var("STORE_NAMESPACE").ok().filter(|s| !s.is_empty()),
        }
    }

    pub fn key_space(&self) -> KeySpace {
        KeySpace::new(self.namespace.clone())
    }

    /// Open the configured backend.
    pub async fn connect(&self) -> StoreResult<Arc<dyn KvStore>> {
        match &self.redis_url {
            Some(url) => {
                let store = RedisKvStore::new(url)?;
                store.ping().await?;
                info!("Using Redis key-value store");
                Ok(Arc::new(store))
            }
            None => {
                info!("REDIS_URL not set, using in-memory key-value store");
                Ok(Arc::new(MemoryKvStore::new()))
            }
        }
    }
}
