//! Generic key-value adapter.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{StoreError, StoreResult};

/// Durable string-to-string mapping.
///
/// Implementations hold no business logic. `compare_and_swap` is the
/// conditional-write primitive used for job claims.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    async fn put(&self, key: &str, value: &str) -> StoreResult<()>;

    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// All keys starting with `prefix`. Order is backend-defined.
    async fn list_keys(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// Write `value` only if the current value equals `expected`
    /// (`None` meaning absent). Returns whether the write happened.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> StoreResult<bool>;

    /// Add one to a decimal counter, creating it at 1.
    ///
    /// The default is a plain read-then-write.
    async fn increment(&self, key: &str) -> StoreResult<u64> {
        let current = parse_count(key, self.get(key).await?)?;
        let next = current + 1;
        self.put(key, &next.to_string()).await?;
        Ok(next)
    }
}

/// Parse a stored counter; absent means zero.
pub(crate) fn parse_count(key: &str, raw: Option<String>) -> StoreResult<u64> {
    match raw {
        None => Ok(0),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| StoreError::corrupt(key, format!("not a count: {:?}", raw))),
    }
}

/// In-process store, used for tests and single-node deployments.
#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> StoreResult<bool> {
        let mut entries = self.entries.write().await;
        if entries.get(key).map(String::as_str) != expected {
            return Ok(false);
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(true)
    }

    async fn increment(&self, key: &str) -> StoreResult<u64> {
        let mut entries = self.entries.write().await;
        let next = parse_count(key, entries.get(key).cloned())? + 1;
        entries.insert(key.to_string(), next.to_string());
        Ok(next)
    }
}
