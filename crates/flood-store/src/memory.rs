//! In-process store

use flood_core::{KvStore, StoreResult};
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Store kept in a map; contents die with the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.docs.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> StoreResult<()> {
        self.docs.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.docs.write().await.remove(key);
        Ok(())
    }

    async fn take(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.docs.write().await.remove(key))
    }

    async fn list(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let docs = self.docs.read().await;
        Ok(docs
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}
