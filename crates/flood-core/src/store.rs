//! Key-value document store seam
//!
//! All station state lives behind [`KvStore`]. The store offers plain
//! get/set/delete with no compare-and-swap, so concurrent writers to the
//! same key are last-write-wins. Only `take` is atomic.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Stored document is not valid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait::async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>>;

    async fn set(&self, key: &str, value: Value) -> StoreResult<()>;

    /// Deleting a missing key is not an error
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Remove a key and return what it held, as one atomic step.
    ///
    /// Of several concurrent callers at most one sees the value.
    async fn take(&self, key: &str) -> StoreResult<Option<Value>>;

    /// Keys starting with `prefix`, sorted
    async fn list(&self, prefix: &str) -> StoreResult<Vec<String>>;
}

/// Read and decode a JSON document
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn KvStore,
    key: &str,
) -> StoreResult<Option<T>> {
    match store.get(key).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Encode and write a JSON document
pub async fn set_json<T: Serialize + ?Sized>(
    store: &dyn KvStore,
    key: &str,
    value: &T,
) -> StoreResult<()> {
    let value = serde_json::to_value(value)?;
    store.set(key, value).await
}

/// Document key layout
pub mod keys {
    pub const STATION_PREFIX: &str = "station_";
    pub const HISTORY_PREFIX: &str = "history_";
    pub const WEATHER_PREFIX: &str = "weather_";
    pub const NOTIFY_PREFIX: &str = "pending_notify_";

    pub fn station(key: &str) -> String {
        format!("{STATION_PREFIX}{key}")
    }

    pub fn history(key: &str) -> String {
        format!("{HISTORY_PREFIX}{key}")
    }

    pub fn weather(key: &str) -> String {
        format!("{WEATHER_PREFIX}{key}")
    }

    pub fn notify(key: &str) -> String {
        format!("{NOTIFY_PREFIX}{key}")
    }
}
