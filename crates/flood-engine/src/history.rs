//! Per-station rolling history

use crate::{required_key, EngineResult};
use chrono::{DateTime, Utc};
use flood_core::{get_json, keys, prune, set_json, HistoryEntry, HistorySummary, KvStore};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct HistoryLedger {
    store: Arc<dyn KvStore>,
}

impl HistoryLedger {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Entries oldest first; empty for an unknown station
    pub async fn get(&self, station: &str) -> EngineResult<Vec<HistoryEntry>> {
        let key = required_key(station)?;
        self.load(&key).await
    }

    pub async fn summary(&self, station: &str) -> EngineResult<HistorySummary> {
        let key = required_key(station)?;
        let entries = self.load(&key).await?;
        Ok(HistorySummary::new(key, &entries))
    }

    pub async fn append(
        &self,
        station: &str,
        entry: HistoryEntry,
    ) -> EngineResult<Vec<HistoryEntry>> {
        self.append_at(station, entry, Utc::now()).await
    }

    /// Append `entry` if valid, then prune by age and count and persist.
    pub async fn append_at(
        &self,
        station: &str,
        entry: HistoryEntry,
        now: DateTime<Utc>,
    ) -> EngineResult<Vec<HistoryEntry>> {
        let key = required_key(station)?;
        self.record(&key, Some(entry), now).await
    }

    /// Write path shared with the push: `None` only cleans up
    pub(crate) async fn record(
        &self,
        key: &str,
        entry: Option<HistoryEntry>,
        now: DateTime<Utc>,
    ) -> EngineResult<Vec<HistoryEntry>> {
        if let Some(e) = entry.filter(|e| !e.is_valid()) {
            warn!(station = %key, value = e.val, "skipping invalid distance reading");
        }
        let existing = self.load(key).await?;
        let entries = prune(existing, entry, now);
        set_json(&*self.store, &keys::history(key), &entries).await?;
        debug!(station = %key, count = entries.len(), "history written");
        Ok(entries)
    }

    pub(crate) async fn load(&self, key: &str) -> EngineResult<Vec<HistoryEntry>> {
        Ok(get_json(&*self.store, &keys::history(key))
            .await?
            .unwrap_or_default())
    }

    pub(crate) async fn replace(&self, key: &str, entries: &[HistoryEntry]) -> EngineResult<()> {
        set_json(&*self.store, &keys::history(key), entries).await?;
        Ok(())
    }

    pub(crate) async fn remove(&self, key: &str) -> EngineResult<()> {
        self.store.delete(&keys::history(key)).await?;
        Ok(())
    }
}
