//! Station push path: load, merge, record history, persist

use crate::{required_key, EngineResult, HistoryLedger};
use chrono::{DateTime, Utc};
use flood_core::{
    classify, get_json, keys, reconcile, set_json, ConfigBranch, HistoryEntry, KvStore,
    PushContext, StationPush, StationRecord, WeatherReport,
};
use flood_weather::WeatherCache;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Result of one accepted push
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushOutcome {
    pub success: bool,
    /// Station name as sent by the caller
    pub updated: String,
    pub data: StationRecord,
    pub history_count: usize,
    /// Seconds until the sensor should push again
    pub next_interval: u32,
}

/// Owner of the persisted station records.
///
/// Nothing else writes `station_*` documents; the dashboard proposes
/// changes through operator pushes.
#[derive(Clone)]
pub struct StationConfigStore {
    pub(crate) store: Arc<dyn KvStore>,
    weather: Arc<WeatherCache>,
    pub(crate) ledger: HistoryLedger,
}

impl StationConfigStore {
    pub fn new(store: Arc<dyn KvStore>, weather: Arc<WeatherCache>) -> Self {
        let ledger = HistoryLedger::new(Arc::clone(&store));
        Self {
            store,
            weather,
            ledger,
        }
    }

    pub fn ledger(&self) -> &HistoryLedger {
        &self.ledger
    }

    pub async fn get(&self, station: &str) -> EngineResult<Option<StationRecord>> {
        let key = required_key(station)?;
        self.load(&key).await
    }

    pub async fn apply_push(&self, push: StationPush) -> EngineResult<PushOutcome> {
        self.apply_push_at(push, Utc::now()).await
    }

    /// Merge one push into the station's record.
    ///
    /// The merge is computed in memory; the store sees the history write
    /// and then a single record write.
    #[instrument(
        skip(self, push, now),
        fields(station = %push.station, operator = push.is_ui_update)
    )]
    pub async fn apply_push_at(
        &self,
        push: StationPush,
        now: DateTime<Utc>,
    ) -> EngineResult<PushOutcome> {
        let key = required_key(&push.station)?;
        debug!(%key, "normalized station key");

        let existing = self.load(&key).await?;
        self.drop_legacy_key(&push.station, &key).await?;

        let weather = self.resolve_weather(&key, &PushContext::from(&push), now).await;
        let merged = reconcile(existing.as_ref(), &push, &weather, now);

        match merged.branch {
            ConfigBranch::OperatorUpdate => info!(
                warning = ?merged.record.warning,
                alarm = ?merged.record.alarm,
                "operator updated configuration"
            ),
            ConfigBranch::LeaderEnforced => debug!(
                warning = ?merged.record.warning,
                alarm = ?merged.record.alarm,
                "enforced stored configuration"
            ),
            ConfigBranch::NewStation => info!(
                warning = ?merged.record.warning,
                alarm = ?merged.record.alarm,
                "initializing new station"
            ),
        }

        let entry = push.distance.map(|d| HistoryEntry::new(now, d));
        if entry.is_none() {
            warn!("push carried no distance");
        }
        let history = self.ledger.record(&key, entry, now).await?;

        set_json(&*self.store, &keys::station(&key), &merged.record).await?;
        info!(
            status = ?merged.record.status,
            tier = %merged.record.weather_tier,
            next_interval = merged.next_interval,
            "station updated"
        );

        Ok(PushOutcome {
            success: true,
            updated: push.station,
            data: merged.record,
            history_count: history.len(),
            next_interval: merged.next_interval,
        })
    }

    /// Simulated weather for an operator simulation tier, cached/live otherwise
    async fn resolve_weather(
        &self,
        key: &str,
        ctx: &PushContext,
        now: DateTime<Utc>,
    ) -> WeatherReport {
        match ctx.simulation_tier {
            Some(tier) => {
                let tier = classify("", None, Some(tier));
                info!(%tier, "using simulator weather override");
                WeatherReport::simulated(tier)
            }
            None => self.weather.get_at(key, now).await,
        }
    }

    /// Records written under a non-normalized name are removed
    async fn drop_legacy_key(&self, raw: &str, key: &str) -> EngineResult<()> {
        if raw == key {
            return Ok(());
        }
        let legacy = keys::station(raw);
        if self.store.get(&legacy).await?.is_some() {
            self.store.delete(&legacy).await?;
            info!(legacy = %raw, "removed legacy station key");
        }
        Ok(())
    }

    pub(crate) async fn load(&self, key: &str) -> EngineResult<Option<StationRecord>> {
        Ok(get_json(&*self.store, &keys::station(key)).await?)
    }
}
