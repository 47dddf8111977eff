//! Administrative station operations: delete, migrate and seed

use crate::{required_key, EngineResult, HistoryLedger};
use chrono::{DateTime, Duration, Utc};
use flood_core::{
    get_json, keys, set_json, synthetic_distance, HistoryEntry, IntervalTable, KvStore,
    StationRecord, StationStatus, WeatherSnapshot, DEFAULT_ALARM_CM, DEFAULT_RIVER,
    DEFAULT_WARNING_CM,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// Station seeded when the request names none
pub const DEFAULT_SEED_STATION: &str = "Doornik";

/// Seeded points: one every [`SEED_STEP_MINUTES`] over the last 24 hours, both ends included
pub const SEED_POINTS: i64 = 97;
pub const SEED_STEP_MINUTES: i64 = 15;
pub const SEED_MIN_CM: f64 = 50.0;
pub const SEED_MAX_CM: f64 = 120.0;

pub const SEED_FORECAST: &str = "Simulated Data (Seeded)";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrateOutcome {
    pub from: String,
    pub to: String,
    pub moved_record: bool,
    pub moved_history: usize,
    pub river_updated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedOutcome {
    pub station: String,
    pub points: usize,
    pub latest: StationRecord,
}

#[derive(Clone)]
pub struct Admin {
    store: Arc<dyn KvStore>,
    ledger: HistoryLedger,
}

impl Admin {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        let ledger = HistoryLedger::new(Arc::clone(&store));
        Self { store, ledger }
    }

    /// Remove a station's record and history. Returns whether a record existed.
    #[instrument(skip(self))]
    pub async fn delete_station(&self, station: &str) -> EngineResult<bool> {
        let key = required_key(station)?;
        let existed = self.load(&key).await?.is_some();
        self.store.delete(&keys::station(&key)).await?;
        self.ledger.remove(&key).await?;
        info!(%key, existed, "station deleted");
        Ok(existed)
    }

    /// Move record and history from `old` to `new`, optionally replacing the river.
    ///
    /// Whatever is stored under `new` is overwritten. Migrating a station onto
    /// itself only applies the river.
    #[instrument(skip(self))]
    pub async fn migrate_station(
        &self,
        old: &str,
        new: &str,
        river: Option<&str>,
    ) -> EngineResult<MigrateOutcome> {
        let from = required_key(old)?;
        let to = required_key(new)?;
        let river = river.map(str::trim).filter(|r| !r.is_empty());

        let mut moved_record = false;
        if let Some(mut record) = self.load(&from).await? {
            if let Some(river) = river {
                record.river = river.to_string();
            }
            set_json(&*self.store, &keys::station(&to), &record).await?;
            if from != to {
                self.store.delete(&keys::station(&from)).await?;
            }
            moved_record = true;
        }

        let mut moved_history = 0;
        if from != to {
            let history = self.ledger.load(&from).await?;
            if !history.is_empty() {
                self.ledger.replace(&to, &history).await?;
                moved_history = history.len();
            }
            self.ledger.remove(&from).await?;
        }

        info!(%from, %to, moved_record, moved_history, "station migrated");
        Ok(MigrateOutcome {
            from,
            to,
            moved_record,
            moved_history,
            river_updated: river.is_some(),
        })
    }

    pub async fn seed_history(&self, station: Option<&str>) -> EngineResult<SeedOutcome> {
        self.seed_history_at(station, Utc::now()).await
    }

    /// Replace a station's history with a synthetic day of readings
    #[instrument(skip(self, now))]
    pub async fn seed_history_at(
        &self,
        station: Option<&str>,
        now: DateTime<Utc>,
    ) -> EngineResult<SeedOutcome> {
        let key = required_key(station.unwrap_or(DEFAULT_SEED_STATION))?;

        let history: Vec<HistoryEntry> = (0..SEED_POINTS)
            .rev()
            .map(|i| {
                let ts = now - Duration::minutes(i * SEED_STEP_MINUTES);
                let val = synthetic_distance(ts.timestamp(), SEED_MIN_CM, SEED_MAX_CM);
                HistoryEntry::new(ts, val)
            })
            .collect();
        self.ledger.replace(&key, &history).await?;

        let existing = self.load(&key).await?;
        let latest = history.last().map(|e| e.val);
        let (warning, alarm) = existing
            .as_ref()
            .and_then(StationRecord::thresholds)
            .unwrap_or((DEFAULT_WARNING_CM, DEFAULT_ALARM_CM));
        let intervals = existing
            .as_ref()
            .map(|p| p.intervals)
            .unwrap_or_else(IntervalTable::default);
        let river = existing
            .as_ref()
            .map(|p| p.river.clone())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_RIVER.to_string());
        let record = StationRecord {
            distance: latest,
            warning: Some(warning),
            alarm: Some(alarm),
            status: StationStatus::classify(latest, warning, alarm),
            forecast: SEED_FORECAST.to_string(),
            rain_expected: false,
            weather_tier: existing.as_ref().map(|p| p.weather_tier).unwrap_or_default(),
            weather: existing
                .as_ref()
                .map(|p| p.weather.clone())
                .unwrap_or_else(WeatherSnapshot::default),
            river,
            intervals,
            forced_weather_tier: existing.as_ref().and_then(|p| p.forced_weather_tier),
            last_seen: now,
            is_simulated: true,
        };
        set_json(&*self.store, &keys::station(&key), &record).await?;

        info!(%key, points = history.len(), "history seeded");
        Ok(SeedOutcome {
            station: key,
            points: history.len(),
            latest: record,
        })
    }

    async fn load(&self, key: &str) -> EngineResult<Option<StationRecord>> {
        Ok(get_json(&*self.store, &keys::station(key)).await?)
    }
}
