//! Dashboard view over all stations

use crate::EngineResult;
use chrono::{DateTime, Utc};
use flood_core::{
    keys, IntervalTable, KvStore, StationRecord, StationStatus, WeatherSnapshot,
    DEFAULT_ALARM_CM, DEFAULT_WARNING_CM,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Synthetic entry summarizing every station
pub const NATIONAL_KEY: &str = "Belgium";

pub const NATIONAL_RIVER: &str = "All rivers";

pub type StationMap = BTreeMap<String, StationRecord>;

#[derive(Clone)]
pub struct Overview {
    store: Arc<dyn KvStore>,
}

impl Overview {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Every stored station keyed by normalized name, plus [`NATIONAL_KEY`]
    pub async fn all(&self) -> EngineResult<StationMap> {
        self.all_at(Utc::now()).await
    }

    pub async fn all_at(&self, now: DateTime<Utc>) -> EngineResult<StationMap> {
        let mut stations = self.stations().await?;
        let national = aggregate(stations.values(), now);
        stations.insert(NATIONAL_KEY.to_string(), national);
        Ok(stations)
    }

    /// Stored station records only
    pub async fn stations(&self) -> EngineResult<StationMap> {
        let mut stations = StationMap::new();
        for doc_key in self.store.list(keys::STATION_PREFIX).await? {
            let Some(value) = self.store.get(&doc_key).await? else {
                continue;
            };
            let name = doc_key[keys::STATION_PREFIX.len()..].to_string();
            match serde_json::from_value::<StationRecord>(value) {
                Ok(record) => {
                    stations.insert(name, record);
                }
                Err(e) => warn!(key = %doc_key, error = %e, "skipping unreadable station record"),
            }
        }
        debug!(count = stations.len(), "loaded stations");
        Ok(stations)
    }
}

/// Combine station records into the national entry.
///
/// Worst status and tier win, the lowest distance is shown. Thresholds
/// are the defaults since stations disagree.
pub fn aggregate<'a>(
    records: impl IntoIterator<Item = &'a StationRecord>,
    now: DateTime<Utc>,
) -> StationRecord {
    let mut national = StationRecord {
        distance: None,
        warning: Some(DEFAULT_WARNING_CM),
        alarm: Some(DEFAULT_ALARM_CM),
        status: StationStatus::Normal,
        forecast: String::new(),
        rain_expected: false,
        weather_tier: Default::default(),
        weather: WeatherSnapshot::default(),
        river: NATIONAL_RIVER.to_string(),
        intervals: IntervalTable::default(),
        forced_weather_tier: None,
        last_seen: now,
        is_simulated: true,
    };

    let mut latest: Option<DateTime<Utc>> = None;
    let mut count = 0usize;
    for record in records {
        count += 1;
        national.status = national.status.max(record.status);
        national.rain_expected |= record.rain_expected;
        if record.weather_tier >= national.weather_tier {
            national.weather_tier = record.weather_tier;
            national.forecast = record.forecast.clone();
        }
        national.forced_weather_tier = national.forced_weather_tier.max(record.forced_weather_tier);
        national.distance = match (national.distance, record.distance) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        latest = latest.max(Some(record.last_seen));
    }

    if let Some(ts) = latest {
        national.last_seen = ts;
    }
    national.weather.condition = format!("{count} stations");
    national
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use flood_core::{set_json, Tier};
    use flood_store::MemoryStore;
    use serde_json::json;

    fn record(
        distance: f64,
        status: StationStatus,
        tier: Tier,
        seen: DateTime<Utc>,
    ) -> StationRecord {
        StationRecord {
            distance: Some(distance),
            warning: Some(30.0),
            alarm: Some(15.0),
            status,
            forecast: tier.to_string(),
            rain_expected: tier != Tier::Sunny,
            weather_tier: tier,
            weather: WeatherSnapshot::default(),
            river: "Schelde".into(),
            intervals: IntervalTable::default(),
            forced_weather_tier: None,
            last_seen: seen,
            is_simulated: false,
        }
    }

    #[test]
    fn test_aggregate_takes_worst() {
        let now = Utc::now();
        let records = [
            record(80.0, StationStatus::Normal, Tier::Moderate, now - Duration::minutes(5)),
            record(25.0, StationStatus::Warning, Tier::Sunny, now - Duration::minutes(1)),
            record(60.0, StationStatus::Normal, Tier::Stormy, now - Duration::minutes(9)),
        ];
        let national = aggregate(records.iter(), now);

        assert_eq!(national.status, StationStatus::Warning);
        assert_eq!(national.weather_tier, Tier::Stormy);
        assert_eq!(national.forecast, "stormy");
        assert_eq!(national.distance, Some(25.0));
        assert_eq!(national.last_seen, now - Duration::minutes(1));
        assert_eq!(national.river, NATIONAL_RIVER);
        assert!(national.is_simulated);
    }

    #[test]
    fn test_aggregate_of_nothing() {
        let now = Utc::now();
        let national = aggregate(std::iter::empty(), now);
        assert_eq!(national.status, StationStatus::Normal);
        assert_eq!(national.distance, None);
        assert_eq!(national.last_seen, now);
    }

    #[tokio::test]
    async fn test_all_lists_stations_and_national_entry() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        set_json(
            &*store,
            "station_gent",
            &record(12.0, StationStatus::Alarm, Tier::Sunny, now),
        )
        .await
        .unwrap();
        set_json(
            &*store,
            "station_doornik",
            &record(90.0, StationStatus::Normal, Tier::Waterbomb, now),
        )
        .await
        .unwrap();
        store.set("station_broken", json!("nope")).await.unwrap();
        store.set("history_gent", json!([])).await.unwrap();

        let all = Overview::new(store).all_at(now).await.unwrap();
        let names: Vec<_> = all.keys().cloned().collect();
        assert_eq!(names, vec!["Belgium", "doornik", "gent"]);
        assert_eq!(all[NATIONAL_KEY].status, StationStatus::Alarm);
        assert_eq!(all[NATIONAL_KEY].weather_tier, Tier::Waterbomb);
    }
}
