//! Time-boxed weather cache in front of a provider

use crate::{coordinates, WeatherError, WeatherProvider, WeatherResult};
use chrono::{DateTime, Utc};
use flood_core::{get_json, keys, set_json, KvStore, WeatherReport};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Cached reports younger than this are served without a lookup
pub const DEFAULT_WEATHER_TTL: Duration = Duration::from_secs(30 * 60);

/// Upper bound on a live lookup so sensor pushes are never held up long
pub const DEFAULT_WEATHER_TIMEOUT: Duration = Duration::from_secs(3);

pub struct WeatherCache {
    store: Arc<dyn KvStore>,
    provider: Arc<dyn WeatherProvider>,
    ttl: Duration,
    timeout: Duration,
}

impl WeatherCache {
    pub fn new(store: Arc<dyn KvStore>, provider: Arc<dyn WeatherProvider>) -> Self {
        Self {
            store,
            provider,
            ttl: DEFAULT_WEATHER_TTL,
            timeout: DEFAULT_WEATHER_TIMEOUT,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn get(&self, station_key: &str) -> WeatherReport {
        self.get_at(station_key, Utc::now()).await
    }

    /// Weather for a station as of `now`. Never fails: a failed lookup
    /// returns the stale cached report, or a placeholder if there is none.
    #[instrument(skip(self, now), fields(provider = self.provider.name()))]
    pub async fn get_at(&self, station_key: &str, now: DateTime<Utc>) -> WeatherReport {
        let cache_key = keys::weather(station_key);
        let cached: Option<WeatherReport> = match get_json(&*self.store, &cache_key).await {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "weather cache unreadable, ignoring");
                None
            }
        };

        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::zero());
        if let Some(report) = cached.as_ref().filter(|r| r.is_fresh(now, ttl)) {
            debug!("serving cached weather");
            return report.clone();
        }

        match self.lookup(station_key, now).await {
            Ok(report) => {
                if let Err(e) = set_json(&*self.store, &cache_key, &report).await {
                    warn!(error = %e, "failed to write weather cache");
                }
                info!(tier = %report.tier, forecast = %report.forecast, "fetched weather");
                report
            }
            Err(e) => {
                warn!(
                    reason = %e,
                    fallback = if cached.is_some() { "stale cache" } else { "defaults" },
                    "weather lookup skipped"
                );
                cached.unwrap_or_else(|| WeatherReport::fallback(e.fallback_text()))
            }
        }
    }

    async fn lookup(&self, station_key: &str, now: DateTime<Utc>) -> WeatherResult<WeatherReport> {
        let coords = coordinates(station_key)
            .ok_or_else(|| WeatherError::UnknownStation(station_key.to_string()))?;
        let observation = tokio::time::timeout(self.timeout, self.provider.fetch(&coords))
            .await
            .map_err(|_| WeatherError::Timeout(self.timeout))??;
        Ok(observation.into_report(now))
    }
}
