//! Virtual water-level sensor
//!
//! Plays the part of the station firmware: reads a distance from a
//! [`DistanceSource`], pushes it through an [`Uplink`], adopts the
//! interval the server answers with and collects pending notifications.

pub mod gauge;
pub mod uplink;

pub use gauge::*;
pub use uplink::*;

use chrono::{DateTime, Utc};
use flood_config::AppConfig;
use flood_core::StationPush;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Interval used until the server has answered once
pub const INITIAL_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server answered HTTP {0}")]
    HttpStatus(u16),

    #[error("Sensor read failed: {0}")]
    Read(String),
}

pub type SensorResult<T> = Result<T, SensorError>;

/// Part of the push response the sensor cares about
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushReply {
    pub next_interval: Option<u64>,
    #[serde(default)]
    pub history_count: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Notice {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Source of distance readings (cm)
#[async_trait::async_trait]
pub trait DistanceSource: Send {
    fn name(&self) -> &str;

    async fn read(&mut self) -> SensorResult<f64>;
}

/// Connection to the flood server
#[async_trait::async_trait]
pub trait Uplink: Send + Sync {
    async fn push(&self, push: &StationPush) -> SensorResult<PushReply>;

    async fn check_notify(&self, station: &str) -> SensorResult<Option<Notice>>;
}

#[derive(Debug, Clone)]
pub struct SensorSettings {
    pub station: String,
    pub river: Option<String>,
    pub min_interval: Duration,
}

impl SensorSettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            station: cfg.sensor_station(),
            river: cfg.sensor_river(),
            min_interval: cfg.sensor_min_interval(),
        }
    }
}

/// Interval to wait before the next read.
///
/// Answers below the floor are ignored and the current interval is kept.
pub fn adopt_interval(current: Duration, reply_secs: Option<u64>, floor: Duration) -> Duration {
    match reply_secs.map(Duration::from_secs) {
        Some(next) if next >= floor => next,
        Some(next) => {
            warn!(next = next.as_secs(), floor = floor.as_secs(), "ignoring interval below floor");
            current
        }
        None => current,
    }
}

pub struct Sensor<S, U> {
    settings: SensorSettings,
    source: S,
    uplink: U,
    interval: Duration,
    last_notice: Option<Notice>,
}

impl<S: DistanceSource, U: Uplink> Sensor<S, U> {
    pub fn new(settings: SensorSettings, source: S, uplink: U) -> Self {
        let interval = INITIAL_INTERVAL.max(settings.min_interval);
        Self {
            settings,
            source,
            uplink,
            interval,
            last_notice: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_notice(&self) -> Option<&Notice> {
        self.last_notice.as_ref()
    }

    /// One read/push/poll cycle. Returns how long to sleep.
    ///
    /// Failures are logged and the previous interval is kept, the way the
    /// firmware retries on its next cycle.
    pub async fn cycle(&mut self) -> Duration {
        match self.source.read().await {
            Ok(distance) => self.report(distance).await,
            Err(e) => warn!(error = %e, source = self.source.name(), "sensor read failed"),
        }

        match self.uplink.check_notify(&self.settings.station).await {
            Ok(Some(notice)) => {
                info!(message = %notice.message, at = %notice.timestamp, "notification received");
                self.last_notice = Some(notice);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "notification poll failed"),
        }

        self.interval
    }

    async fn report(&mut self, distance: f64) {
        let push = StationPush {
            distance: Some(distance),
            station: self.settings.station.clone(),
            river: self.settings.river.clone(),
            ..Default::default()
        };
        match self.uplink.push(&push).await {
            Ok(reply) => {
                self.interval =
                    adopt_interval(self.interval, reply.next_interval, self.settings.min_interval);
                info!(
                    distance,
                    history = reply.history_count,
                    interval = self.interval.as_secs(),
                    "pushed reading"
                );
            }
            Err(e) => warn!(error = %e, "push failed"),
        }
    }

    /// Cycle until the task is dropped
    pub async fn run(&mut self) {
        info!(station = %self.settings.station, source = self.source.name(), "sensor started");
        loop {
            let wait = self.cycle().await;
            tokio::time::sleep(wait).await;
        }
    }
}
