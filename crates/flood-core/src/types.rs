//! Core data types for station state, weather and history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Warning threshold applied to a station that has never been configured (cm)
pub const DEFAULT_WARNING_CM: f64 = 30.0;

/// Alarm threshold applied to a station that has never been configured (cm)
pub const DEFAULT_ALARM_CM: f64 = 15.0;

pub const DEFAULT_STATION: &str = "Antwerpen";
pub const DEFAULT_RIVER: &str = "Schelde";

/// Normalize a station name into its storage key
pub fn station_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Weather severity bucket controlling polling cadence.
///
/// Ordered by severity: `Sunny < Moderate < Stormy < Waterbomb`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Sunny,
    Moderate,
    Stormy,
    Waterbomb,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Sunny, Tier::Moderate, Tier::Stormy, Tier::Waterbomb];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Sunny => "sunny",
            Tier::Moderate => "moderate",
            Tier::Stormy => "stormy",
            Tier::Waterbomb => "waterbomb",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sunny" => Ok(Tier::Sunny),
            "moderate" => Ok(Tier::Moderate),
            "stormy" => Ok(Tier::Stormy),
            "waterbomb" => Ok(Tier::Waterbomb),
            other => Err(format!("unknown weather tier: {other}")),
        }
    }
}

/// Water-level status derived from distance and thresholds.
///
/// Lower distance means higher water, so `Alarm` is the most severe.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum StationStatus {
    #[default]
    Normal,
    Warning,
    Alarm,
}

impl StationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StationStatus::Normal => "NORMAL",
            StationStatus::Warning => "WARNING",
            StationStatus::Alarm => "ALARM",
        }
    }

    /// Classify a distance reading against the thresholds.
    ///
    /// A station that has never produced a valid reading is `Normal`.
    pub fn classify(distance: Option<f64>, warning: f64, alarm: f64) -> Self {
        match distance {
            Some(d) if d <= alarm => StationStatus::Alarm,
            Some(d) if d <= warning => StationStatus::Warning,
            _ => StationStatus::Normal,
        }
    }
}

/// Operator-configured polling cadence per weather tier, in minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalTable {
    pub sunny: u32,
    pub moderate: u32,
    pub stormy: u32,
    pub waterbomb: u32,
}

impl Default for IntervalTable {
    fn default() -> Self {
        Self {
            sunny: 15,
            moderate: 10,
            stormy: 5,
            waterbomb: 2,
        }
    }
}

impl IntervalTable {
    pub fn minutes(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Sunny => self.sunny,
            Tier::Moderate => self.moderate,
            Tier::Stormy => self.stormy,
            Tier::Waterbomb => self.waterbomb,
        }
    }
}

/// Weather numbers kept on the station record for the dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    pub temp: Option<f64>,
    pub rain_prob: Option<f64>,
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub condition: String,
}

/// Resolved weather for a station: a live lookup, a cached one, a
/// simulated tier or a fallback placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub tier: Tier,
    pub forecast: String,
    #[serde(default)]
    pub rain_expected: bool,
    pub temp: Option<f64>,
    pub rain_prob: Option<f64>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
    /// Set only on reports that came from the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<DateTime<Utc>>,
}

impl WeatherReport {
    /// Placeholder used when no live or cached weather is available
    pub fn fallback(forecast: impl Into<String>) -> Self {
        Self {
            tier: Tier::Sunny,
            forecast: forecast.into(),
            rain_expected: false,
            temp: None,
            rain_prob: None,
            wind_speed: None,
            fetched_at: None,
        }
    }

    /// Report for an operator-forced simulation tier
    pub fn simulated(tier: Tier) -> Self {
        let forecast = match tier {
            Tier::Sunny => "Simulation: Clear",
            Tier::Moderate => "Simulation: Moderate Rain",
            Tier::Stormy => "Simulation: Stormy / Heavy",
            Tier::Waterbomb => "Simulation: Waterbomb",
        };
        Self {
            rain_expected: tier != Tier::Sunny,
            tier,
            ..Self::fallback(forecast)
        }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        self.fetched_at.is_some_and(|at| now - at < ttl)
    }
}

/// Persisted per-station state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationRecord {
    /// Last valid distance reading (cm); `None` until one arrives
    #[serde(default)]
    pub distance: Option<f64>,
    /// Thresholds (cm); documents written before configuration may lack them
    #[serde(default)]
    pub warning: Option<f64>,
    #[serde(default)]
    pub alarm: Option<f64>,
    #[serde(default)]
    pub status: StationStatus,
    #[serde(default)]
    pub forecast: String,
    #[serde(default)]
    pub rain_expected: bool,
    #[serde(default)]
    pub weather_tier: Tier,
    #[serde(default)]
    pub weather: WeatherSnapshot,
    #[serde(default)]
    pub river: String,
    #[serde(default)]
    pub intervals: IntervalTable,
    /// Sticky simulator override; never stored as `Sunny`
    #[serde(default)]
    pub forced_weather_tier: Option<Tier>,
    #[serde(default)]
    pub last_seen: DateTime<Utc>,
    #[serde(default)]
    pub is_simulated: bool,
}

impl StationRecord {
    /// Warning and alarm thresholds, when both were ever configured
    pub fn thresholds(&self) -> Option<(f64, f64)> {
        Some((self.warning?, self.alarm?))
    }
}

/// One accepted distance reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub ts: DateTime<Utc>,
    /// Legacy documents may lack a value; it then reads as 0 and is purged
    #[serde(default)]
    pub val: f64,
}

impl HistoryEntry {
    pub fn new(ts: DateTime<Utc>, val: f64) -> Self {
        Self { ts, val }
    }

    pub fn is_valid(&self) -> bool {
        self.val > 0.0
    }
}

/// Single-slot message waiting for a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingNotification {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Body of a station push, from a sensor or from the dashboard.
///
/// Sensors send `distance`, `status`, `station` and `river`; the dashboard
/// additionally sends thresholds, intervals, `isUiUpdate` and a
/// simulation tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationPush {
    pub distance: Option<f64>,
    /// Device-computed status; ignored, the status is recomputed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default = "default_station")]
    pub station: String,
    pub river: Option<String>,
    pub warning: Option<f64>,
    pub alarm: Option<f64>,
    pub intervals: Option<IntervalTable>,
    #[serde(default)]
    pub is_ui_update: bool,
    pub sim_weather_tier: Option<Tier>,
}

fn default_station() -> String {
    DEFAULT_STATION.to_string()
}

/// How a push may influence persisted configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushContext {
    pub is_operator_push: bool,
    /// Only honoured on operator pushes
    pub simulation_tier: Option<Tier>,
}

impl From<&StationPush> for PushContext {
    fn from(push: &StationPush) -> Self {
        Self {
            is_operator_push: push.is_ui_update,
            simulation_tier: push.sim_weather_tier.filter(|_| push.is_ui_update),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_key_normalization() {
        assert_eq!(station_key("  Dendermonde "), "dendermonde");
        assert_eq!(station_key("GENT"), "gent");
    }

    #[test]
    fn test_tier_ordering_and_parse() {
        assert!(Tier::Sunny < Tier::Moderate);
        assert!(Tier::Stormy < Tier::Waterbomb);
        assert_eq!("Waterbomb".parse::<Tier>().unwrap(), Tier::Waterbomb);
        assert!("hail".parse::<Tier>().is_err());
        assert_eq!(Tier::Stormy.to_string(), "stormy");
    }

    #[test]
    fn test_status_thresholds() {
        assert_eq!(StationStatus::classify(Some(10.0), 30.0, 15.0), StationStatus::Alarm);
        assert_eq!(StationStatus::classify(Some(15.0), 30.0, 15.0), StationStatus::Alarm);
        assert_eq!(StationStatus::classify(Some(15.1), 30.0, 15.0), StationStatus::Warning);
        assert_eq!(StationStatus::classify(Some(30.0), 30.0, 15.0), StationStatus::Warning);
        assert_eq!(StationStatus::classify(Some(30.5), 30.0, 15.0), StationStatus::Normal);
        assert_eq!(StationStatus::classify(None, 30.0, 15.0), StationStatus::Normal);
    }

    #[test]
    fn test_status_monotonic_over_range() {
        let (warning, alarm) = (42.0, 17.5);
        for tenth in 1..1000 {
            let d = f64::from(tenth) / 10.0;
            let status = StationStatus::classify(Some(d), warning, alarm);
            let expected = if d <= alarm {
                StationStatus::Alarm
            } else if d <= warning {
                StationStatus::Warning
            } else {
                StationStatus::Normal
            };
            assert_eq!(status, expected, "distance {d}");
        }
    }

    #[test]
    fn test_interval_table_wire_format() {
        insta::assert_json_snapshot!(IntervalTable::default(), @r###"
        {
          "sunny": 15,
          "moderate": 10,
          "stormy": 5,
          "waterbomb": 2
        }
        "###);
    }

    #[test]
    fn test_push_context_ignores_sim_tier_from_sensor() {
        let push: StationPush =
            serde_json::from_str(r#"{"distance":40.0,"simWeatherTier":"stormy"}"#).unwrap();
        assert_eq!(push.station, "Antwerpen");
        let ctx = PushContext::from(&push);
        assert!(!ctx.is_operator_push);
        assert_eq!(ctx.simulation_tier, None);

        let push: StationPush = serde_json::from_str(
            r#"{"station":"Gent","isUiUpdate":true,"simWeatherTier":"stormy"}"#,
        )
        .unwrap();
        assert_eq!(PushContext::from(&push).simulation_tier, Some(Tier::Stormy));
    }

    #[test]
    fn test_record_reads_legacy_document() {
        // Seeded records carry no intervals or weather block
        let json = r#"{
            "distance": 80.0,
            "warning": 30.0,
            "alarm": 15.0,
            "status": "NORMAL",
            "river": "Schelde",
            "lastSeen": "2026-01-01T00:00:00Z",
            "isSimulated": true
        }"#;
        let record: StationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.intervals, IntervalTable::default());
        assert_eq!(record.forced_weather_tier, None);
        assert_eq!(record.thresholds(), Some((30.0, 15.0)));
        assert!(record.is_simulated);
    }

    #[test]
    fn test_record_reads_unconfigured_document() {
        let json = r#"{"distance": 40.0, "river": "Leie", "lastSeen": "2026-01-01T00:00:00Z"}"#;
        let record: StationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.warning, None);
        assert_eq!(record.thresholds(), None);
        assert_eq!(record.river, "Leie");

        let bare: StationRecord = serde_json::from_str(r#"{"warning": 30.0}"#).unwrap();
        assert_eq!(bare.thresholds(), None);
        assert_eq!(bare.river, "");
    }

    #[test]
    fn test_simulated_report() {
        let report = WeatherReport::simulated(Tier::Waterbomb);
        assert_eq!(report.tier, Tier::Waterbomb);
        assert!(report.rain_expected);
        assert_eq!(report.forecast, "Simulation: Waterbomb");
        assert!(!WeatherReport::simulated(Tier::Sunny).rain_expected);
    }
}
