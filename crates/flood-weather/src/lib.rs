//! Weather lookup for station cadence
//!
//! A [`WeatherProvider`] answers "what is the weather at these
//! coordinates"; the [`WeatherCache`] wraps it with a time-boxed store
//! cache, a hard timeout and stale-on-error fallback so callers always
//! get a report.

pub mod cache;
pub mod fixed;
pub mod owm;
pub mod registry;

pub use cache::*;
pub use fixed::*;
pub use owm::*;
pub use registry::*;

use chrono::{DateTime, Utc};
use flood_core::{classify, is_rain_bearing, WeatherReport};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Weather provider API key not configured")]
    MissingApiKey,

    #[error("No coordinates known for station {0}")]
    UnknownStation(String),

    #[error("Weather provider returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Weather provider returned no forecast entries")]
    NoData,

    #[error("Weather request failed: {0}")]
    Request(String),

    #[error("Weather request timed out after {0:?}")]
    Timeout(Duration),
}

impl WeatherError {
    /// Forecast text shown when this error leaves no weather at all
    pub fn fallback_text(&self) -> String {
        match self {
            WeatherError::MissingApiKey => "No API key".to_string(),
            WeatherError::UnknownStation(_) => "Unknown".to_string(),
            WeatherError::HttpStatus(code) => format!("OWM {code}"),
            WeatherError::NoData => "No data".to_string(),
            WeatherError::Request(_) | WeatherError::Timeout(_) => "Unavailable".to_string(),
        }
    }
}

pub type WeatherResult<T> = Result<T, WeatherError>;

/// Near-term forecast as reported by a provider
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Coarse condition, e.g. "Rain" or "Thunderstorm"
    pub condition: String,
    pub description: String,
    pub temp: Option<f64>,
    /// Percent
    pub rain_prob: Option<f64>,
    pub wind_speed: Option<f64>,
}

impl Observation {
    pub fn into_report(self, fetched_at: DateTime<Utc>) -> WeatherReport {
        WeatherReport {
            tier: classify(&self.condition, self.rain_prob, None),
            rain_expected: is_rain_bearing(&self.condition),
            forecast: self.description,
            temp: self.temp,
            rain_prob: self.rain_prob,
            wind_speed: self.wind_speed,
            fetched_at: Some(fetched_at),
        }
    }
}

#[async_trait::async_trait]
pub trait WeatherProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, coords: &Coordinates) -> WeatherResult<Observation>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use flood_core::Tier;

    #[test]
    fn test_observation_into_report() {
        let obs = Observation {
            condition: "Rain".into(),
            description: "heavy intensity rain".into(),
            temp: Some(9.0),
            rain_prob: Some(90.0),
            wind_speed: Some(7.0),
        };
        let report = obs.into_report(Utc::now());
        assert_eq!(report.tier, Tier::Stormy);
        assert!(report.rain_expected);
        assert_eq!(report.forecast, "heavy intensity rain");
        assert!(report.fetched_at.is_some());
    }

    #[test]
    fn test_fallback_texts() {
        assert_eq!(WeatherError::MissingApiKey.fallback_text(), "No API key");
        assert_eq!(WeatherError::HttpStatus(429).fallback_text(), "OWM 429");
        assert_eq!(
            WeatherError::Timeout(Duration::from_secs(3)).fallback_text(),
            "Unavailable"
        );
    }
}
