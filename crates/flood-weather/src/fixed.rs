//! Provider answering from a fixed observation, for offline runs and tests

use crate::{Coordinates, Observation, WeatherError, WeatherProvider, WeatherResult};
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct FixedProvider {
    observation: Option<Observation>,
    calls: AtomicUsize,
}

impl FixedProvider {
    pub fn new(observation: Observation) -> Self {
        Self {
            observation: Some(observation),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always reports clear skies
    pub fn clear() -> Self {
        Self::new(Observation {
            condition: "Clear".to_string(),
            description: "clear sky".to_string(),
            temp: Some(15.0),
            rain_prob: Some(0.0),
            wind_speed: Some(3.0),
        })
    }

    /// Every lookup fails
    pub fn unavailable() -> Self {
        Self {
            observation: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl WeatherProvider for FixedProvider {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn fetch(&self, _coords: &Coordinates) -> WeatherResult<Observation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.observation
            .clone()
            .ok_or_else(|| WeatherError::Request("fixed provider has no data".into()))
    }
}
