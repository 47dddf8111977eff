//! Simulated ultrasonic gauge

use crate::{DistanceSource, SensorResult};
use chrono::Utc;
use flood_core::synthetic_distance;

pub const GAUGE_MIN_CM: f64 = 20.0;
pub const GAUGE_MAX_CM: f64 = 200.0;

/// Gauge that reports a pseudo-random distance in a fixed range
pub struct SyntheticGauge {
    min: f64,
    max: f64,
    reads: i64,
}

impl SyntheticGauge {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max, reads: 0 }
    }

    fn next_distance(&mut self, now: i64) -> f64 {
        self.reads += 1;
        synthetic_distance(now.wrapping_add(self.reads), self.min, self.max)
    }
}

impl Default for SyntheticGauge {
    fn default() -> Self {
        Self::new(GAUGE_MIN_CM, GAUGE_MAX_CM)
    }
}

#[async_trait::async_trait]
impl DistanceSource for SyntheticGauge {
    fn name(&self) -> &str {
        "synthetic"
    }

    async fn read(&mut self) -> SensorResult<f64> {
        Ok(self.next_distance(Utc::now().timestamp()))
    }
}
