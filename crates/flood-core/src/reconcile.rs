//! Pure merge of a station push into persisted station state
//!
//! The store round-trip lives in the engine; everything that decides what
//! the new record looks like lives here so it can be tested without I/O.

use crate::policy::next_interval_secs;
use crate::types::{
    PushContext, StationPush, StationRecord, StationStatus, Tier, WeatherReport, WeatherSnapshot,
    DEFAULT_ALARM_CM, DEFAULT_RIVER, DEFAULT_WARNING_CM,
};
use chrono::{DateTime, Utc};

/// Which configuration rule a push went through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigBranch {
    /// Operator push: thresholds and intervals taken from the push
    OperatorUpdate,
    /// Sensor push on a configured station: stored values kept
    LeaderEnforced,
    /// Station without stored thresholds: push values or defaults
    NewStation,
}

/// Outcome of merging one push
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub record: StationRecord,
    pub valid_reading: bool,
    pub branch: ConfigBranch,
    /// Seconds until the sensor should push again
    pub next_interval: u32,
}

/// Tier to use for a push given the freshly resolved weather.
///
/// A stored forced tier overrides live weather for pushes that do not
/// carry their own simulation tier, so sensor pushes keep following an
/// active simulation.
pub fn effective_tier(
    existing: Option<&StationRecord>,
    ctx: &PushContext,
    weather: &WeatherReport,
) -> Tier {
    if ctx.simulation_tier.is_some() {
        return weather.tier;
    }
    existing
        .and_then(|prev| prev.forced_weather_tier)
        .filter(|tier| *tier != Tier::Sunny)
        .unwrap_or(weather.tier)
}

/// Merge `push` into `existing`.
///
/// `weather` must already be resolved: the simulated report for an
/// operator push with a simulation tier, the cached/live report otherwise.
pub fn reconcile(
    existing: Option<&StationRecord>,
    push: &StationPush,
    weather: &WeatherReport,
    now: DateTime<Utc>,
) -> Reconciled {
    let ctx = PushContext::from(push);

    let valid_reading = push.distance.is_some_and(|d| d > 0.0);
    let distance = if valid_reading {
        push.distance
    } else {
        existing.and_then(|prev| prev.distance)
    };

    // Configured means both thresholds are stored
    let stored = existing.and_then(|prev| prev.thresholds().map(|t| (t, prev.intervals)));
    let push_warning = push.warning.filter(|w| *w != 0.0);
    let push_alarm = push.alarm.filter(|a| *a != 0.0);

    let (warning, alarm, intervals, branch) = match stored {
        _ if ctx.is_operator_push => (
            push_warning.unwrap_or(DEFAULT_WARNING_CM),
            push_alarm.unwrap_or(DEFAULT_ALARM_CM),
            push.intervals
                .or(existing.map(|prev| prev.intervals))
                .unwrap_or_default(),
            ConfigBranch::OperatorUpdate,
        ),
        Some(((warning, alarm), intervals)) => {
            (warning, alarm, intervals, ConfigBranch::LeaderEnforced)
        }
        None => (
            push_warning.unwrap_or(DEFAULT_WARNING_CM),
            push_alarm.unwrap_or(DEFAULT_ALARM_CM),
            push.intervals.unwrap_or_default(),
            ConfigBranch::NewStation,
        ),
    };

    let forced_weather_tier = match ctx.simulation_tier {
        Some(tier) => Some(tier).filter(|t| *t != Tier::Sunny),
        None => existing.and_then(|prev| prev.forced_weather_tier),
    };

    let weather_tier = effective_tier(existing, &ctx, weather);
    let previous_weather = existing.map(|prev| &prev.weather);
    let snapshot = WeatherSnapshot {
        temp: weather.temp.or(previous_weather.and_then(|w| w.temp)),
        rain_prob: weather
            .rain_prob
            .or(previous_weather.and_then(|w| w.rain_prob)),
        wind_speed: weather
            .wind_speed
            .or(previous_weather.and_then(|w| w.wind_speed)),
        condition: weather.forecast.clone(),
    };

    let river = push
        .river
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .or_else(|| {
            existing
                .map(|prev| prev.river.clone())
                .filter(|r| !r.is_empty())
        })
        .unwrap_or_else(|| DEFAULT_RIVER.to_string());

    let status = StationStatus::classify(distance, warning, alarm);
    let next_interval = next_interval_secs(status, forced_weather_tier, weather_tier, &intervals);

    let record = StationRecord {
        distance,
        warning: Some(warning),
        alarm: Some(alarm),
        status,
        forecast: weather.forecast.clone(),
        rain_expected: weather.rain_expected,
        weather_tier,
        weather: snapshot,
        river,
        intervals,
        forced_weather_tier,
        last_seen: now,
        is_simulated: false,
    };

    Reconciled {
        record,
        valid_reading,
        branch,
        next_interval,
    }
}
