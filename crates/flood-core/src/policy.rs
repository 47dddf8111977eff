//! Adaptive measurement interval policy

use crate::types::{IntervalTable, StationStatus, Tier};

/// Pick the tier whose interval the sensor should use next.
///
/// Highest priority first: an active forced tier, then alarm/warning
/// status, then the weather tier. A forced tier overrides real status so
/// that simulated traffic is not masked by a real alarm.
pub fn interval_tier(status: StationStatus, forced_tier: Option<Tier>, weather_tier: Tier) -> Tier {
    match (forced_tier, status) {
        (Some(forced), _) if forced != Tier::Sunny => forced,
        (_, StationStatus::Alarm) => Tier::Waterbomb,
        (_, StationStatus::Warning) => Tier::Stormy,
        _ => weather_tier,
    }
}

/// Next polling interval in seconds.
///
/// Table entries are used as given; a zero entry yields zero.
pub fn next_interval_secs(
    status: StationStatus,
    forced_tier: Option<Tier>,
    weather_tier: Tier,
    intervals: &IntervalTable,
) -> u32 {
    let tier = interval_tier(status, forced_tier, weather_tier);
    intervals.minutes(tier).saturating_mul(60)
}
