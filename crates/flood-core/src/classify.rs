//! Weather condition to tier classification

use crate::types::Tier;

/// Rain probability (percent) above which plain rain counts as stormy
pub const STORMY_RAIN_PROBABILITY: f64 = 70.0;

/// Whether a provider condition brings rain with it
pub fn is_rain_bearing(condition: &str) -> bool {
    matches!(
        condition.trim().to_ascii_lowercase().as_str(),
        "rain" | "thunderstorm" | "drizzle" | "squall"
    )
}

/// Map a forecast condition to a tier.
///
/// An override tier is returned verbatim; this is how an operator pins a
/// tier for testing.
pub fn classify(
    condition: &str,
    rain_probability: Option<f64>,
    override_tier: Option<Tier>,
) -> Tier {
    if let Some(tier) = override_tier {
        return tier;
    }

    let condition = condition.trim().to_ascii_lowercase();
    let rain_probability = rain_probability.unwrap_or(0.0);

    match condition.as_str() {
        "thunderstorm" => Tier::Waterbomb,
        "rain" if rain_probability > STORMY_RAIN_PROBABILITY => Tier::Stormy,
        c if is_rain_bearing(c) => Tier::Moderate,
        _ => Tier::Sunny,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins() {
        assert_eq!(classify("Thunderstorm", Some(100.0), Some(Tier::Sunny)), Tier::Sunny);
        assert_eq!(classify("Clear", None, Some(Tier::Stormy)), Tier::Stormy);
    }

    #[test]
    fn test_condition_tiers() {
        assert_eq!(classify("Thunderstorm", Some(10.0), None), Tier::Waterbomb);
        assert_eq!(classify("Rain", Some(71.0), None), Tier::Stormy);
        assert_eq!(classify("Rain", Some(70.0), None), Tier::Moderate);
        assert_eq!(classify("Rain", None, None), Tier::Moderate);
        assert_eq!(classify("Drizzle", Some(95.0), None), Tier::Moderate);
        assert_eq!(classify("Squall", Some(0.0), None), Tier::Moderate);
        assert_eq!(classify("Clouds", Some(90.0), None), Tier::Sunny);
        assert_eq!(classify("Clear", None, None), Tier::Sunny);
    }

    #[test]
    fn test_rain_bearing() {
        assert!(is_rain_bearing("Thunderstorm"));
        assert!(is_rain_bearing("drizzle"));
        assert!(!is_rain_bearing("Snow"));
    }
}
