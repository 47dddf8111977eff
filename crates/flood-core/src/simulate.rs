//! Synthetic water levels for virtual stations and seeded history

/// Pseudo-random distance in `[min, max]` cm, stable for a given seed
pub fn synthetic_distance(seed: i64, min: f64, max: f64) -> f64 {
    // xorshift64 jitter
    let mut x = (seed as u64) ^ 0x9E37_79B9_7F4A_7C15;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    let unit = (x % 10_001) as f64 / 10_000.0;
    (min + unit * (max - min)).round()
}
