//! Known station locations

/// Location used for the weather lookup of a station
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
    pub name: &'static str,
}

/// Stations with a weather lookup, keyed by normalized station key
pub const STATIONS: &[(&str, Coordinates)] = &[
    ("antwerpen", Coordinates { lat: 51.2194, lon: 4.4025, name: "Antwerpen" }),
    ("gent", Coordinates { lat: 51.0543, lon: 3.7174, name: "Gent" }),
    ("oudenaarde", Coordinates { lat: 50.8486, lon: 3.6025, name: "Oudenaarde" }),
    ("doornik", Coordinates { lat: 50.6079, lon: 3.3897, name: "Doornik" }),
    ("dendermonde", Coordinates { lat: 51.0272, lon: 4.1016, name: "Dendermonde" }),
];

pub fn coordinates(station_key: &str) -> Option<Coordinates> {
    STATIONS
        .iter()
        .find(|(key, _)| *key == station_key)
        .map(|(_, coords)| *coords)
}
