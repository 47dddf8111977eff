//! OpenWeatherMap forecast provider

use crate::{Coordinates, Observation, WeatherError, WeatherProvider, WeatherResult};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

pub const DEFAULT_OWM_BASE_URL: &str = "https://api.openweathermap.org";

pub struct OpenWeatherMap {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenWeatherMap {
    /// A missing or empty key is accepted; every fetch then fails with
    /// [`WeatherError::MissingApiKey`] and the cache falls back.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> WeatherResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| WeatherError::Request(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    fn forecast_url(&self, coords: &Coordinates, api_key: &str) -> WeatherResult<Url> {
        Url::parse_with_params(
            &format!("{}/data/2.5/forecast", self.base_url),
            &[
                ("lat", coords.lat.to_string()),
                ("lon", coords.lon.to_string()),
                ("cnt", "2".to_string()),
                ("appid", api_key.to_string()),
                ("units", "metric".to_string()),
            ],
        )
        .map_err(|e| WeatherError::Request(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    list: Vec<ForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct ForecastEntry {
    #[serde(default)]
    weather: Vec<Condition>,
    main: Option<MainBlock>,
    pop: Option<f64>,
    wind: Option<Wind>,
}

#[derive(Debug, Deserialize)]
struct Condition {
    main: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Wind {
    speed: Option<f64>,
}

/// Turn the first forecast slot into an observation
pub fn parse_forecast(response: ForecastResponse) -> WeatherResult<Observation> {
    let entry = response.list.into_iter().next().ok_or(WeatherError::NoData)?;
    let first = entry.weather.into_iter().next();

    let condition = first
        .as_ref()
        .and_then(|w| w.main.clone())
        .unwrap_or_else(|| "Unknown".to_string());
    let description = first
        .and_then(|w| w.description)
        .unwrap_or_else(|| condition.clone());

    Ok(Observation {
        condition,
        description,
        temp: entry.main.and_then(|m| m.temp).map(f64::round),
        rain_prob: Some((entry.pop.unwrap_or(0.0) * 100.0).round()),
        wind_speed: Some(entry.wind.and_then(|w| w.speed).unwrap_or(0.0).round()),
    })
}

#[async_trait::async_trait]
impl WeatherProvider for OpenWeatherMap {
    fn name(&self) -> &str {
        "openweathermap"
    }

    async fn fetch(&self, coords: &Coordinates) -> WeatherResult<Observation> {
        let api_key = self.api_key.as_deref().ok_or(WeatherError::MissingApiKey)?;
        let url = self.forecast_url(coords, api_key)?;
        tracing::debug!(station = coords.name, "requesting forecast");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| WeatherError::Request(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(WeatherError::HttpStatus(resp.status().as_u16()));
        }
        let body: ForecastResponse = resp
            .json()
            .await
            .map_err(|e| WeatherError::Request(e.to_string()))?;
        parse_forecast(body)
    }
}
