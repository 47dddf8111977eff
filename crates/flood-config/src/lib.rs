use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_HTTP_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_WEATHER_BASE_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_WEATHER_TTL_SECS: u64 = 30 * 60;
pub const DEFAULT_WEATHER_TIMEOUT_SECS: u64 = 3;
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_SENSOR_STATION: &str = "Antwerpen";
/// Sensors never poll faster than this, whatever the server answers
pub const DEFAULT_MIN_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpConfig {
    pub bind: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secret for pushes and admin calls
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub ttl_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    #[default]
    Fs,
    Sqlite,
    Mysql,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: Option<StoreBackend>,
    /// Directory for `fs`, database file for `sqlite`
    pub path: Option<String>,
    /// Connection URL for `mysql`
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SensorConfig {
    pub server_url: Option<String>,
    pub station: Option<String>,
    pub river: Option<String>,
    pub api_key: Option<String>,
    pub min_interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub http: Option<HttpConfig>,
    pub auth: Option<AuthConfig>,
    pub weather: Option<WeatherConfig>,
    pub store: Option<StoreConfig>,
    pub sensor: Option<SensorConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Treat blank strings as absent
fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl AppConfig {
    /// Load configuration from FLOOD_CONFIG path (TOML) if present, then apply
    /// environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("FLOOD_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        let cfg = if Path::new(&path).exists() {
            let s = fs::read_to_string(&path)?;
            Self::from_toml_str(&s)?
        } else {
            AppConfig::default()
        };
        let cfg = cfg.with_overrides(|name| std::env::var(name).ok());
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str::<AppConfig>(s)?)
    }

    /// Apply FLOOD_API_KEY, OWM_API_KEY, FLOOD_HTTP_BIND, FLOOD_DATA_DIR,
    /// FLOOD_SERVER_URL and FLOOD_STATION on top of the file values
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = lookup("FLOOD_API_KEY") {
            self.auth.get_or_insert_with(Default::default).api_key = Some(key);
        }
        if let Some(key) = lookup("OWM_API_KEY") {
            self.weather.get_or_insert_with(Default::default).api_key = Some(key);
        }
        if let Some(bind) = lookup("FLOOD_HTTP_BIND") {
            self.http.get_or_insert_with(Default::default).bind = Some(bind);
        }
        if let Some(dir) = lookup("FLOOD_DATA_DIR") {
            self.store.get_or_insert_with(Default::default).path = Some(dir);
        }
        if let Some(url) = lookup("FLOOD_SERVER_URL") {
            self.sensor.get_or_insert_with(Default::default).server_url = Some(url);
        }
        if let Some(station) = lookup("FLOOD_STATION") {
            self.sensor.get_or_insert_with(Default::default).station = Some(station);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store_backend() == StoreBackend::Mysql && self.store_url().is_none() {
            return Err(ConfigError::Invalid(
                "store.url is required for the mysql backend".into(),
            ));
        }
        if self.weather_timeout().is_zero() {
            return Err(ConfigError::Invalid(
                "weather.timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Get HTTP bind address (default 0.0.0.0:8080)
    pub fn http_bind(&self) -> String {
        self.http
            .as_ref()
            .and_then(|h| non_blank(h.bind.as_ref()))
            .unwrap_or_else(|| DEFAULT_HTTP_BIND.to_string())
    }

    /// Shared secret; `None` means authenticated routes cannot be served
    pub fn api_key(&self) -> Option<String> {
        self.auth.as_ref().and_then(|a| non_blank(a.api_key.as_ref()))
    }

    pub fn weather_api_key(&self) -> Option<String> {
        self.weather
            .as_ref()
            .and_then(|w| non_blank(w.api_key.as_ref()))
    }

    pub fn weather_base_url(&self) -> String {
        self.weather
            .as_ref()
            .and_then(|w| non_blank(w.base_url.as_ref()))
            .unwrap_or_else(|| DEFAULT_WEATHER_BASE_URL.to_string())
    }

    pub fn weather_ttl(&self) -> Duration {
        let secs = self.weather.as_ref().and_then(|w| w.ttl_secs);
        Duration::from_secs(secs.unwrap_or(DEFAULT_WEATHER_TTL_SECS))
    }

    pub fn weather_timeout(&self) -> Duration {
        let secs = self.weather.as_ref().and_then(|w| w.timeout_secs);
        Duration::from_secs(secs.unwrap_or(DEFAULT_WEATHER_TIMEOUT_SECS))
    }

    pub fn store_backend(&self) -> StoreBackend {
        self.store
            .as_ref()
            .and_then(|s| s.backend)
            .unwrap_or_default()
    }

    /// Directory or file the store lives in; `flood.db` inside the data
    /// directory for sqlite when no path is set
    pub fn store_path(&self) -> PathBuf {
        let configured = self.store.as_ref().and_then(|s| non_blank(s.path.as_ref()));
        match (self.store_backend(), configured) {
            (StoreBackend::Sqlite, Some(p)) if Path::new(&p).is_dir() => {
                Path::new(&p).join("flood.db")
            }
            (_, Some(p)) => PathBuf::from(p),
            (StoreBackend::Sqlite, None) => Path::new(DEFAULT_DATA_DIR).join("flood.db"),
            (_, None) => PathBuf::from(DEFAULT_DATA_DIR),
        }
    }

    pub fn store_url(&self) -> Option<String> {
        self.store.as_ref().and_then(|s| non_blank(s.url.as_ref()))
    }

    pub fn sensor_server_url(&self) -> String {
        self.sensor
            .as_ref()
            .and_then(|s| non_blank(s.server_url.as_ref()))
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn sensor_station(&self) -> String {
        self.sensor
            .as_ref()
            .and_then(|s| non_blank(s.station.as_ref()))
            .unwrap_or_else(|| DEFAULT_SENSOR_STATION.to_string())
    }

    pub fn sensor_river(&self) -> Option<String> {
        self.sensor.as_ref().and_then(|s| non_blank(s.river.as_ref()))
    }

    /// Key the sensor sends; falls back to the shared secret
    pub fn sensor_api_key(&self) -> Option<String> {
        self.sensor
            .as_ref()
            .and_then(|s| non_blank(s.api_key.as_ref()))
            .or_else(|| self.api_key())
    }

    pub fn sensor_min_interval(&self) -> Duration {
        let secs = self.sensor.as_ref().and_then(|s| s.min_interval_secs);
        Duration::from_secs(secs.unwrap_or(DEFAULT_MIN_INTERVAL_SECS))
    }
}
