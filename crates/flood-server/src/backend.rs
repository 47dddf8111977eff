//! Store and weather provider selection from configuration

use anyhow::{Context, Result};
use flood_config::{AppConfig, StoreBackend};
use flood_core::KvStore;
use flood_store::{FsStore, MemoryStore};
use flood_weather::{OpenWeatherMap, WeatherProvider};
use std::sync::Arc;
use tracing::{info, warn};

pub async fn open_store(cfg: &AppConfig) -> Result<Arc<dyn KvStore>> {
    let backend = cfg.store_backend();
    let store: Arc<dyn KvStore> = match backend {
        StoreBackend::Memory => {
            warn!("using in-memory store; state is lost on restart");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Fs => {
            let dir = cfg.store_path();
            info!(dir = %dir.display(), "opening file store");
            Arc::new(FsStore::new(&dir).context("Failed to open file store")?)
        }
        #[cfg(feature = "sqlite")]
        StoreBackend::Sqlite => {
            let path = cfg.store_path();
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            info!(path = %path.display(), "opening sqlite store");
            Arc::new(flood_store::SqliteStore::open(&path).context("Failed to open sqlite store")?)
        }
        #[cfg(feature = "mysql")]
        StoreBackend::Mysql => {
            let url = cfg
                .store_url()
                .context("store.url is required for the mysql backend")?;
            let store = flood_store::MySqlStore::connect(&url)
                .await
                .context("Failed to connect to database")?;
            store.ping().await.context("Database ping failed")?;
            info!("connected to mysql store");
            Arc::new(store)
        }
        #[allow(unreachable_patterns)]
        other => anyhow::bail!("store backend {other:?} is not compiled in"),
    };
    Ok(store)
}

pub fn open_provider(cfg: &AppConfig) -> Result<Arc<dyn WeatherProvider>> {
    let api_key = cfg.weather_api_key();
    if api_key.is_none() {
        warn!("OWM_API_KEY not set; weather falls back to defaults");
    }
    let provider = OpenWeatherMap::new(cfg.weather_base_url(), api_key)
        .context("Failed to build weather client")?;
    Ok(Arc::new(provider))
}
