//! Virtual sensor daemon
//!
//! Pushes synthetic readings to the flood server at the cadence the server
//! asks for, until Ctrl+C.

use anyhow::{Context, Result};
use flood_sensor::{HttpUplink, Sensor, SensorSettings, SyntheticGauge};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    flood_obs::init("flood-sensord");

    let cfg = flood_config::AppConfig::load().context("Failed to load configuration")?;
    let settings = SensorSettings::from_config(&cfg);
    let server_url = cfg.sensor_server_url();
    let api_key = cfg.sensor_api_key();
    if api_key.is_none() {
        warn!("no API key configured; the server will reject pushes");
    }
    info!(%server_url, station = %settings.station, "starting virtual sensor");

    let uplink = HttpUplink::new(server_url, api_key).context("Failed to build HTTP client")?;
    let mut sensor = Sensor::new(settings, SyntheticGauge::default(), uplink);

    tokio::select! {
        _ = sensor.run() => {}
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                error!(error = %e, "failed to listen for shutdown signal");
            }
            info!("Shutdown signal received");
        }
    }

    info!("Virtual sensor stopped");
    Ok(())
}
