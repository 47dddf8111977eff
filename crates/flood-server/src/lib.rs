//! HTTP surface of the flood monitor
//!
//! Builds the axum [`Router`] over the station services. Binaries wire a
//! store and weather provider in through [`AppOptions`]; tests hand in an
//! in-memory store and a fixed provider.

pub mod auth;
pub mod backend;
pub mod error;
mod routes;

pub use backend::{open_provider, open_store};

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::{MatchedPath, Request, State},
    http::{header, HeaderName, Method, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use flood_core::KvStore;
use flood_engine::{Admin, Mailbox, Overview, StationConfigStore};
use flood_weather::{WeatherCache, WeatherProvider, DEFAULT_WEATHER_TIMEOUT, DEFAULT_WEATHER_TTL};
use opentelemetry::metrics::{Counter, MeterProvider};
use opentelemetry::KeyValue;
use opentelemetry_prometheus::exporter;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::{Encoder, Registry, TextEncoder};
use tower_http::cors::{Any, CorsLayer};

/// What the router needs from the outside world
pub struct AppOptions {
    pub store: Arc<dyn KvStore>,
    pub provider: Arc<dyn WeatherProvider>,
    pub api_key: Option<String>,
    pub weather_ttl: Duration,
    pub weather_timeout: Duration,
}

impl AppOptions {
    pub fn new(store: Arc<dyn KvStore>, provider: Arc<dyn WeatherProvider>) -> Self {
        Self {
            store,
            provider,
            api_key: None,
            weather_ttl: DEFAULT_WEATHER_TTL,
            weather_timeout: DEFAULT_WEATHER_TIMEOUT,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_weather_ttl(mut self, ttl: Duration) -> Self {
        self.weather_ttl = ttl;
        self
    }

    pub fn with_weather_timeout(mut self, timeout: Duration) -> Self {
        self.weather_timeout = timeout;
        self
    }
}

pub struct AppState {
    ready: AtomicBool,
    registry: Registry,
    #[allow(dead_code)]
    meter_provider: SdkMeterProvider,
    requests_total: Counter<u64>,
    pushes_total: Counter<u64>,
    pub(crate) api_key: Option<String>,
    pub(crate) stations: StationConfigStore,
    pub(crate) overview: Overview,
    pub(crate) mailbox: Mailbox,
    pub(crate) admin: Admin,
}

impl AppState {
    pub(crate) fn record_push(&self, status: &'static str) {
        self.pushes_total.add(1, &[KeyValue::new("status", status)]);
    }
}

pub fn build_app(options: AppOptions) -> Result<(Router, Arc<AppState>)> {
    // Prometheus exporter via OpenTelemetry
    let registry = Registry::new();
    let reader = exporter()
        .with_registry(registry.clone())
        .build()
        .context("Failed to build prometheus exporter")?;
    let meter_provider = SdkMeterProvider::builder().with_reader(reader).build();
    let meter = meter_provider.meter("flood-server");

    let requests_total = meter
        .u64_counter("flood_requests_total")
        .with_description("Total HTTP requests served")
        .init();
    let pushes_total = meter
        .u64_counter("flood_pushes_total")
        .with_description("Accepted station pushes by resulting status")
        .init();

    let weather = Arc::new(
        WeatherCache::new(Arc::clone(&options.store), options.provider)
            .with_ttl(options.weather_ttl)
            .with_timeout(options.weather_timeout),
    );
    let store = options.store;

    let state = Arc::new(AppState {
        ready: AtomicBool::new(false),
        registry,
        meter_provider,
        requests_total,
        pushes_total,
        api_key: options
            .api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty()),
        stations: StationConfigStore::new(Arc::clone(&store), weather),
        overview: Overview::new(Arc::clone(&store)),
        mailbox: Mailbox::new(Arc::clone(&store)),
        admin: Admin::new(store),
    });

    let api = Router::new()
        .route(
            "/api/push-status",
            post(routes::push_status).options(routes::preflight),
        )
        .route("/api/status", get(routes::status))
        .route("/api/history", get(routes::history))
        .route("/api/history-info", get(routes::history_info))
        .route("/api/notify", post(routes::notify))
        .route("/api/check-notify", get(routes::check_notify))
        .route(
            "/api/delete-station",
            post(routes::delete_station).options(routes::preflight),
        )
        .route("/api/migrate-station", post(routes::migrate_station))
        .route("/api/seed-history", post(routes::seed_history))
        .layer(cors_layer());

    let router = Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .merge(api)
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            count_requests,
        ))
        .with_state(Arc::clone(&state));

    Ok((router, state))
}

pub fn set_ready(state: &Arc<AppState>, is_ready: bool) {
    state.ready.store(is_ready, Ordering::Relaxed);
}

async fn count_requests(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_default();
    state.requests_total.add(1, &[KeyValue::new("route", route)]);
    next.run(req).await
}

/// Browser dashboards call the API cross-origin
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-api-key"),
        ])
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn readyz(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.ready.load(Ordering::Relaxed) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn metrics(
    State(state): State<Arc<AppState>>,
) -> (
    [(axum::http::header::HeaderName, axum::http::HeaderValue); 1],
    String,
) {
    let encoder = TextEncoder::new();
    let metric_families = state.registry.gather();
    let mut buf = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buf) {
        tracing::warn!(error=?e, "failed to encode metrics");
    }
    let body = String::from_utf8(buf).unwrap_or_default();
    let header = (
        header::CONTENT_TYPE,
        axum::http::HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
    );
    ([header], body)
}
