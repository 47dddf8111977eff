//! `/api` handlers

use crate::{auth::Authorized, error::ApiError, AppState};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use flood_core::{StationPush, DEFAULT_STATION};
use flood_engine::{DEFAULT_SEED_STATION, SEED_MAX_CM, SEED_MIN_CM};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

const NO_STORE: &str = "no-store, no-cache, must-revalidate, proxy-revalidate";

type ApiResult<T = Response> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub(crate) struct StationQuery {
    station: Option<String>,
}

impl StationQuery {
    fn station_or(self, default: &str) -> String {
        self.station
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| default.to_string())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct NotifyRequest {
    station: Option<String>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StationRequest {
    station: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MigrateRequest {
    old_station: Option<String>,
    new_station: Option<String>,
    river: Option<String>,
}

fn parse_json<T: DeserializeOwned>(body: &Bytes) -> ApiResult<T> {
    Ok(serde_json::from_slice(body)?)
}

/// Like [`parse_json`] but an empty body yields `T::default()`
fn parse_json_or_default<T: DeserializeOwned + Default>(body: &Bytes) -> ApiResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    parse_json(body)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

pub(crate) async fn preflight() -> &'static str {
    "OK"
}

pub(crate) async fn push_status(
    State(state): State<Arc<AppState>>,
    _auth: Authorized,
    body: Bytes,
) -> ApiResult {
    let push: StationPush = parse_json(&body)?;
    let outcome = state.stations.apply_push(push).await?;
    state.record_push(outcome.data.status.as_str());
    Ok(Json(outcome).into_response())
}

pub(crate) async fn status(State(state): State<Arc<AppState>>) -> ApiResult {
    let stations = state.overview.all().await?;
    Ok(([(header::CACHE_CONTROL, NO_STORE)], Json(stations)).into_response())
}

pub(crate) async fn history(
    State(state): State<Arc<AppState>>,
    Query(q): Query<StationQuery>,
) -> ApiResult {
    let station = non_blank(q.station)
        .ok_or_else(|| ApiError::BadRequest("Station parameter required".into()))?;
    let entries = state.stations.ledger().get(&station).await?;
    Ok(([(header::CACHE_CONTROL, NO_STORE)], Json(entries)).into_response())
}

pub(crate) async fn history_info(
    State(state): State<Arc<AppState>>,
    Query(q): Query<StationQuery>,
) -> ApiResult {
    let station = q.station_or(DEFAULT_SEED_STATION);
    let summary = state.stations.ledger().summary(&station).await?;
    Ok(Json(summary).into_response())
}

pub(crate) async fn notify(
    State(state): State<Arc<AppState>>,
    _auth: Authorized,
    body: Bytes,
) -> ApiResult {
    let req: NotifyRequest = parse_json(&body)?;
    let station = non_blank(req.station).unwrap_or_else(|| DEFAULT_STATION.to_string());
    let pending = state.mailbox.put(&station, &req.message).await?;
    Ok(Json(json!({
        "success": true,
        "station": station,
        "timestamp": pending.timestamp,
    }))
    .into_response())
}

pub(crate) async fn check_notify(
    State(state): State<Arc<AppState>>,
    Query(q): Query<StationQuery>,
) -> ApiResult {
    let station = q.station_or(DEFAULT_STATION);
    let body = match state.mailbox.take_if_present(&station).await? {
        Some(pending) => json!({
            "pending": true,
            "message": pending.message,
            "timestamp": pending.timestamp,
        }),
        None => json!({ "pending": false }),
    };
    Ok(Json(body).into_response())
}

pub(crate) async fn delete_station(
    State(state): State<Arc<AppState>>,
    _auth: Authorized,
    body: Bytes,
) -> ApiResult {
    let req: StationRequest = parse_json(&body)?;
    let station = non_blank(req.station)
        .ok_or_else(|| ApiError::BadRequest("Station name required".into()))?;
    let existed = state.admin.delete_station(&station).await?;
    Ok(Json(json!({
        "success": true,
        "deleted": station,
        "existed": existed,
    }))
    .into_response())
}

pub(crate) async fn migrate_station(
    State(state): State<Arc<AppState>>,
    _auth: Authorized,
    body: Bytes,
) -> ApiResult {
    let req: MigrateRequest = parse_json(&body)?;
    let (Some(old), Some(new)) = (non_blank(req.old_station), non_blank(req.new_station)) else {
        return Err(ApiError::BadRequest("Missing station names".into()));
    };
    let outcome = state
        .admin
        .migrate_station(&old, &new, req.river.as_deref())
        .await?;
    info!(%old, %new, "migration requested");
    Ok(Json(json!({
        "success": true,
        "message": format!("Migrated {old} to {new}"),
        "riverUpdated": outcome.river_updated,
        "movedRecord": outcome.moved_record,
        "movedHistory": outcome.moved_history,
    }))
    .into_response())
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SeedRequest {
    station: Option<String>,
}

pub(crate) async fn seed_history(
    State(state): State<Arc<AppState>>,
    _auth: Authorized,
    body: Bytes,
) -> ApiResult {
    let req: SeedRequest = parse_json_or_default(&body)?;
    let station = non_blank(req.station);
    let outcome = state.admin.seed_history(station.as_deref()).await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Seeded {} points for {}", outcome.points, outcome.station),
        "range": format!("{SEED_MIN_CM}cm - {SEED_MAX_CM}cm"),
        "latest": outcome.latest,
    }))
    .into_response())
}
