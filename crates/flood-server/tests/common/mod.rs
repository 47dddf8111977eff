#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use flood_server::{build_app, AppOptions, AppState};
use flood_store::MemoryStore;
use flood_weather::FixedProvider;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const KEY: &str = "test-secret";

pub fn app() -> (Router, Arc<AppState>) {
    app_with(Some(KEY))
}

pub fn app_with(api_key: Option<&str>) -> (Router, Arc<AppState>) {
    let store = Arc::new(MemoryStore::new());
    let options = AppOptions::new(store, Arc::new(FixedProvider::clear()))
        .with_api_key(api_key.map(str::to_string));
    build_app(options).unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, key: Option<&str>, body: &Value) -> Request<Body> {
    post_raw(uri, key, body.to_string())
}

pub fn post_raw(uri: &str, key: Option<&str>, body: impl Into<Body>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(key) = key {
        builder = builder.header(header::AUTHORIZATION, key);
    }
    builder.body(body.into()).unwrap()
}

/// Send a request and decode the body as JSON, or as a JSON string if it is not JSON
pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let body = to_bytes(res.into_body(), 1024 * 1024).await.unwrap();
    let value = serde_json::from_slice(&body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()));
    (status, value)
}
