use axum::http::StatusCode;
use serde_json::json;

mod common;

use common::{get, post_json, post_raw, send, KEY};

async fn push(app: &axum::Router, station: &str, distance: f64) {
    let body = json!({"distance": distance, "station": station});
    let (status, _) = send(app, post_json("/api/push-status", Some(KEY), &body)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn history_requires_station_and_reads_oldest_first() {
    let (app, _state) = common::app();

    let (status, _) = send(&app, get("/api/history")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, get("/api/history?station=Nowhere")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    push(&app, "Gent", 70.0).await;
    push(&app, "Gent", -5.0).await;
    push(&app, "Gent", 65.0).await;

    let (_, body) = send(&app, get("/api/history?station=gent")).await;
    let vals: Vec<f64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["val"].as_f64().unwrap())
        .collect();
    assert_eq!(vals, vec![70.0, 65.0]);

    let (_, info) = send(&app, get("/api/history-info?station=Gent")).await;
    assert_eq!(info["station"], "gent");
    assert_eq!(info["count"], 2);
    assert_eq!(info["first"]["val"], 70.0);
    assert_eq!(info["last"]["val"], 65.0);
}

#[tokio::test]
async fn notify_is_delivered_once() {
    let (app, _state) = common::app();

    let msg = json!({"station": "Gent", "message": "hello"});
    let (status, _) = send(&app, post_json("/api/notify", None, &msg)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, post_json("/api/notify", Some(KEY), &msg)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, body) = send(&app, get("/api/check-notify?station=Antwerpen")).await;
    assert_eq!(body, json!({"pending": false}));

    let (_, body) = send(&app, get("/api/check-notify?station=Gent")).await;
    assert_eq!(body["pending"], true);
    assert_eq!(body["message"], "hello");
    assert!(body["timestamp"].is_string());

    let (_, body) = send(&app, get("/api/check-notify?station=Gent")).await;
    assert_eq!(body, json!({"pending": false}));

    let empty = json!({"station": "Gent", "message": " "});
    let (status, _) = send(&app, post_json("/api/notify", Some(KEY), &empty)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_station_removes_everything() {
    let (app, _state) = common::app();
    push(&app, "Oudenaarde", 60.0).await;

    let (status, _) = send(&app, post_json("/api/delete-station", Some(KEY), &json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body = json!({"station": "Oudenaarde"});
    let (status, res) = send(&app, post_json("/api/delete-station", Some(KEY), &body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["deleted"], "Oudenaarde");
    assert_eq!(res["existed"], true);

    let (_, status_body) = send(&app, get("/api/status")).await;
    assert!(status_body.get("oudenaarde").is_none());
    let (_, history) = send(&app, get("/api/history?station=Oudenaarde")).await;
    assert_eq!(history, json!([]));
}

#[tokio::test]
async fn migrate_station_moves_record_and_history() {
    let (app, _state) = common::app();
    push(&app, "Gent", 60.0).await;
    push(&app, "Gent", 61.0).await;

    let missing = json!({"oldStation": "Gent"});
    let (status, _) = send(&app, post_json("/api/migrate-station", Some(KEY), &missing)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body = json!({"oldStation": "Gent", "newStation": "Merelbeke", "river": "Schelde"});
    let (status, res) = send(&app, post_json("/api/migrate-station", Some(KEY), &body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["riverUpdated"], true);
    assert_eq!(res["movedHistory"], 2);

    let (_, stations) = send(&app, get("/api/status")).await;
    assert!(stations.get("gent").is_none());
    assert_eq!(stations["merelbeke"]["distance"], 61.0);
    let (_, history) = send(&app, get("/api/history?station=Merelbeke")).await;
    assert_eq!(history.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn seed_history_with_and_without_body() {
    let (app, _state) = common::app();

    let (status, res) = send(&app, post_raw("/api/seed-history", Some(KEY), "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["message"], "Seeded 97 points for doornik");
    assert_eq!(res["range"], "50cm - 120cm");
    assert_eq!(res["latest"]["isSimulated"], true);
    assert_eq!(res["latest"]["forecast"], "Simulated Data (Seeded)");

    let (_, info) = send(&app, get("/api/history-info")).await;
    assert_eq!(info["station"], "doornik");
    assert_eq!(info["count"], 97);

    let body = json!({"station": "Gent"});
    let (status, res) = send(&app, post_json("/api/seed-history", Some(KEY), &body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["message"], "Seeded 97 points for gent");

    let (status, _) = send(&app, post_raw("/api/seed-history", None, "")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
