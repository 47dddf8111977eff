use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn healthz_ok_and_readyz_toggles() {
    let (app, state) = common::app();

    let res = app.clone().oneshot(common::get("/healthz")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.clone().oneshot(common::get("/readyz")).await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    flood_server::set_ready(&state, true);
    let res = app.clone().oneshot(common::get("/readyz")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn metrics_count_requests_and_pushes() {
    let (app, _state) = common::app();

    let push = serde_json::json!({"distance": 50.0, "station": "Gent"});
    let (status, _) = common::send(
        &app,
        common::post_json("/api/push-status", Some(common::KEY), &push),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = to_bytes(res.into_body(), 1024 * 1024).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("flood_requests_total"));
    assert!(text.contains("flood_pushes_total"));
    assert!(text.contains("NORMAL"));
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (app, _state) = common::app();
    let res = app.clone().oneshot(common::get("/api/nope")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
