//! Envelope middleware behaviour, exercised in-process with `oneshot`.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower::ServiceExt;

use lending_resilience::config::AppConfig;
use lending_resilience::http::envelope::envelope_middleware;
use lending_resilience::AppState;

fn app(state: AppState) -> Router {
    Router::new()
        .route("/applications/{id}", get(|| async { Json(json!({"id": "APP-42"})) }))
        .route(
            "/already",
            get(|| async { Json(json!({"data": [1, 2], "isDemo": false, "timestamp": "t"})) }),
        )
        .route(
            "/dashboard/stats",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"error": {"code": "X"}}))) }),
        )
        .route(
            "/ledger",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": {"code": "Y"}}))) }),
        )
        .route(
            "/applications/{id}/documents",
            get(|| async { (StatusCode::BAD_GATEWAY, Json(json!({"error": {"code": "Z"}}))) }),
        )
        .route("/text", get(|| async { "plain text" }))
        .route(
            "/health",
            get(|| async { Json(json!({"status": "ok"})) }),
        )
        .layer(from_fn_with_state(state.clone(), envelope_middleware))
        .with_state(state)
}

async fn send(router: &Router, path: &str) -> Response {
    router
        .clone()
        .oneshot(Request::get(path).body(Body::empty()).unwrap())
        .await
        .unwrap()
        .into_response()
}

async fn json_of(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_success_is_wrapped_once() {
    let router = app(AppState::new(AppConfig::default()));

    let body = json_of(send(&router, "/applications/APP-42").await).await;
    assert_eq!(body["data"]["id"], "APP-42");
    assert_eq!(body["isDemo"], false);

    let body = json_of(send(&router, "/already").await).await;
    assert_eq!(body, json!({"data": [1, 2], "isDemo": false, "timestamp": "t"}));
}

#[tokio::test]
async fn test_5xx_propagates_while_live() {
    let state = AppState::new(AppConfig::default());
    let router = app(state.clone());

    let response = send(&router, "/dashboard/stats").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(response.headers().get("x-demo-mode").is_none());
    let body = json_of(response).await;
    assert_eq!(body["error"]["code"], "X");
    assert_eq!(body["isDemo"], false);
    assert!(!state.resilience.is_active());
}

#[tokio::test]
async fn test_5xx_substituted_while_active() {
    let state = AppState::new(AppConfig::default());
    state.resilience.activate("cache startup probe failed").unwrap();
    let router = app(state.clone());

    let response = send(&router, "/dashboard/stats").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-demo-mode"], "true");
    assert_eq!(
        response.headers()["x-demo-mode-message"],
        state.config.resilience.demo_message.as_str()
    );
    let body = json_of(response).await;
    assert_eq!(body["isDemo"], true);
    assert_eq!(body["data"]["totalApplications"], 128);
    assert_eq!(body["message"], state.config.resilience.demo_message);
}

#[tokio::test]
async fn test_5xx_without_fallback_keeps_error() {
    let state = AppState::new(AppConfig::default());
    state.resilience.activate("database startup probe failed").unwrap();
    let router = app(state);

    let response = send(&router, "/ledger").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()["x-demo-mode"], "true");
    let body = json_of(response).await;
    assert_eq!(body["error"]["code"], "Y");
    assert_eq!(body["isDemo"], true);
}

#[tokio::test]
async fn test_non_json_and_exempt_untouched() {
    let router = app(AppState::new(AppConfig::default()));

    let response = send(&router, "/text").await;
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"plain text");

    let body = json_of(send(&router, "/health").await).await;
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_parameterised_route_resolves_fallback() {
    let state = AppState::new(AppConfig::default());
    state.resilience.activate("database startup probe failed").unwrap();
    let router = app(state);

    let response = send(&router, "/applications/APP-9/documents").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_of(response).await;
    assert_eq!(body["isDemo"], true);
    assert_eq!(body["data"][0]["id"], "DOC-501");
}

#[tokio::test]
async fn test_oversized_body_passes_through_unwrapped() {
    let mut config = AppConfig::default();
    config.envelope.max_body_bytes = 8;
    let state = AppState::new(config);
    let router = app(state.clone());

    let response = send(&router, "/applications/APP-42").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_of(response).await, json!({"id": "APP-42"}));

    state.resilience.activate("cache startup probe failed").unwrap();
    let response = send(&router, "/applications/APP-42").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-demo-mode"], "true");
    assert_eq!(json_of(response).await, json!({"id": "APP-42"}));
}
