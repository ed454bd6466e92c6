//! Demo session endpoints and header correlation over real sockets.

use std::sync::Arc;

use chrono::Utc;
use reqwest::StatusCode;
use serde_json::{json, Value};

use lending_resilience::config::AppConfig;
use lending_resilience::session::{ManualClock, SessionId};
use lending_resilience::AppState;

mod common;

async fn create_session(client: &reqwest::Client, server: &common::TestServer, role: &str) -> String {
    let res = client
        .post(server.url("/demo/sessions"))
        .json(&json!({"userRole": role}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["isDemo"], false);
    assert!(body["data"]["expiresAt"].is_string());
    body["data"]["sessionId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_session_lifecycle() {
    let server = common::start_server(AppState::new(AppConfig::default())).await;
    let client = common::client();

    let id = create_session(&client, &server, "loan_officer").await;

    let res = client
        .post(server.url(&format!("/demo/sessions/{id}/interactions")))
        .header("x-demo-session-id", &id)
        .json(&json!({"action": "open_application", "details": {"applicationId": "APP-1001"}}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client.get(server.url(&format!("/demo/sessions/{id}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let session = &body["data"];
    assert_eq!(session["userRole"], "loan_officer");
    assert_eq!(session["isActive"], true);
    assert_eq!(session["interactions"][0]["action"], "open_application");
    assert_eq!(session["interactions"].as_array().unwrap().len(), 1);

    let res = client.delete(server.url(&format!("/demo/sessions/{id}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(server.url(&format!("/demo/sessions/{id}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"]["code"], "SESSION_NOT_FOUND");
    assert_eq!(body["isDemo"], false);
}

#[tokio::test]
async fn test_session_validation_errors_keep_error_shape() {
    let server = common::start_server(AppState::new(AppConfig::default())).await;
    let client = common::client();

    let res = client.get(server.url("/demo/sessions/not-a-uuid")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["isDemo"], false);
    assert!(body.get("data").is_none());

    let res = client
        .post(server.url("/demo/sessions"))
        .json(&json!({"userRole": "astronaut"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_header_records_requests_and_unknown_ids_pass() {
    let server = common::start_server(AppState::new(AppConfig::default())).await;
    let client = common::client();
    let id = create_session(&client, &server, "underwriter").await;

    let res = client
        .get(server.url("/health"))
        .header("x-demo-session-id", &id)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(server.url("/health"))
        .header("x-demo-session-id", SessionId::new().to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let session = server.state.sessions.get(id.parse().unwrap()).unwrap();
    assert_eq!(session.interactions.len(), 1);
    assert_eq!(session.interactions[0].details["path"], "/health");
}

#[tokio::test]
async fn test_expired_session_rejects_interactions() {
    let clock = ManualClock::new(Utc::now());
    let state = AppState::new(AppConfig::default()).with_session_clock(Arc::new(clock.clone()));
    let server = common::start_server(state).await;
    let client = common::client();
    let id = create_session(&client, &server, "applicant").await;

    clock.advance(chrono::Duration::minutes(31));

    let res = client
        .post(server.url(&format!("/demo/sessions/{id}/interactions")))
        .json(&json!({"action": "late"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::GONE);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"]["code"], "SESSION_EXPIRED");

    // Still listed until the cleanup scheduler sweeps it.
    let res = client.get(server.url(&format!("/demo/sessions/{id}"))).send().await.unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["isActive"], false);
}

#[tokio::test]
async fn test_closed_registry_refuses_new_sessions() {
    let server = common::start_server(AppState::new(AppConfig::default())).await;
    server.state.sessions.close();

    let res = common::client()
        .post(server.url("/demo/sessions"))
        .json(&json!({"userRole": "admin"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"]["code"], "SESSIONS_CLOSED");
}
