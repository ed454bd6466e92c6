//! Demo-mode activation and fallback substitution over real sockets.

use reqwest::StatusCode;
use serde_json::{json, Value};

use lending_resilience::config::AppConfig;
use lending_resilience::lifecycle;
use lending_resilience::resilience::CircuitState;

mod common;

fn config_with(deps: Vec<lending_resilience::config::DependencyConfig>) -> AppConfig {
    let mut config = AppConfig::default();
    config.dependencies = deps;
    config
}

#[tokio::test]
async fn test_failed_store_probe_serves_fallback_applications() {
    let database = common::start_mock_dependency(false, json!([])).await;
    let cache = common::start_mock_dependency(true, json!({})).await;
    let config = config_with(vec![database.config("database", true), cache.config("cache", true)]);

    let state = lifecycle::initialise(config).await.unwrap();
    assert!(state.resilience.is_active());
    assert_eq!(state.resilience.reason().as_deref(), Some("database startup probe failed"));

    let server = common::start_server(state).await;
    let client = common::client();

    let res = client.get(server.url("/applications")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-demo-mode"], "true");
    assert!(res.headers().contains_key("x-demo-mode-message"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["isDemo"], true);
    assert_eq!(body["data"].as_array().unwrap().len(), 4);
    assert!(body["message"].is_string());

    let res = client.get(server.url("/applications/APP-77")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["id"], "APP-1001");

    // The failed probe opened the store breaker; no call reached it.
    assert_eq!(database.call_count(), 0);
    let breaker = server.state.breakers.get("database").unwrap();
    assert_eq!(breaker.status().state, CircuitState::Open);

    let res = client.get(server.url("/health")).send().await.unwrap();
    let health: Value = res.json().await.unwrap();
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["reason"], "database startup probe failed");
}

#[tokio::test]
async fn test_live_mode_wraps_real_data() {
    let rows = json!([{"id": "APP-5", "status": "submitted"}]);
    let database = common::start_mock_dependency(true, rows.clone()).await;
    let state = lifecycle::initialise(config_with(vec![database.config("database", true)]))
        .await
        .unwrap();
    assert!(!state.resilience.is_active());

    let server = common::start_server(state).await;
    let res = common::client().get(server.url("/applications")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(!res.headers().contains_key("x-demo-mode"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"], rows);
    assert_eq!(body["isDemo"], false);
    assert!(body["timestamp"].is_string());
    assert_eq!(database.call_count(), 1);
}

#[tokio::test]
async fn test_dependency_failure_propagates_while_live() {
    let database = common::start_mock_dependency(true, json!([])).await;
    let state = lifecycle::initialise(config_with(vec![database.config("database", true)]))
        .await
        .unwrap();
    let server = common::start_server(state).await;
    database.set_failing(true);

    let res = common::client().get(server.url("/applications")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"]["code"], "DEPENDENCY_ERROR");
    assert_eq!(body["isDemo"], false);
    assert!(!body.to_string().contains("db-primary"));

    // A request-level failure never switches demo mode on.
    assert!(!server.state.resilience.is_active());
}

#[tokio::test]
async fn test_forced_demo_mode_without_dependencies() {
    let mut config = AppConfig::default();
    config.resilience.force_demo_mode = true;
    let state = lifecycle::initialise(config).await.unwrap();
    assert_eq!(state.resilience.reason().as_deref(), Some("demo mode forced by configuration"));

    // No store configured: the handler fails internally and the envelope substitutes.
    let server = common::start_server(state).await;
    let res = common::client().get(server.url("/applications")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["isDemo"], true);
}

#[tokio::test]
async fn test_admin_controls_demo_mode() {
    let mut config = AppConfig::default();
    config.admin.enabled = true;
    config.admin.api_key = "test-admin-key".into();
    let state = lifecycle::initialise(config).await.unwrap();
    let server = common::start_server(state).await;
    let client = common::client();

    let res = client.get(server.url("/admin/status")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(server.url("/admin/resilience/activate"))
        .bearer_auth("test-admin-key")
        .json(&json!({"reason": "planned database maintenance"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["activated"], true);
    assert_eq!(body["reason"], "planned database maintenance");

    let res = client
        .post(server.url("/admin/resilience/activate"))
        .bearer_auth("test-admin-key")
        .json(&json!({"reason": "second reason"}))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["activated"], false);
    assert_eq!(body["reason"], "planned database maintenance");

    let res = client
        .get(server.url("/admin/status"))
        .bearer_auth("test-admin-key")
        .send()
        .await
        .unwrap();
    let status: Value = res.json().await.unwrap();
    assert_eq!(status["resilience"]["mode"], "DEGRADED");
    assert_eq!(status["sessions"]["total"], 0);

    let res = client
        .post(server.url("/admin/resilience/deactivate"))
        .bearer_auth("test-admin-key")
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["deactivated"], true);
    assert!(!server.state.resilience.is_active());
}
