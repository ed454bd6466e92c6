//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use lending_resilience::config::DependencyConfig;
use lending_resilience::lifecycle::Shutdown;
use lending_resilience::{AppState, HttpServer};

/// Switches and counters of a running mock dependency.
#[derive(Clone)]
pub struct MockDependency {
    pub addr: SocketAddr,
    pub healthy: Arc<AtomicBool>,
    pub failing: Arc<AtomicBool>,
    pub calls: Arc<AtomicU32>,
    body: Arc<Value>,
}

impl MockDependency {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn config(&self, name: &str, required: bool) -> DependencyConfig {
        DependencyConfig {
            name: name.to_string(),
            base_url: self.base_url(),
            call_path: "/call".to_string(),
            health_path: "/health".to_string(),
            required,
            breaker: None,
        }
    }
}

async fn mock_health(State(mock): State<MockDependency>) -> StatusCode {
    if mock.healthy.load(Ordering::SeqCst) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn mock_call(State(mock): State<MockDependency>) -> (StatusCode, Json<Value>) {
    mock.calls.fetch_add(1, Ordering::SeqCst);
    if mock.failing.load(Ordering::SeqCst) {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "connection pool exhausted at db-primary:5432"})),
        )
    } else {
        (StatusCode::OK, Json((*mock.body).clone()))
    }
}

/// Start a programmable JSON dependency on an ephemeral port.
///
/// `GET /health` answers 200 or 503; `POST /call` answers `body` or 500.
pub async fn start_mock_dependency(healthy: bool, body: Value) -> MockDependency {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mock = MockDependency {
        addr: listener.local_addr().unwrap(),
        healthy: Arc::new(AtomicBool::new(healthy)),
        failing: Arc::new(AtomicBool::new(false)),
        calls: Arc::new(AtomicU32::new(0)),
        body: Arc::new(body),
    };

    let app = Router::new()
        .route("/health", get(mock_health))
        .route("/call", post(mock_call))
        .with_state(mock.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    mock
}

/// A running service under test.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub state: AppState,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Serve `state` on an ephemeral port.
pub async fn start_server(state: AppState) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(state.clone());
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    TestServer {
        addr,
        shutdown,
        state,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
