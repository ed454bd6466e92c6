//! Health and status reporting.
//!
//! Read-only: nothing here changes resilience, breaker or session state.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::http::server::AppState;
use crate::resilience::{BreakerStatus, ResilienceSnapshot};
use crate::session::SessionSummary;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub demo_mode: bool,
    pub reason: Option<String>,
}

/// Full status for dashboards and the operator CLI.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub version: &'static str,
    pub resilience: ResilienceSnapshot,
    pub breakers: Vec<BreakerStatus>,
    pub sessions: SessionSummary,
}

impl StatusReport {
    pub fn collect(state: &AppState) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            resilience: (*state.resilience.snapshot()).clone(),
            breakers: state.breakers.statuses(),
            sessions: state.sessions.summary(),
        }
    }
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.resilience.snapshot();
    Json(HealthResponse {
        status: if snapshot.is_active() { "degraded" } else { "ok" },
        demo_mode: snapshot.is_active(),
        reason: snapshot.reason.clone(),
    })
}

/// `GET /health/status`
pub async fn health_status(State(state): State<AppState>) -> Json<StatusReport> {
    Json(StatusReport::collect(&state))
}
