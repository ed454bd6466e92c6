//! Admin endpoints: status, breakers, sessions, manual demo-mode control.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::health::StatusReport;
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::resilience::{Activation, BreakerStatus};
use crate::session::SessionSummary;

#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    pub reason: String,
}

pub async fn get_status(State(state): State<AppState>) -> Json<StatusReport> {
    Json(StatusReport::collect(&state))
}

pub async fn get_breakers(State(state): State<AppState>) -> Json<Vec<BreakerStatus>> {
    Json(state.breakers.statuses())
}

pub async fn get_sessions(State(state): State<AppState>) -> Json<Value> {
    let SessionSummary { total, valid } = state.sessions.summary();
    Json(json!({
        "total": total,
        "valid": valid,
        "expired": total - valid,
        "acceptingNew": !state.sessions.is_closed(),
    }))
}

pub async fn activate(
    State(state): State<AppState>,
    payload: Result<Json<ActivateRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    let outcome = state
        .resilience
        .activate(request.reason)
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let activated = matches!(outcome, Activation::Activated);
    Ok(Json(json!({
        "activated": activated,
        "demoMode": true,
        "reason": state.resilience.reason(),
    })))
}

pub async fn deactivate(State(state): State<AppState>) -> Json<Value> {
    let deactivated = state.resilience.deactivate();
    Json(json!({
        "deactivated": deactivated,
        "demoMode": state.resilience.is_active(),
    }))
}
