//! Loan application reads, served through the primary store dependency.
//!
//! These handlers stand in for the CRM's application module: they only show
//! how a protected route reaches its store through a guarded client, and how
//! the resulting error becomes fallback data in demo mode.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::http::session::DemoContext;
use crate::resilience::GuardedClient;

/// Dependency name of the primary store.
pub const PRIMARY_STORE: &str = "database";

fn store(state: &AppState) -> Result<&GuardedClient, ApiError> {
    state
        .dependencies
        .get(PRIMARY_STORE)
        .ok_or_else(|| ApiError::Internal(format!("{PRIMARY_STORE} dependency is not configured")))
}

/// `GET /applications`
pub async fn list_applications(
    State(state): State<AppState>,
    context: DemoContext,
) -> Result<Json<Value>, ApiError> {
    let rows = store(&state)?
        .call(json!({
            "op": "list_applications",
            "sessionId": context.session_id(),
        }))
        .await?;
    Ok(Json(rows))
}

/// `GET /applications/{id}`
pub async fn get_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
    context: DemoContext,
) -> Result<Json<Value>, ApiError> {
    let row = store(&state)?
        .call(json!({
            "op": "get_application",
            "id": id,
            "sessionId": context.session_id(),
        }))
        .await?;
    Ok(Json(row))
}
