//! Demo session endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::session::{DemoRole, DemoSession, Interaction, SessionId};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub user_role: DemoRole,
}

#[derive(Debug, Deserialize)]
pub struct InteractionRequest {
    pub action: String,
    #[serde(default)]
    pub details: Value,
}

fn parse_id(raw: &str) -> Result<SessionId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::Validation(format!("'{raw}' is not a valid session id")))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(inner)| inner)
        .map_err(|e| ApiError::Validation(e.body_text()))
}

/// `POST /demo/sessions`
pub async fn create_session(
    State(state): State<AppState>,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = body(payload)?;
    let (id, expires_at) = state.sessions.create(request.user_role)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({"sessionId": id, "expiresAt": expires_at})),
    ))
}

/// `GET /demo/sessions/{id}`
pub async fn get_session(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<DemoSession>, ApiError> {
    let id = parse_id(&raw)?;
    Ok(Json(state.sessions.get(id)?))
}

/// `DELETE /demo/sessions/{id}`
pub async fn end_session(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&raw)?;
    let ended = state.sessions.end(id)?;
    Ok(Json(json!({
        "sessionId": ended.session_id,
        "interactions": ended.interactions.len(),
        "ended": true,
    })))
}

/// `POST /demo/sessions/{id}/interactions`
pub async fn record_interaction(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    payload: Result<Json<InteractionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&raw)?;
    let request = body(payload)?;
    if request.action.trim().is_empty() {
        return Err(ApiError::Validation("action must not be empty".into()));
    }

    let interaction = Interaction::new(request.action, request.details, state.sessions.now());
    state.sessions.record_interaction(id, interaction)?;
    Ok((StatusCode::CREATED, Json(json!({"sessionId": id, "recorded": true}))))
}
