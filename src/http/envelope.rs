//! Response envelope middleware.
//!
//! # Responsibilities
//! - Wrap successful JSON bodies as `{data, isDemo, timestamp}`
//! - Add `isDemo` to JSON error bodies without changing their shape
//! - While demo mode is active, replace 5xx responses with the route's
//!   fallback payload (200, `isDemo: true`)
//! - Set `X-Demo-Mode` headers whenever demo mode is active
//!
//! # Design Decisions
//! - The rewriting rules are pure functions over `serde_json::Value`; the
//!   middleware only buffers bodies and applies them
//! - Bodies that already carry `isDemo` pass through untouched
//! - Non-JSON bodies, exempt paths and bodies larger than
//!   `envelope.max_body_bytes` (or of unknown length) are never rewritten
//! - Fallback lookup matches the request path against the descriptor
//!   patterns, so `/applications/42` and `/applications/43` resolve to the
//!   same descriptor
//! - A 5xx never changes the global demo-mode state

use axum::body::{Body, Bytes, HttpBody};
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;

pub const X_DEMO_MODE: &str = "x-demo-mode";
pub const X_DEMO_MODE_MESSAGE: &str = "x-demo-mode-message";

const IS_DEMO: &str = "isDemo";

fn timestamp(now: DateTime<Utc>) -> Value {
    Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// True when the body was already produced by the envelope.
pub fn is_enveloped(body: &Value) -> bool {
    body.as_object().is_some_and(|o| o.contains_key(IS_DEMO))
}

/// Wrap a successful body. Idempotent.
pub fn wrap_body(body: Value, is_demo: bool, now: DateTime<Utc>) -> Value {
    if is_enveloped(&body) {
        return body;
    }
    let mut map = Map::with_capacity(3);
    map.insert("data".into(), body);
    map.insert(IS_DEMO.into(), Value::Bool(is_demo));
    map.insert("timestamp".into(), timestamp(now));
    Value::Object(map)
}

/// Add `isDemo` to an error body. Non-object bodies are returned as-is.
pub fn annotate_error(mut body: Value, is_demo: bool) -> Value {
    if let Value::Object(map) = &mut body {
        map.entry(IS_DEMO).or_insert(Value::Bool(is_demo));
    }
    body
}

/// Body returned in place of a failed response.
pub fn fallback_body(data: Value, message: &str, now: DateTime<Utc>) -> Value {
    let mut map = Map::with_capacity(4);
    map.insert("data".into(), data);
    map.insert(IS_DEMO.into(), Value::Bool(true));
    map.insert("message".into(), Value::String(message.to_string()));
    map.insert("timestamp".into(), timestamp(now));
    Value::Object(map)
}

/// `path` equals an exempt prefix or sits below it.
pub fn is_exempt(path: &str, exempt: &[String]) -> bool {
    exempt.iter().any(|prefix| {
        let prefix = prefix.trim_end_matches('/');
        path == prefix
            || path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| {
            let mime = mime.trim();
            mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

fn set_demo_headers(headers: &mut HeaderMap, message: &str) {
    headers.insert(X_DEMO_MODE, HeaderValue::from_static("true"));
    match HeaderValue::from_str(message) {
        Ok(value) => {
            headers.insert(X_DEMO_MODE_MESSAGE, value);
        }
        Err(_) => {
            tracing::warn!("Demo message is not a valid header value; header omitted");
        }
    }
}

/// Envelope stage, installed with `middleware::from_fn_with_state`.
pub async fn envelope_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let config = &state.config;
    let path = request.uri().path().to_string();
    if is_exempt(&path, &config.envelope.exempt_paths) {
        let mut response = next.run(request).await;
        if state.resilience.is_active() {
            set_demo_headers(response.headers_mut(), &config.resilience.demo_message);
        }
        return response;
    }

    let method = request.method().clone();
    let response = next.run(request).await;
    let active = state.resilience.is_active();
    let message = config.resilience.demo_message.as_str();

    if active && response.status().is_server_error() {
        if let Some(data) = state.fallback.fallback_for(&path, &method) {
            metrics::record_fallback_substitution(method.as_str());
            tracing::info!(
                method = %method,
                path = %path,
                original_status = response.status().as_u16(),
                "Substituted fallback data for failed response"
            );
            let mut substituted = (StatusCode::OK, Json(fallback_body(data, message, Utc::now()))).into_response();
            set_demo_headers(substituted.headers_mut(), message);
            return substituted;
        }
        tracing::debug!(method = %method, path = %path, "No fallback registered; keeping original error");
    }

    let mut response = rewrite(response, active, config.envelope.max_body_bytes).await;
    if active {
        set_demo_headers(response.headers_mut(), message);
    }
    response
}

async fn rewrite(response: Response, active: bool, limit: usize) -> Response {
    if !is_json(response.headers()) {
        return response;
    }
    match response.body().size_hint().upper() {
        Some(len) if len <= limit as u64 => {}
        len => {
            tracing::debug!(
                body_bytes = ?len,
                limit,
                "Response body too large to buffer; passing through unwrapped"
            );
            return response;
        }
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return ApiError::Internal(format!("response body not buffered: {e}")).into_response();
        }
    };

    let value: Value = match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(_) => return Response::from_parts(parts, Body::from(bytes)),
    };

    let rewritten = if parts.status.is_client_error() || parts.status.is_server_error() {
        annotate_error(value, active)
    } else {
        wrap_body(value, active, Utc::now())
    };

    match serde_json::to_vec(&rewritten) {
        Ok(encoded) => {
            parts.headers.remove(header::CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(Bytes::from(encoded)))
        }
        Err(e) => ApiError::Internal(format!("envelope encoding failed: {e}")).into_response(),
    }
}
