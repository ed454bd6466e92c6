//! Demo session correlation.
//!
//! Reads `x-demo-session-id`, records the request against a valid session,
//! and attaches a [`DemoContext`] extension for handlers. Requests to the
//! session endpoints themselves are not recorded; those handlers write the
//! session directly. A missing, malformed,
//! unknown or expired id falls back to the anonymous context; the request is
//! never rejected here.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use serde_json::json;

use crate::http::server::AppState;
use crate::session::{DemoRole, Interaction, SessionId, SessionRegistry};

pub const X_DEMO_SESSION_ID: &str = "x-demo-session-id";

const SESSION_ROUTES: &str = "/demo/sessions";

/// Demo context a request runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoContext {
    Anonymous,
    Session { id: SessionId, role: DemoRole },
}

impl DemoContext {
    pub fn session_id(&self) -> Option<SessionId> {
        match self {
            DemoContext::Anonymous => None,
            DemoContext::Session { id, .. } => Some(*id),
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for DemoContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<DemoContext>()
            .copied()
            .unwrap_or(DemoContext::Anonymous))
    }
}

pub async fn session_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let context = resolve(
        &state.sessions,
        request.headers(),
        request.method().as_str(),
        request.uri().path(),
    );
    request.extensions_mut().insert(context);
    next.run(request).await
}

fn resolve(sessions: &SessionRegistry, headers: &HeaderMap, method: &str, path: &str) -> DemoContext {
    let Some(raw) = headers.get(X_DEMO_SESSION_ID) else {
        return DemoContext::Anonymous;
    };
    let Some(id) = raw.to_str().ok().and_then(|s| s.parse::<SessionId>().ok()) else {
        tracing::debug!("Malformed demo session header; using anonymous context");
        return DemoContext::Anonymous;
    };

    if !is_session_route(path) {
        let interaction = Interaction::new("request", json!({"method": method, "path": path}), sessions.now());
        if let Err(e) = sessions.record_interaction(id, interaction) {
            tracing::debug!(session_id = %id, error = %e, "Demo session not usable; using anonymous context");
            return DemoContext::Anonymous;
        }
    }

    match sessions.get(id) {
        Ok(session) if session.is_active => DemoContext::Session {
            id,
            role: session.user_role,
        },
        _ => DemoContext::Anonymous,
    }
}

fn is_session_route(path: &str) -> bool {
    path.strip_prefix(SESSION_ROUTES)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
