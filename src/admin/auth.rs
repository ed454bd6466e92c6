//! Bearer-token guard for the admin API.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::http::error::ApiError;
use crate::http::server::AppState;

pub async fn admin_auth_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let expected = &state.config.admin.api_key;
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == expected.as_str());

    if authorized {
        next.run(request).await
    } else {
        tracing::warn!(path = %request.uri().path(), "Rejected admin request");
        ApiError::Unauthorized.into_response()
    }
}
