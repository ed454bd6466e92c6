//! Client-facing error responses.
//!
//! Every error leaves as `{"error": {"code", "message", "details"}}` with a
//! stable code. Internal error text is logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;

use crate::resilience::DependencyError;
use crate::session::SessionError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Dependency(#[from] DependencyError),

    #[error(transparent)]
    Session(#[from] SessionError),

    /// Request failed validation. The message is returned verbatim.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("missing or invalid credentials")]
    Unauthorized,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Dependency(DependencyError::ServiceUnavailable { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Dependency(DependencyError::ServiceTimeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            Self::Dependency(DependencyError::ServiceError { .. }) => StatusCode::BAD_GATEWAY,
            Self::Session(SessionError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Session(SessionError::Expired(_)) => StatusCode::GONE,
            Self::Session(SessionError::Closed) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Dependency(DependencyError::ServiceUnavailable { .. }) => "SERVICE_UNAVAILABLE",
            Self::Dependency(DependencyError::ServiceTimeout { .. }) => "SERVICE_TIMEOUT",
            Self::Dependency(DependencyError::ServiceError { .. }) => "DEPENDENCY_ERROR",
            Self::Session(SessionError::NotFound(_)) => "SESSION_NOT_FOUND",
            Self::Session(SessionError::Expired(_)) => "SESSION_EXPIRED",
            Self::Session(SessionError::Closed) => "SESSIONS_CLOSED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::Dependency(DependencyError::ServiceUnavailable { .. }) => {
                "A required service is temporarily unavailable".to_string()
            }
            Self::Dependency(DependencyError::ServiceTimeout { .. }) => {
                "A required service did not respond in time".to_string()
            }
            Self::Dependency(DependencyError::ServiceError { .. }) => {
                "A required service returned an error".to_string()
            }
            Self::Session(SessionError::NotFound(_)) => "Demo session not found".to_string(),
            Self::Session(SessionError::Expired(_)) => "Demo session has expired".to_string(),
            Self::Session(SessionError::Closed) => "New demo sessions are not accepted".to_string(),
            Self::Validation(msg) => msg.clone(),
            Self::Unauthorized => "Missing or invalid credentials".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }

    fn details(&self) -> Value {
        match self {
            Self::Dependency(DependencyError::ServiceUnavailable { dependency, state }) => {
                json!({"dependency": dependency, "circuit": state})
            }
            Self::Dependency(e) => json!({"dependency": e.dependency()}),
            Self::Session(SessionError::NotFound(id) | SessionError::Expired(id)) => {
                json!({"sessionId": id})
            }
            _ => Value::Null,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Request failed");
        } else {
            tracing::debug!(code = self.code(), error = %self, "Request rejected");
        }

        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.public_message(),
                "details": self.details(),
            }
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::CircuitState;
    use crate::session::SessionId;

    async fn body_of(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_dependency_errors_map_to_stable_codes() {
        let (status, body) = body_of(ApiError::from(DependencyError::ServiceUnavailable {
            dependency: "database".into(),
            state: CircuitState::Open,
        }))
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
        assert_eq!(body["error"]["details"]["circuit"], "OPEN");

        let (status, body) = body_of(ApiError::from(DependencyError::ServiceTimeout {
            dependency: "llm".into(),
            timeout: std::time::Duration::from_secs(10),
        }))
        .await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["error"]["code"], "SERVICE_TIMEOUT");
    }

    #[tokio::test]
    async fn test_internal_text_is_not_leaked() {
        let err = ApiError::from(DependencyError::ServiceError {
            dependency: "database".into(),
            source: "password authentication failed for user lending".into(),
        });
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(!body.to_string().contains("password"));

        let (_, body) = body_of(ApiError::Internal("stack trace at main.rs:42".into())).await;
        assert_eq!(body["error"]["message"], "Internal server error");
        assert!(!body.to_string().contains("main.rs"));
    }

    #[tokio::test]
    async fn test_session_errors() {
        let id = SessionId::new();
        let (status, body) = body_of(ApiError::from(SessionError::Expired(id))).await;
        assert_eq!(status, StatusCode::GONE);
        assert_eq!(body["error"]["code"], "SESSION_EXPIRED");
        assert_eq!(body["error"]["details"]["sessionId"], id.to_string());
    }
}
