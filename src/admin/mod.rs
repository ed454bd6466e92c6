//! Operator API.
//!
//! Mounted only when `admin.enabled`; every route requires
//! `Authorization: Bearer <admin.api_key>`.

pub mod auth;
pub mod handlers;

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;

use crate::http::server::AppState;
use self::auth::admin_auth_middleware;
use self::handlers::*;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/breakers", get(get_breakers))
        .route("/admin/sessions", get(get_sessions))
        .route("/admin/resilience/activate", post(activate))
        .route("/admin/resilience/deactivate", post(deactivate))
        .route_layer(from_fn_with_state(state, admin_auth_middleware))
}
