//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Hold the shared services (`AppState`) injected into every handler
//! - Create the Axum router with health, demo session, lending and admin routes
//! - Wire up middleware (envelope, session correlation, tracing, limits, request ID)
//! - Serve until the shutdown channel fires

use std::sync::Arc;
use std::time::Duration;

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::admin;
use crate::config::AppConfig;
use crate::fallback::{FallbackProvider, StaticFallbackProvider};
use crate::health;
use crate::http::{applications, envelope, handlers, session};
use crate::resilience::{BreakerRegistry, DependencySet, ResilienceState};
use crate::session::{Clock, SessionRegistry};

/// Shared services, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub resilience: Arc<ResilienceState>,
    pub breakers: Arc<BreakerRegistry>,
    pub sessions: Arc<SessionRegistry>,
    pub fallback: Arc<dyn FallbackProvider>,
    pub dependencies: Arc<DependencySet>,
}

impl AppState {
    /// Services for `config`, with the lending fallback catalogue and no
    /// dependency clients yet.
    pub fn new(config: AppConfig) -> Self {
        let breakers = config
            .dependencies
            .iter()
            .filter_map(|d| d.breaker.clone().map(|b| (d.name.clone(), b)))
            .fold(BreakerRegistry::new(config.breaker.clone()), |registry, (name, breaker)| {
                registry.with_override(name, breaker)
            });
        let sessions = SessionRegistry::new(&config.sessions);

        Self {
            config: Arc::new(config),
            resilience: Arc::new(ResilienceState::new()),
            breakers: Arc::new(breakers),
            sessions: Arc::new(sessions),
            fallback: Arc::new(StaticFallbackProvider::lending()),
            dependencies: Arc::new(DependencySet::new()),
        }
    }

    pub fn with_dependencies(mut self, dependencies: DependencySet) -> Self {
        self.dependencies = Arc::new(dependencies);
        self
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn FallbackProvider>) -> Self {
        self.fallback = fallback;
        self
    }

    /// Replace the session registry with one driven by `clock`.
    pub fn with_session_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.sessions = Arc::new(SessionRegistry::with_clock(&self.config.sessions, clock));
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("resilience", &self.resilience)
            .field("sessions", &self.sessions)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// HTTP server for the resilience core.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        Self {
            router: build_router(state),
        }
    }

    /// The assembled router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires, then drain.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server received shutdown signal");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let mut routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/status", get(health::health_status))
        .route("/demo/sessions", post(handlers::create_session))
        .route(
            "/demo/sessions/{id}",
            get(handlers::get_session).delete(handlers::end_session),
        )
        .route("/demo/sessions/{id}/interactions", post(handlers::record_interaction))
        .route("/applications", get(applications::list_applications))
        .route("/applications/{id}", get(applications::get_application));

    if config.admin.enabled {
        routes = routes.merge(admin::router(state.clone()));
    } else {
        tracing::debug!("Admin API disabled");
    }

    // Layers run outside-in: envelope sees the response after session correlation.
    routes
        .layer(from_fn_with_state(state.clone(), session::session_middleware))
        .layer(from_fn_with_state(state.clone(), envelope::envelope_middleware))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(RequestBodyLimitLayer::new(config.envelope.max_body_bytes))
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
        )
}
