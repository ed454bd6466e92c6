//! Resilience and fallback core for the lending CRM.
//!
//! Keeps the platform serving (with simulated data when it must) while its
//! store, cache or external services are unavailable, and shields those
//! dependencies with circuit breakers once they start failing.

pub mod admin;
pub mod config;
pub mod fallback;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod session;

pub use config::AppConfig;
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
