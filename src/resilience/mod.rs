//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Handler calls a dependency:
//!     → client.rs (GuardedClient: name → breaker)
//!     → circuit_breaker.rs (admit / fail fast, enforce timeout)
//!     → window.rs (record outcome, evaluate failure ratio)
//!     → DependencyError on rejection, timeout or failure
//!
//! Startup / operator:
//!     → state.rs (activate / deactivate demo mode)
//!     → readers on every request (lock-free snapshot)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Circuit breaker prevents cascading failures
//! - Demo mode is decided at the infrastructure level, never per request

pub mod circuit_breaker;
pub mod client;
pub mod error;
pub mod registry;
pub mod state;
pub mod window;

pub use circuit_breaker::{BreakerStatus, CircuitBreaker, CircuitState};
pub use client::{ClientError, DependencySet, ExternalClient, GuardedClient, HttpDependency};
pub use error::{DependencyError, ResilienceError};
pub use registry::BreakerRegistry;
pub use state::{Activation, Mode, ResilienceSnapshot, ResilienceState};
