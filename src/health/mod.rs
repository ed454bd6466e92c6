//! Health subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (probe.rs):
//!     Required dependencies → concurrent guarded health checks
//!     → first failure activates demo mode (lifecycle/startup.rs)
//!
//! Runtime (status.rs):
//!     GET /health, GET /health/status
//!     → resilience snapshot + breaker statuses + session counts
//! ```
//!
//! # Design Decisions
//! - Probes run once at boot; a later healthy dependency never switches
//!   demo mode off
//! - Status reads never block in-flight dependency calls

pub mod probe;
pub mod status;

pub use probe::{probe, probe_required, ProbeOutcome};
pub use status::{health, health_status, HealthResponse, StatusReport};
