//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Resilience state, breakers, sessions, envelope:
//!     → logging.rs (tracing subscriber, EnvFilter)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout log lines
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;
