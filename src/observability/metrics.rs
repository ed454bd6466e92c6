//! Metrics collection and exposition.
//!
//! # Metrics
//! - `resilience_demo_mode_active` (gauge): 1 while demo mode is on
//! - `resilience_breaker_transitions_total` (counter): by dependency, target state
//! - `resilience_breaker_rejections_total` (counter): fail-fast calls by dependency
//! - `resilience_dependency_call_duration_seconds` (histogram): by dependency, outcome
//! - `resilience_fallback_substitutions_total` (counter): by route pattern
//! - `resilience_sessions_created_total` (counter)
//! - `resilience_sessions_active` (gauge)
//! - `resilience_sessions_expired_total` (counter)
//!
//! Recording is a no-op until a recorder is installed, so library code and
//! tests can call these freely.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!(address = %addr, "Prometheus metrics exporter listening");
    Ok(())
}

pub fn record_demo_mode(active: bool) {
    gauge!("resilience_demo_mode_active").set(if active { 1.0 } else { 0.0 });
}

pub fn record_breaker_transition(dependency: &str, to: &'static str) {
    counter!(
        "resilience_breaker_transitions_total",
        "dependency" => dependency.to_string(),
        "to" => to
    )
    .increment(1);
}

pub fn record_breaker_rejection(dependency: &str) {
    counter!("resilience_breaker_rejections_total", "dependency" => dependency.to_string()).increment(1);
}

pub fn record_dependency_call(dependency: &str, outcome: &'static str, elapsed: Duration) {
    histogram!(
        "resilience_dependency_call_duration_seconds",
        "dependency" => dependency.to_string(),
        "outcome" => outcome
    )
    .record(elapsed.as_secs_f64());
}

pub fn record_fallback_substitution(method: &str) {
    counter!("resilience_fallback_substitutions_total", "method" => method.to_string()).increment(1);
}

pub fn record_session_created() {
    counter!("resilience_sessions_created_total").increment(1);
}

pub fn record_sessions_active(count: usize) {
    gauge!("resilience_sessions_active").set(count as f64);
}

pub fn record_sessions_expired(count: usize) {
    counter!("resilience_sessions_expired_total").increment(count as u64);
}
