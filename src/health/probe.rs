//! Startup health probes.
//!
//! # Responsibilities
//! - Probe every required dependency once, concurrently
//! - Bound each probe by the configured timeout
//! - Report results in a stable (name) order

use std::time::Duration;

use futures_util::future::join_all;
use tokio::time;

use crate::resilience::{DependencySet, GuardedClient};

/// Result of probing one dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub dependency: String,
    pub healthy: bool,
}

/// Probe one guarded client. Timeouts and breaker rejections are failures.
pub async fn probe(client: &GuardedClient, timeout: Duration) -> ProbeOutcome {
    let healthy = match time::timeout(timeout, client.health_check()).await {
        Ok(true) => true,
        Ok(false) => {
            tracing::warn!(dependency = %client.name(), "Startup probe failed");
            false
        }
        Err(_) => {
            tracing::warn!(
                dependency = %client.name(),
                timeout_ms = timeout.as_millis() as u64,
                "Startup probe failed: timeout"
            );
            false
        }
    };
    ProbeOutcome {
        dependency: client.name().to_string(),
        healthy,
    }
}

/// Probe every required dependency concurrently.
pub async fn probe_required(dependencies: &DependencySet, timeout: Duration) -> Vec<ProbeOutcome> {
    let outcomes = join_all(dependencies.required().map(|client| probe(client, timeout))).await;
    for outcome in &outcomes {
        if outcome.healthy {
            tracing::info!(dependency = %outcome.dependency, "Startup probe succeeded");
        }
    }
    outcomes
}
