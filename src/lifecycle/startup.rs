//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the shared services from configuration
//! - Decide, once, whether the process serves live or demo data
//!
//! # Design Decisions
//! - A failed probe or startup step is recoverable: it activates demo mode
//! - Failing to activate demo mode is fatal; the caller must not serve
//! - Probe failures are reported in dependency-name order, so the recorded
//!   reason does not depend on which probe finished first

use thiserror::Error;

use crate::config::AppConfig;
use crate::health::probe_required;
use crate::http::server::AppState;
use crate::resilience::{Activation, DependencySet, Mode, ResilienceError};

pub const FORCED_REASON: &str = "demo mode forced by configuration";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to activate demo mode: {0}")]
    Activation(#[from] ResilienceError),
}

/// Build services and dependency clients, then decide the mode.
pub async fn initialise(config: AppConfig) -> Result<AppState, StartupError> {
    let state = AppState::new(config);

    match DependencySet::from_config(&state.config, &state.breakers) {
        Ok(dependencies) => {
            tracing::info!(
                dependencies = dependencies.len(),
                required = dependencies.required().count(),
                "Dependency clients ready"
            );
            let state = state.with_dependencies(dependencies);
            decide_mode(&state).await?;
            Ok(state)
        }
        Err(e) => {
            tracing::error!(error = %e, "Startup step failed");
            activate(&state, format!("startup sequence failed: {e}"))?;
            Ok(state)
        }
    }
}

/// Apply the configuration override or run the required-dependency probes.
pub async fn decide_mode(state: &AppState) -> Result<Mode, StartupError> {
    if state.config.resilience.force_demo_mode {
        activate(state, FORCED_REASON)?;
        return Ok(Mode::Degraded);
    }

    let outcomes = probe_required(&state.dependencies, state.config.resilience.probe_timeout()).await;
    if let Some(failed) = outcomes.iter().find(|o| !o.healthy) {
        activate(state, format!("{} startup probe failed", failed.dependency))?;
        return Ok(Mode::Degraded);
    }

    tracing::info!(probed = outcomes.len(), "Required dependencies healthy; serving live data");
    Ok(Mode::Live)
}

fn activate(state: &AppState, reason: impl Into<String>) -> Result<(), StartupError> {
    match state.resilience.activate(reason)? {
        Activation::Activated => {}
        Activation::AlreadyActive { reason } => {
            tracing::debug!(reason = %reason, "Demo mode was already active at startup");
        }
    }
    Ok(())
}
