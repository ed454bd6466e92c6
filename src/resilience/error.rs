//! Dependency error taxonomy.

use std::time::Duration;

use thiserror::Error;

use crate::resilience::circuit_breaker::CircuitState;

/// Boxed error returned by the wrapped call.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a breaker-guarded call did not produce a value.
#[derive(Debug, Error)]
pub enum DependencyError {
    /// Breaker rejected the call; the wrapped function was not invoked.
    #[error("{dependency} unavailable: circuit {state}")]
    ServiceUnavailable {
        dependency: String,
        state: CircuitState,
    },

    /// Call exceeded the breaker timeout. Counted as a failure.
    #[error("{dependency} timed out after {}ms", .timeout.as_millis())]
    ServiceTimeout {
        dependency: String,
        timeout: Duration,
    },

    /// Call ran and failed. Counted as a failure.
    #[error("{dependency} call failed: {source}")]
    ServiceError {
        dependency: String,
        #[source]
        source: BoxError,
    },
}

impl DependencyError {
    /// Name of the dependency that produced the error.
    pub fn dependency(&self) -> &str {
        match self {
            Self::ServiceUnavailable { dependency, .. }
            | Self::ServiceTimeout { dependency, .. }
            | Self::ServiceError { dependency, .. } => dependency,
        }
    }

    /// True when the breaker short-circuited the call.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::ServiceUnavailable { .. })
    }
}

/// Errors raised by the process-wide resilience state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResilienceError {
    #[error("activation reason must not be empty")]
    EmptyReason,
}
