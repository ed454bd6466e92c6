//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the resilience core.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Request timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Demo-mode activation settings.
    pub resilience: ResilienceConfig,

    /// Default circuit breaker settings applied to every dependency.
    pub breaker: BreakerConfig,

    /// External dependencies guarded by circuit breakers.
    pub dependencies: Vec<DependencyConfig>,

    /// Demo session settings.
    pub sessions: SessionConfig,

    /// Expired-session cleanup settings.
    pub cleanup: CleanupConfig,

    /// Response envelope settings.
    pub envelope: EnvelopeConfig,

    /// Graceful shutdown settings.
    pub shutdown: ShutdownConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

impl AppConfig {
    /// Breaker settings for a named dependency, falling back to the defaults.
    pub fn breaker_for(&self, dependency: &str) -> BreakerConfig {
        self.dependencies
            .iter()
            .find(|d| d.name == dependency)
            .and_then(|d| d.breaker.clone())
            .unwrap_or_else(|| self.breaker.clone())
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Demo-mode activation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Start in demo mode regardless of probe results.
    pub force_demo_mode: bool,

    /// Value of the `X-Demo-Mode-Message` response header.
    pub demo_message: String,

    /// Upper bound for each startup health probe in milliseconds.
    pub probe_timeout_ms: u64,
}

impl ResilienceConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            force_demo_mode: false,
            demo_message: "Service is running in demo mode with simulated data".to_string(),
            probe_timeout_ms: 3000,
        }
    }
}

/// Circuit breaker tuning.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Per-call timeout in milliseconds. Exceeding it counts as a failure.
    pub timeout_ms: u64,

    /// Failure ratio (0.0, 1.0] at which the breaker opens.
    pub failure_threshold_ratio: f64,

    /// Rolling window span in milliseconds.
    pub rolling_window_ms: u64,

    /// Number of buckets the rolling window is split into.
    pub window_buckets: u32,

    /// Time spent open before a trial call is admitted, in milliseconds.
    pub reset_timeout_ms: u64,

    /// Calls required in the window before the ratio is evaluated.
    pub minimum_calls: u32,
}

impl BreakerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn rolling_window(&self) -> Duration {
        Duration::from_millis(self.rolling_window_ms)
    }

    pub fn reset_timeout(&self) -> Duration {
        Duration::from_millis(self.reset_timeout_ms)
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            failure_threshold_ratio: 0.5,
            rolling_window_ms: 10_000,
            window_buckets: 10,
            reset_timeout_ms: 30_000,
            minimum_calls: 1,
        }
    }
}

/// An external dependency reached over HTTP.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DependencyConfig {
    /// Dependency name ("database", "cache", "document_ai", ...).
    pub name: String,

    /// Base URL, e.g. "http://127.0.0.1:7001".
    pub base_url: String,

    /// Path that `call` posts JSON to.
    #[serde(default = "default_call_path")]
    pub call_path: String,

    /// Path that `health_check` probes.
    #[serde(default = "default_health_path")]
    pub health_path: String,

    /// A failed startup probe against a required dependency activates demo mode.
    #[serde(default)]
    pub required: bool,

    /// Per-dependency breaker override.
    #[serde(default)]
    pub breaker: Option<BreakerConfig>,
}

fn default_call_path() -> String {
    "/".to_string()
}

fn default_health_path() -> String {
    "/health".to_string()
}

/// Demo session settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Absolute session lifetime in seconds.
    pub ttl_secs: u64,

    /// Maximum interactions retained per session.
    pub max_interactions: usize,
}

impl SessionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 30 * 60,
            max_interactions: 100,
        }
    }
}

/// Expired-session cleanup settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Sweep interval in seconds.
    pub interval_secs: u64,

    /// Sessions removed per batch before yielding.
    pub batch_size: usize,
}

impl CleanupConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            batch_size: 256,
        }
    }
}

/// Response envelope settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// Path prefixes whose responses keep their own shape.
    pub exempt_paths: Vec<String>,

    /// Largest request body accepted, and largest response body the envelope
    /// will buffer and rewrite. Larger responses pass through unwrapped.
    pub max_body_bytes: usize,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            exempt_paths: vec!["/health".to_string(), "/admin".to_string()],
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Graceful shutdown settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Time in-flight requests get to finish after a shutdown signal.
    pub grace_period_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Mount the admin routes.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

/// Shipped admin key. Validation refuses it once the admin API is enabled.
pub const PLACEHOLDER_API_KEY: &str = "CHANGE_ME_IN_PRODUCTION";

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: PLACEHOLDER_API_KEY.to_string(),
        }
    }
}
