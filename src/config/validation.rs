//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ratios in range)
//! - Check dependency names are unique and URLs parse
//! - Refuse an enabled admin API without a real key
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;

use crate::config::schema::{AppConfig, BreakerConfig, PLACEHOLDER_API_KEY};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field}: must be greater than zero")]
    Zero { field: String },

    #[error("{field}: failure threshold ratio {value} must be in (0.0, 1.0]")]
    ThresholdOutOfRange { field: String, value: f64 },

    #[error("{field}: invalid address '{value}'")]
    InvalidAddress { field: String, value: String },

    #[error("{field}: invalid URL '{value}'")]
    InvalidUrl { field: String, value: String },

    #[error("dependencies: duplicate dependency name '{0}'")]
    DuplicateDependency(String),

    #[error("dependencies: dependency name must not be empty")]
    EmptyDependencyName,

    #[error("resilience.demo_message: not a valid header value")]
    InvalidDemoMessage,

    #[error("admin.api_key: must be set to a non-default value when the admin API is enabled")]
    AdminKeyNotSet,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address".into(),
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address".into(),
            value: config.observability.metrics_address.clone(),
        });
    }

    require_positive(&mut errors, "timeouts.request_secs", config.timeouts.request_secs);
    require_positive(&mut errors, "resilience.probe_timeout_ms", config.resilience.probe_timeout_ms);
    require_positive(&mut errors, "sessions.ttl_secs", config.sessions.ttl_secs);
    require_positive(&mut errors, "sessions.max_interactions", config.sessions.max_interactions as u64);
    require_positive(&mut errors, "cleanup.interval_secs", config.cleanup.interval_secs);
    require_positive(&mut errors, "cleanup.batch_size", config.cleanup.batch_size as u64);
    require_positive(&mut errors, "envelope.max_body_bytes", config.envelope.max_body_bytes as u64);

    if HeaderValue::from_str(&config.resilience.demo_message).is_err() {
        errors.push(ValidationError::InvalidDemoMessage);
    }

    if config.admin.enabled {
        let key = config.admin.api_key.trim();
        if key.is_empty() || key == PLACEHOLDER_API_KEY {
            errors.push(ValidationError::AdminKeyNotSet);
        }
    }

    validate_breaker(&mut errors, "breaker", &config.breaker);

    let mut seen = HashSet::new();
    for dep in &config.dependencies {
        if dep.name.trim().is_empty() {
            errors.push(ValidationError::EmptyDependencyName);
            continue;
        }
        if !seen.insert(dep.name.as_str()) {
            errors.push(ValidationError::DuplicateDependency(dep.name.clone()));
        }
        if url::Url::parse(&dep.base_url).is_err() {
            errors.push(ValidationError::InvalidUrl {
                field: format!("dependencies.{}.base_url", dep.name),
                value: dep.base_url.clone(),
            });
        }
        if let Some(breaker) = &dep.breaker {
            validate_breaker(&mut errors, &format!("dependencies.{}.breaker", dep.name), breaker);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_breaker(errors: &mut Vec<ValidationError>, prefix: &str, breaker: &BreakerConfig) {
    let ratio = breaker.failure_threshold_ratio;
    if !(ratio > 0.0 && ratio <= 1.0) {
        errors.push(ValidationError::ThresholdOutOfRange {
            field: format!("{prefix}.failure_threshold_ratio"),
            value: ratio,
        });
    }
    require_positive(errors, &format!("{prefix}.timeout_ms"), breaker.timeout_ms);
    require_positive(errors, &format!("{prefix}.rolling_window_ms"), breaker.rolling_window_ms);
    require_positive(errors, &format!("{prefix}.window_buckets"), breaker.window_buckets as u64);
    require_positive(errors, &format!("{prefix}.reset_timeout_ms"), breaker.reset_timeout_ms);
}

fn require_positive(errors: &mut Vec<ValidationError>, field: &str, value: u64) {
    if value == 0 {
        errors.push(ValidationError::Zero { field: field.to_string() });
    }
}
