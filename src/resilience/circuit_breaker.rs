//! Circuit breaker for dependency protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: dependency assumed down, calls fail fast
//! - Half-Open: one trial call decides whether the dependency recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure ratio >= threshold within the rolling window
//! Open → Half-Open: first call admitted after the reset timeout
//! Half-Open → Closed: trial call succeeds
//! Half-Open → Open: trial call fails, times out, or is cancelled
//! ```
//!
//! # Design Decisions
//! - Per-dependency circuit breaker (not global)
//! - Fail fast in Open state (the wrapped call is never started)
//! - Single trial in Half-Open, gated by a compare-and-swap flag
//! - The decision lock is never held while the wrapped call runs
//! - Outcomes are tagged with the generation they were admitted in; results
//!   that arrive after a transition are discarded

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;

use crate::config::BreakerConfig;
use crate::observability::metrics;
use crate::resilience::error::{BoxError, DependencyError};
use crate::resilience::window::RollingWindow;

/// Breaker state.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed = 0,
    Open = 1,
    HalfOpen = 2,
}

impl From<u8> for CircuitState {
    fn from(val: u8) -> Self {
        match val {
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of a breaker for health reporting.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakerStatus {
    pub name: String,
    pub state: CircuitState,
    pub window_failures: u64,
    pub window_successes: u64,
    pub failure_ratio: f64,
    pub window_start: Option<DateTime<Utc>>,
    pub last_transition_at: DateTime<Utc>,
}

struct Inner {
    window: RollingWindow,
    opened_at: Option<Instant>,
    last_transition_at: DateTime<Utc>,
    generation: u64,
}

/// A named circuit breaker guarding one external call path.
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    /// Mirrors the state held under `inner`; lets readers skip the lock.
    state: AtomicU8,
    trial_in_flight: AtomicBool,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        let window = RollingWindow::new(config.rolling_window(), config.window_buckets);
        Self {
            name: name.into(),
            config,
            state: AtomicU8::new(CircuitState::Closed as u8),
            trial_in_flight: AtomicBool::new(false),
            inner: Mutex::new(Inner {
                window,
                opened_at: None,
                last_transition_at: Utc::now(),
                generation: 0,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// Effective state. An open breaker whose reset timeout has elapsed
    /// reports `HalfOpen`: the next call will be admitted as the trial.
    pub fn state(&self) -> CircuitState {
        let stored = CircuitState::from(self.state.load(Ordering::Acquire));
        if stored != CircuitState::Open {
            return stored;
        }
        let inner = self.inner.lock();
        self.effective_state(&inner, Instant::now())
    }

    /// Run `f` under the breaker.
    ///
    /// Fails fast with `ServiceUnavailable` when open (or when a trial is
    /// already running), enforces the configured timeout, and records the
    /// outcome in the rolling window.
    pub async fn execute<F, Fut, T, E>(&self, f: F) -> Result<T, DependencyError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<BoxError>,
    {
        let mut permit = self.admit()?;
        let started = Instant::now();

        match tokio::time::timeout(self.config.timeout(), f()).await {
            Ok(Ok(value)) => {
                permit.settle(true);
                metrics::record_dependency_call(&self.name, "success", started.elapsed());
                Ok(value)
            }
            Ok(Err(e)) => {
                permit.settle(false);
                metrics::record_dependency_call(&self.name, "error", started.elapsed());
                Err(DependencyError::ServiceError {
                    dependency: self.name.clone(),
                    source: e.into(),
                })
            }
            Err(_) => {
                permit.settle(false);
                metrics::record_dependency_call(&self.name, "timeout", started.elapsed());
                tracing::warn!(
                    dependency = %self.name,
                    timeout_ms = self.config.timeout_ms,
                    "Dependency call timed out"
                );
                Err(DependencyError::ServiceTimeout {
                    dependency: self.name.clone(),
                    timeout: self.config.timeout(),
                })
            }
        }
    }

    /// Snapshot for health reporting. Takes the decision lock briefly; never
    /// waits on an in-flight call.
    pub fn status(&self) -> BreakerStatus {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        let state = self.effective_state(&inner, now);
        let totals = inner.window.totals(now);
        let window_start = inner.window.oldest_start(now).map(|start| {
            let age = now.saturating_duration_since(start);
            Utc::now() - chrono::Duration::from_std(age).unwrap_or_else(|_| chrono::Duration::zero())
        });

        BreakerStatus {
            name: self.name.clone(),
            state,
            window_failures: totals.failures,
            window_successes: totals.successes,
            failure_ratio: totals.failure_ratio(),
            window_start,
            last_transition_at: inner.last_transition_at,
        }
    }

    fn effective_state(&self, inner: &Inner, now: Instant) -> CircuitState {
        let stored = CircuitState::from(self.state.load(Ordering::Acquire));
        if stored == CircuitState::Open && self.reset_elapsed(inner, now) {
            CircuitState::HalfOpen
        } else {
            stored
        }
    }

    fn reset_elapsed(&self, inner: &Inner, now: Instant) -> bool {
        inner
            .opened_at
            .map_or(true, |opened| now.saturating_duration_since(opened) >= self.config.reset_timeout())
    }

    fn admit(&self) -> Result<Permit<'_>, DependencyError> {
        let now = Instant::now();
        let mut inner = self.inner.lock();

        match CircuitState::from(self.state.load(Ordering::Acquire)) {
            CircuitState::Closed => Ok(Permit::new(self, inner.generation, false)),
            CircuitState::Open => {
                if self.reset_elapsed(&inner, now)
                    && self
                        .trial_in_flight
                        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                {
                    self.transition(&mut inner, CircuitState::HalfOpen);
                    Ok(Permit::new(self, inner.generation, true))
                } else {
                    Err(self.reject(CircuitState::Open))
                }
            }
            CircuitState::HalfOpen => Err(self.reject(CircuitState::HalfOpen)),
        }
    }

    fn reject(&self, state: CircuitState) -> DependencyError {
        tracing::debug!(dependency = %self.name, state = %state, "Call rejected by circuit breaker");
        metrics::record_breaker_rejection(&self.name);
        DependencyError::ServiceUnavailable {
            dependency: self.name.clone(),
            state,
        }
    }

    fn complete(&self, generation: u64, trial: bool, success: bool) {
        let now = Instant::now();
        let mut inner = self.inner.lock();

        if trial {
            self.trial_in_flight.store(false, Ordering::Release);
            if generation != inner.generation {
                return;
            }
            if success {
                inner.window.reset();
                self.transition(&mut inner, CircuitState::Closed);
            } else {
                inner.opened_at = Some(now);
                self.transition(&mut inner, CircuitState::Open);
            }
            return;
        }

        // Stale: the breaker moved on while this call was running.
        if generation != inner.generation {
            return;
        }

        if success {
            inner.window.record_success(now);
            return;
        }

        inner.window.record_failure(now);
        let totals = inner.window.totals(now);
        if totals.total() >= u64::from(self.config.minimum_calls)
            && totals.failure_ratio() >= self.config.failure_threshold_ratio
        {
            tracing::warn!(
                dependency = %self.name,
                failures = totals.failures,
                calls = totals.total(),
                ratio = totals.failure_ratio(),
                threshold = self.config.failure_threshold_ratio,
                "Failure threshold reached"
            );
            inner.opened_at = Some(now);
            self.transition(&mut inner, CircuitState::Open);
        }
    }

    /// Caller holds the decision lock.
    fn transition(&self, inner: &mut Inner, to: CircuitState) {
        let from = CircuitState::from(self.state.swap(to as u8, Ordering::AcqRel));
        inner.generation += 1;
        inner.last_transition_at = Utc::now();

        match to {
            CircuitState::Open => {
                tracing::warn!(dependency = %self.name, from = %from, to = %to, "Circuit breaker opened")
            }
            _ => tracing::info!(dependency = %self.name, from = %from, to = %to, "Circuit breaker transition"),
        }
        metrics::record_breaker_transition(&self.name, to.as_str());
    }
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("state", &CircuitState::from(self.state.load(Ordering::Relaxed)))
            .field("config", &self.config)
            .finish()
    }
}

/// Admission ticket for one call.
///
/// Dropping an unsettled trial permit (the caller was cancelled) counts as a
/// failed trial so the half-open slot is always released.
struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    trial: bool,
    settled: bool,
}

impl<'a> Permit<'a> {
    fn new(breaker: &'a CircuitBreaker, generation: u64, trial: bool) -> Self {
        Self {
            breaker,
            generation,
            trial,
            settled: false,
        }
    }

    fn settle(&mut self, success: bool) {
        self.settled = true;
        self.breaker.complete(self.generation, self.trial, success);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.trial {
            tracing::warn!(dependency = %self.breaker.name, "Trial call cancelled; reopening circuit");
            self.breaker.complete(self.generation, true, false);
        }
    }
}
