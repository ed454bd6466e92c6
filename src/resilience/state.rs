//! Process-wide demo-mode state.
//!
//! # Responsibilities
//! - Record whether the service serves live or simulated data, and why
//! - Publish changes to observers (health reporting, metrics)
//!
//! # Design Decisions
//! - Readers load an immutable `Arc` snapshot through `ArcSwap`: no lock,
//!   never a half-written value
//! - Writers serialize on a mutex; activation happens a handful of times per
//!   process lifetime at most
//! - Activation is sticky: only an explicit `deactivate` returns to live mode,
//!   and re-activating keeps the first reason

use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;

use crate::observability::metrics;
use crate::resilience::error::ResilienceError;

/// Whether responses come from live dependencies or simulated data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    Live,
    Degraded,
}

/// Immutable view of the resilience state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResilienceSnapshot {
    pub mode: Mode,
    pub reason: Option<String>,
    pub activated_at: Option<DateTime<Utc>>,
}

impl ResilienceSnapshot {
    fn live() -> Self {
        Self {
            mode: Mode::Live,
            reason: None,
            activated_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.mode == Mode::Degraded
    }
}

/// Result of an `activate` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// Switched from live to demo mode.
    Activated,
    /// Already in demo mode; the original reason is kept.
    AlreadyActive { reason: String },
}

/// Process-wide live/degraded flag.
pub struct ResilienceState {
    current: ArcSwap<ResilienceSnapshot>,
    write_lock: Mutex<()>,
    changes: watch::Sender<Arc<ResilienceSnapshot>>,
}

impl ResilienceState {
    pub fn new() -> Self {
        let initial = Arc::new(ResilienceSnapshot::live());
        let (changes, _) = watch::channel(initial.clone());
        Self {
            current: ArcSwap::new(initial),
            write_lock: Mutex::new(()),
            changes,
        }
    }

    /// Switch to demo mode.
    pub fn activate(&self, reason: impl Into<String>) -> Result<Activation, ResilienceError> {
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(ResilienceError::EmptyReason);
        }

        let _guard = self.write_lock.lock();
        let current = self.current.load_full();
        if current.is_active() {
            let existing = current.reason.clone().unwrap_or_default();
            tracing::debug!(reason = %reason, existing = %existing, "Demo mode already active");
            return Ok(Activation::AlreadyActive { reason: existing });
        }

        let next = Arc::new(ResilienceSnapshot {
            mode: Mode::Degraded,
            reason: Some(reason.clone()),
            activated_at: Some(Utc::now()),
        });
        self.publish(next);

        tracing::warn!(reason = %reason, "Demo mode activated; serving simulated data");
        Ok(Activation::Activated)
    }

    /// Return to live mode. Returns false when already live.
    pub fn deactivate(&self) -> bool {
        let _guard = self.write_lock.lock();
        let current = self.current.load_full();
        if !current.is_active() {
            return false;
        }

        self.publish(Arc::new(ResilienceSnapshot::live()));
        tracing::info!(
            previous_reason = current.reason.as_deref().unwrap_or_default(),
            "Demo mode deactivated by operator"
        );
        true
    }

    pub fn is_active(&self) -> bool {
        self.current.load().is_active()
    }

    pub fn reason(&self) -> Option<String> {
        self.current.load().reason.clone()
    }

    /// Consistent view of mode, reason and activation time.
    pub fn snapshot(&self) -> Arc<ResilienceSnapshot> {
        self.current.load_full()
    }

    /// Observe future changes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<ResilienceSnapshot>> {
        self.changes.subscribe()
    }

    /// Caller holds `write_lock`.
    fn publish(&self, next: Arc<ResilienceSnapshot>) {
        self.current.store(next.clone());
        metrics::record_demo_mode(next.is_active());
        self.changes.send_replace(next);
    }
}

impl Default for ResilienceState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ResilienceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilienceState")
            .field("current", &self.current.load())
            .finish()
    }
}
