//! Demo session types.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Opaque demo session identifier, carried in `x-demo-session-id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Role the simulated user plays in the lending workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemoRole {
    Applicant,
    LoanOfficer,
    Underwriter,
    Admin,
}

/// One recorded step of a demo session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub action: String,
    #[serde(default)]
    pub details: Value,
    pub at: DateTime<Utc>,
}

impl Interaction {
    pub fn new(action: impl Into<String>, details: Value, at: DateTime<Utc>) -> Self {
        Self {
            action: action.into(),
            details,
            at,
        }
    }
}

/// A time-boxed, isolated demo context.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoSession {
    pub session_id: SessionId,
    pub user_role: DemoRole,
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub interactions: VecDeque<Interaction>,
    pub is_active: bool,
}

impl DemoSession {
    /// Valid iff active and not yet expired. Expiry is absolute.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now < self.expires_at
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Validity at `now`, latching the session inactive once it is seen
    /// expired. A clock stepping backwards cannot revive it afterwards.
    pub(crate) fn observe(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_active && self.is_expired_at(now) {
            self.is_active = false;
        }
        self.is_active
    }

    /// Append, dropping the oldest entries beyond `cap`.
    pub(crate) fn push_interaction(&mut self, interaction: Interaction, cap: usize) {
        self.interactions.push_back(interaction);
        while self.interactions.len() > cap {
            self.interactions.pop_front();
        }
    }
}

/// Errors from the session registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("demo session {0} not found")]
    NotFound(SessionId),

    #[error("demo session {0} has expired")]
    Expired(SessionId),

    #[error("session registry is closed")]
    Closed,
}

/// Source of wall-clock time for session expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock moved by hand, for tests and simulations.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
