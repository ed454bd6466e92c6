//! Demo session store.
//!
//! # Responsibilities
//! - Create time-boxed sessions with an absolute expiry
//! - Track activity and a bounded interaction history per session
//! - Remove expired sessions in bounded batches for the cleanup scheduler
//!
//! # Design Decisions
//! - `DashMap` shards the map; every operation locks one shard briefly
//! - `touch` never extends `expires_at`
//! - An expired session found on access is marked inactive, so validity
//!   can only go from true to false
//! - Once closed (shutdown), the registry refuses new sessions

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

use crate::config::SessionConfig;
use crate::observability::metrics;
use crate::session::model::{
    Clock, DemoRole, DemoSession, Interaction, SessionError, SessionId, SystemClock,
};

/// Counts for health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub total: usize,
    pub valid: usize,
}

/// Concurrent registry of demo sessions.
pub struct SessionRegistry {
    sessions: DashMap<SessionId, DemoSession>,
    ttl: chrono::Duration,
    max_interactions: usize,
    closed: AtomicBool,
    clock: Arc<dyn Clock>,
}

impl SessionRegistry {
    pub fn new(config: &SessionConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &SessionConfig, clock: Arc<dyn Clock>) -> Self {
        let ttl = chrono::Duration::from_std(config.ttl()).unwrap_or_else(|_| chrono::Duration::minutes(30));
        Self {
            sessions: DashMap::new(),
            ttl,
            max_interactions: config.max_interactions.max(1),
            closed: AtomicBool::new(false),
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Start a session. Returns its id and absolute expiry.
    pub fn create(&self, role: DemoRole) -> Result<(SessionId, DateTime<Utc>), SessionError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SessionError::Closed);
        }

        let now = self.clock.now();
        let id = SessionId::new();
        let expires_at = now + self.ttl;
        self.sessions.insert(
            id,
            DemoSession {
                session_id: id,
                user_role: role,
                started_at: now,
                expires_at,
                last_activity_at: now,
                interactions: VecDeque::new(),
                is_active: true,
            },
        );

        metrics::record_session_created();
        metrics::record_sessions_active(self.sessions.len());
        tracing::info!(session_id = %id, role = ?role, expires_at = %expires_at, "Demo session created");
        Ok((id, expires_at))
    }

    /// Record activity without extending the expiry.
    pub fn touch(&self, id: SessionId) -> Result<(), SessionError> {
        self.with_valid(id, |session, now| {
            session.last_activity_at = now;
        })
    }

    /// Append to the session's bounded interaction history.
    pub fn record_interaction(&self, id: SessionId, interaction: Interaction) -> Result<(), SessionError> {
        let cap = self.max_interactions;
        self.with_valid(id, move |session, now| {
            session.last_activity_at = now;
            session.push_interaction(interaction, cap);
        })
    }

    pub fn is_valid(&self, id: SessionId) -> bool {
        let now = self.clock.now();
        self.sessions
            .get_mut(&id)
            .map(|mut s| s.observe(now))
            .unwrap_or(false)
    }

    /// Copy of the session, whether or not it is still valid.
    pub fn get(&self, id: SessionId) -> Result<DemoSession, SessionError> {
        let now = self.clock.now();
        let mut entry = self.sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        entry.observe(now);
        Ok(entry.value().clone())
    }

    /// Terminate and remove a session.
    pub fn end(&self, id: SessionId) -> Result<DemoSession, SessionError> {
        let (_, mut session) = self.sessions.remove(&id).ok_or(SessionError::NotFound(id))?;
        session.is_active = false;
        metrics::record_sessions_active(self.sessions.len());
        tracing::info!(session_id = %id, "Demo session ended");
        Ok(session)
    }

    /// Refuse new sessions from now on.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::info!(sessions = self.sessions.len(), "Session registry closed to new sessions");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn summary(&self) -> SessionSummary {
        let now = self.clock.now();
        let mut total = 0;
        let mut valid = 0;
        for mut r in self.sessions.iter_mut() {
            total += 1;
            if r.value_mut().observe(now) {
                valid += 1;
            }
        }
        SessionSummary { total, valid }
    }

    /// Remove every session expired (or inactive) at `now`.
    ///
    /// Expired ids are collected shard by shard, then removed `batch_size` at
    /// a time with a yield in between so request-path operations on the same
    /// shards are never starved. Each removal re-checks expiry under the
    /// shard lock.
    pub async fn purge_expired(&self, now: DateTime<Utc>, batch_size: usize) -> usize {
        let expired: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|r| !r.value().is_valid_at(now))
            .map(|r| *r.key())
            .collect();

        let mut removed = 0;
        for (i, batch) in expired.chunks(batch_size.max(1)).enumerate() {
            if i > 0 {
                tokio::task::yield_now().await;
            }
            for id in batch {
                if self
                    .sessions
                    .remove_if(id, |_, s| !s.is_valid_at(now))
                    .is_some()
                {
                    removed += 1;
                }
            }
        }

        if removed > 0 {
            metrics::record_sessions_expired(removed);
            metrics::record_sessions_active(self.sessions.len());
        }
        removed
    }

    fn with_valid<F>(&self, id: SessionId, update: F) -> Result<(), SessionError>
    where
        F: FnOnce(&mut DemoSession, DateTime<Utc>),
    {
        let now = self.clock.now();
        let mut entry = self.sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        let session = entry.value_mut();
        if !session.observe(now) {
            return Err(SessionError::Expired(id));
        }
        update(session, now);
        Ok(())
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.sessions.len())
            .field("ttl", &self.ttl)
            .field("max_interactions", &self.max_interactions)
            .field("closed", &self.is_closed())
            .finish()
    }
}
