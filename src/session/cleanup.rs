//! Periodic removal of expired demo sessions.
//!
//! # Responsibilities
//! - Sweep the registry on a fixed interval, off the request path
//! - Stop cleanly on shutdown, finishing any sweep already underway

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::config::CleanupConfig;
use crate::lifecycle::Shutdown;
use crate::session::registry::SessionRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("cleanup scheduler is already running")]
    AlreadyRunning,
}

struct Running {
    shutdown: Shutdown,
    handle: JoinHandle<()>,
}

/// Owns the background sweep task.
pub struct CleanupScheduler {
    registry: Arc<SessionRegistry>,
    interval: Duration,
    batch_size: usize,
    running: Mutex<Option<Running>>,
}

impl CleanupScheduler {
    pub fn new(registry: Arc<SessionRegistry>, config: &CleanupConfig) -> Self {
        Self {
            registry,
            interval: config.interval(),
            batch_size: config.batch_size,
            running: Mutex::new(None),
        }
    }

    /// Spawn the sweep loop on the current Tokio runtime.
    pub fn start(&self) -> Result<(), SchedulerError> {
        let mut running = self.running.lock();
        if running.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }

        let shutdown = Shutdown::new();
        let rx = shutdown.subscribe();
        let handle = tokio::spawn(run(
            self.registry.clone(),
            self.interval,
            self.batch_size,
            rx,
        ));

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            batch_size = self.batch_size,
            "Session cleanup scheduler started"
        );
        *running = Some(Running { shutdown, handle });
        Ok(())
    }

    /// Signal the loop and wait for it to exit. Returns false if not running.
    pub async fn stop(&self) -> bool {
        let Some(running) = self.running.lock().take() else {
            return false;
        };

        running.shutdown.trigger();
        if let Err(e) = running.handle.await {
            tracing::error!(error = %e, "Session cleanup task ended abnormally");
        }
        tracing::info!("Session cleanup scheduler stopped");
        true
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    /// Run one sweep immediately.
    pub async fn sweep_now(&self) -> usize {
        sweep(&self.registry, self.batch_size).await
    }
}

async fn run(
    registry: Arc<SessionRegistry>,
    interval: Duration,
    batch_size: usize,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // The shutdown branch is not polled until the sweep finishes.
                sweep(&registry, batch_size).await;
            }
            _ = shutdown.recv() => {
                tracing::debug!("Session cleanup received shutdown signal, exiting loop");
                break;
            }
        }
    }
}

async fn sweep(registry: &SessionRegistry, batch_size: usize) -> usize {
    let now = registry.now();
    let removed = registry.purge_expired(now, batch_size).await;
    if removed > 0 {
        tracing::info!(removed, remaining = registry.len(), "Expired demo sessions removed");
    } else {
        tracing::trace!(remaining = registry.len(), "No expired demo sessions");
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::session::model::{DemoRole, ManualClock};
    use chrono::Utc;

    fn setup(ttl_secs: u64) -> (Arc<SessionRegistry>, ManualClock, CleanupScheduler) {
        let clock = ManualClock::new(Utc::now());
        let registry = Arc::new(SessionRegistry::with_clock(
            &SessionConfig {
                ttl_secs,
                max_interactions: 10,
            },
            Arc::new(clock.clone()),
        ));
        let scheduler = CleanupScheduler::new(
            registry.clone(),
            &CleanupConfig {
                interval_secs: 60,
                batch_size: 8,
            },
        );
        (registry, clock, scheduler)
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_session_removed_on_next_tick() {
        let (registry, clock, scheduler) = setup(30 * 60);
        let (id, _) = registry.create(DemoRole::LoanOfficer).unwrap();
        scheduler.start().unwrap();

        clock.advance(chrono::Duration::minutes(31));
        assert!(!registry.is_valid(id));
        assert!(registry.get(id).is_ok(), "still present until the sweep runs");

        time::sleep(Duration::from_secs(61)).await;
        assert!(registry.get(id).is_err());

        assert!(scheduler.stop().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_valid_sessions_survive_sweeps() {
        let (registry, clock, scheduler) = setup(30 * 60);
        let expiring: Vec<_> = (0..20).map(|_| registry.create(DemoRole::Applicant).unwrap().0).collect();
        clock.advance(chrono::Duration::minutes(20));
        let live: Vec<_> = (0..20).map(|_| registry.create(DemoRole::Underwriter).unwrap().0).collect();
        clock.advance(chrono::Duration::minutes(15));

        scheduler.start().unwrap();
        time::sleep(Duration::from_secs(61)).await;
        scheduler.stop().await;

        assert!(expiring.iter().all(|id| registry.get(*id).is_err()));
        assert!(live.iter().all(|id| registry.is_valid(*id)));
        assert_eq!(registry.len(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_and_stop_idempotent() {
        let (_registry, _clock, scheduler) = setup(60);
        scheduler.start().unwrap();
        assert_eq!(scheduler.start(), Err(SchedulerError::AlreadyRunning));
        assert!(scheduler.is_running());

        assert!(scheduler.stop().await);
        assert!(!scheduler.is_running());
        assert!(!scheduler.stop().await);

        // Restartable after a stop.
        scheduler.start().unwrap();
        assert!(scheduler.stop().await);
    }

    #[tokio::test]
    async fn test_sweep_now() {
        let (registry, clock, scheduler) = setup(60);
        registry.create(DemoRole::Admin).unwrap();
        clock.advance(chrono::Duration::seconds(60));
        assert_eq!(scheduler.sweep_now().await, 1);
        assert!(registry.is_empty());
    }
}
