//! Shutdown coordination.
//!
//! # Order
//! 1. Refuse new demo sessions
//! 2. Stop the cleanup scheduler (joins its task)
//! 3. Signal the HTTP server to stop accepting and drain
//! 4. Wait up to the grace period, then abort the server task

use std::io;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::session::{CleanupScheduler, SessionRegistry};

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of tasks still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// How the server task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// In-flight requests finished inside the grace period.
    Graceful,
    /// The server task returned an error or panicked.
    Failed,
    /// The grace period elapsed and the task was aborted.
    Forced,
}

/// Run the shutdown sequence against a spawned server task.
pub async fn drain(
    sessions: &SessionRegistry,
    scheduler: &CleanupScheduler,
    server_shutdown: &Shutdown,
    mut server: JoinHandle<io::Result<()>>,
    grace_period: Duration,
) -> ShutdownOutcome {
    sessions.close();
    scheduler.stop().await;

    tracing::info!(grace_period_secs = grace_period.as_secs(), "Draining in-flight requests");
    server_shutdown.trigger();

    match tokio::time::timeout(grace_period, &mut server).await {
        Ok(Ok(Ok(()))) => {
            tracing::info!("HTTP server drained");
            ShutdownOutcome::Graceful
        }
        Ok(Ok(Err(e))) => {
            tracing::error!(error = %e, "HTTP server exited with an error");
            ShutdownOutcome::Failed
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "HTTP server task ended abnormally");
            ShutdownOutcome::Failed
        }
        Err(_) => {
            tracing::warn!("Grace period elapsed, aborting in-flight requests");
            server.abort();
            ShutdownOutcome::Forced
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CleanupConfig, SessionConfig};
    use crate::session::{DemoRole, SessionError};
    use std::sync::Arc;

    fn services() -> (Arc<SessionRegistry>, CleanupScheduler) {
        let registry = Arc::new(SessionRegistry::new(&SessionConfig::default()));
        let scheduler = CleanupScheduler::new(registry.clone(), &CleanupConfig::default());
        (registry, scheduler)
    }

    #[tokio::test]
    async fn test_subscribers_receive_trigger() {
        let shutdown = Shutdown::new();
        let mut rx1 = shutdown.subscribe();
        let mut rx2 = shutdown.subscribe();
        assert_eq!(shutdown.receiver_count(), 2);

        shutdown.trigger();
        assert!(rx1.recv().await.is_ok());
        assert!(rx2.recv().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_graceful() {
        let (registry, scheduler) = services();
        scheduler.start().unwrap();
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        let server = tokio::spawn(async move {
            let _ = rx.recv().await;
            Ok::<(), io::Error>(())
        });

        let outcome = drain(&registry, &scheduler, &shutdown, server, Duration::from_secs(5)).await;

        assert_eq!(outcome, ShutdownOutcome::Graceful);
        assert!(!scheduler.is_running());
        assert_eq!(registry.create(DemoRole::Applicant).unwrap_err(), SessionError::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_forced_after_grace_period() {
        let (registry, scheduler) = services();
        let shutdown = Shutdown::new();
        let server = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok::<(), io::Error>(())
        });

        let outcome = drain(&registry, &scheduler, &shutdown, server, Duration::from_secs(2)).await;
        assert_eq!(outcome, ShutdownOutcome::Forced);
    }

    #[tokio::test]
    async fn test_drain_reports_server_error() {
        let (registry, scheduler) = services();
        let shutdown = Shutdown::new();
        let server = tokio::spawn(async { Err::<(), _>(io::Error::other("bind lost")) });

        let outcome = drain(&registry, &scheduler, &shutdown, server, Duration::from_secs(1)).await;
        assert_eq!(outcome, ShutdownOutcome::Failed);
    }
}
