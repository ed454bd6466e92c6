//! Lending CRM resilience service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id / trace / timeout / body limit
//!                         │
//!                         ▼
//!                     envelope ──── resilience state (live | degraded)
//!                         │    └─── fallback provider (route, method → payload)
//!                         ▼
//!                     session correlation (x-demo-session-id)
//!                         │
//!                         ▼
//!                     handlers ──▶ guarded clients ──▶ circuit breakers ──▶ store, cache,
//!                                                                          document AI, LLM,
//!                                                                          notifications
//!
//!     Background: session cleanup scheduler
//!     Lifecycle:  startup probes decide the mode once; signals drive shutdown
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use lending_resilience::config::load_or_default;
use lending_resilience::lifecycle::{self, Shutdown, ShutdownOutcome};
use lending_resilience::observability::{logging, metrics};
use lending_resilience::session::CleanupScheduler;
use lending_resilience::HttpServer;

#[derive(Parser)]
#[command(name = "lending-resilience")]
#[command(about = "Resilience and fallback core for the lending CRM", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "LENDING_RESILIENCE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_or_default(args.config.as_deref())?;
    logging::init_tracing(&config.observability.log_level);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "lending-resilience starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        dependencies = config.dependencies.len(),
        session_ttl_secs = config.sessions.ttl_secs,
        force_demo_mode = config.resilience.force_demo_mode,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let state = match lifecycle::initialise(config).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed; refusing to serve");
            return Err(e.into());
        }
    };

    let scheduler = CleanupScheduler::new(state.sessions.clone(), &state.config.cleanup);
    scheduler.start()?;

    let listener = TcpListener::bind(&state.config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server_shutdown = Shutdown::new();
    let server = HttpServer::new(state.clone());
    let mut handle = tokio::spawn(server.run(listener, server_shutdown.subscribe()));

    tokio::select! {
        _ = lifecycle::wait_for_signal() => {}
        result = &mut handle => {
            scheduler.stop().await;
            return match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e.into()),
                Err(e) => Err(e.into()),
            };
        }
    }

    let grace = Duration::from_secs(state.config.shutdown.grace_period_secs);
    let outcome = lifecycle::drain(&state.sessions, &scheduler, &server_shutdown, handle, grace).await;

    tracing::info!(outcome = ?outcome, "Shutdown complete");
    match outcome {
        ShutdownOutcome::Graceful => Ok(()),
        ShutdownOutcome::Forced => Err("in-flight requests aborted after grace period".into()),
        ShutdownOutcome::Failed => Err("HTTP server failed during shutdown".into()),
    }
}
