//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → AppState → dependency clients → mode decision
//!     (force flag, or concurrent probes of required dependencies)
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → begin shutdown
//!
//! Shutdown (shutdown.rs):
//!     Close sessions → stop cleanup → drain server → abort after grace period
//! ```
//!
//! # Design Decisions
//! - Listeners start last (traffic only after the mode is decided)
//! - Shutdown has a deadline: forced abort after the grace period

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{drain, Shutdown, ShutdownOutcome};
pub use signals::wait_for_signal;
pub use startup::{decide_mode, initialise, StartupError};
