//! Demo session subsystem.
//!
//! # Data Flow
//! ```text
//! POST /demo/sessions
//!     → registry.rs create (absolute expiry = now + ttl)
//!
//! Request with x-demo-session-id:
//!     → registry.rs touch + record_interaction (bounded history)
//!
//! cleanup.rs (fixed interval, background task):
//!     → registry.rs purge_expired (batched, yields between batches)
//! ```

pub mod cleanup;
pub mod model;
pub mod registry;

pub use cleanup::{CleanupScheduler, SchedulerError};
pub use model::{
    Clock, DemoRole, DemoSession, Interaction, ManualClock, SessionError, SessionId, SystemClock,
};
pub use registry::{SessionRegistry, SessionSummary};
