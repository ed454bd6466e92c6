//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (request ID, tracing, timeout, body limit)
//!     → envelope.rs (wrap / annotate / substitute on the way out)
//!     → session.rs (x-demo-session-id → DemoContext)
//!     → handlers.rs, applications.rs, health, admin
//!     → error.rs (stable error bodies)
//! ```

pub mod applications;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod server;
pub mod session;

pub use error::ApiError;
pub use server::{build_router, AppState, HttpServer};
pub use session::{DemoContext, X_DEMO_SESSION_ID};
