//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load TLS → Build node → Metrics listener → HTTP/HTTPS listeners
//!
//! Shutdown (shutdown.rs):
//!     `-quit` or signal → Stop accepting → Drain connections → Exit
//!     `-crash` → exit(2) immediately
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when the node is built)
//! - Draining is bounded by `timeouts.drain_secs`

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{NoopShutdown, RecordingShutdown, Shutdown, ShutdownCoordinator};
