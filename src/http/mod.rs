//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum router, request ID, trace, timeout)
//!     → request.rs (buffer body, snapshot headers, peer and TLS info)
//!     → chain::run_chain
//!     → response.rs (status, headers, trace body, deferred lifecycle)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{InboundRequest, X_REQUEST_ID};
pub use server::HopServer;
