//! Relay subsystem.
//!
//! # Data Flow
//! ```text
//! HopAddress + ExecutionContext
//!     → target::RelayTarget (decode, default scheme, residual kept verbatim)
//!     → proxy (rewrite authority or tunnel)
//!     → transport::Transports::for_scheme
//!     → Transport::send
//!     → trace lines, forward-back headers, RelayOutcome
//! ```

pub mod client;
pub mod proxy;
pub mod target;
pub mod transport;

pub use client::RelayClient;
pub use proxy::ProxySettings;
pub use target::RelayTarget;
pub use transport::{Transport, Transports};
