//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Configured address
//!     → listener.rs (parse, bind)
//!     → tls.rs (optional rustls handshake, negotiated parameters captured)
//!     → Hand off to HTTP layer
//!
//! Outbound:
//!     tls.rs (client identity + CA bundle) → relay::transport
//! ```

pub mod listener;
pub mod tls;
