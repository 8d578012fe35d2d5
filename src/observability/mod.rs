//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! chain interpreter, relay client, http server produce:
//!     → logging.rs (tracing events, filtered by EnvFilter)
//!     → metrics.rs (hop latency summary, request and relay counters)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → GET /metrics on the metrics listener (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Recording is fire-and-forget: no recorder installed means no-op
//! - Request IDs are attached to the request span by the HTTP layer

pub mod logging;
pub mod metrics;
