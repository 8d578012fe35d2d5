//! Metrics collection and exposition.
//!
//! # Metrics
//! - `hop_durations_seconds{service="uniform"}` (summary): time spent serving a hop
//! - `hop_requests_total{status}` (counter): responses by status code
//! - `hop_relays_total{outcome}` (counter): relay attempts by outcome
//!
//! Recording goes through the `metrics` facade; without an installed
//! recorder every call is a no-op.

use axum::{routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

use crate::chain::context::RelayOutcome;
use crate::error::StartupError;

pub const HOP_DURATIONS: &str = "hop_durations_seconds";
pub const HOP_REQUESTS: &str = "hop_requests_total";
pub const HOP_RELAYS: &str = "hop_relays_total";

const QUANTILES: [f64; 3] = [0.5, 0.9, 0.99];

/// Install the process-wide Prometheus recorder.
pub fn install_recorder() -> Result<PrometheusHandle, StartupError> {
    let handle = PrometheusBuilder::new()
        .set_quantiles(&QUANTILES)
        .map_err(|e| StartupError::Metrics(e.to_string()))?
        .install_recorder()
        .map_err(|e| StartupError::Metrics(e.to_string()))?;

    ::metrics::describe_histogram!(HOP_DURATIONS, ::metrics::Unit::Seconds, "HOP latency distributions.");
    ::metrics::describe_counter!(HOP_REQUESTS, "Hop responses by status code.");
    ::metrics::describe_counter!(HOP_RELAYS, "Relay calls by outcome.");
    Ok(handle)
}

/// Router serving `GET /metrics` in the Prometheus text format.
pub fn router(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

/// Record one served hop.
pub fn record_hop(status: u16, start: Instant) {
    ::metrics::histogram!(HOP_DURATIONS, "service" => "uniform").record(start.elapsed().as_secs_f64());
    ::metrics::counter!(HOP_REQUESTS, "status" => status.to_string()).increment(1);
}

pub fn outcome_label(outcome: RelayOutcome) -> &'static str {
    match outcome {
        RelayOutcome::NotAttempted => "not_attempted",
        RelayOutcome::Skipped => "skipped",
        RelayOutcome::Succeeded(_) => "succeeded",
        RelayOutcome::Failed => "failed",
    }
}

/// Record one relay decision.
pub fn record_relay(outcome: RelayOutcome) {
    ::metrics::counter!(HOP_RELAYS, "outcome" => outcome_label(outcome)).increment(1);
}
