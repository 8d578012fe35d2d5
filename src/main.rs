//! hop: a synthetic call-chain HTTP node.
//!
//! ```text
//!     curl hop1/-wait:100/hop2/-code:500
//!
//!     client ──▶ hop1 ──(wait 100 ms)──▶ hop2 ──(answer 500)
//!            ◀── 500, trace of hop1 + "Called http://hop2/-code:500: 500 ..."
//! ```
//!
//! Every node reads directives from the request path, runs them, relays the
//! rest of the path to the next hop and answers with a trace of what it did.

use clap::Parser;

use hop::config::Cli;
use hop::lifecycle::startup;
use hop::observability::logging::init_logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().resolve()?;
    init_logging(config.observability.verbose);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        interface = %config.listener.interface,
        http_port = config.listener.http_port,
        tls = config.tls.enabled(),
        "hop starting"
    );

    if let Err(e) = startup::run(config).await {
        tracing::error!(error = %e, "hop failed");
        return Err(e.into());
    }
    Ok(())
}
