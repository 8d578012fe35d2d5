//! Startup orchestration.
//!
//! # Responsibilities
//! - Load TLS material and build the shared [`Node`]
//! - Start the metrics, HTTP and (optional) HTTPS listeners
//! - Wait for `-quit`, a signal, or a listener failure, then drain
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

use crate::config::NodeConfig;
use crate::error::StartupError;
use crate::http::HopServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::wait_for_signal;
use crate::net::listener;
use crate::net::tls::{load_tls_config, ClientTlsMaterial};
use crate::node::Node;
use crate::observability::metrics;
use crate::relay::RelayClient;

type ListenerTask = Result<(), StartupError>;

/// Run the node until it is told to stop.
pub async fn run(config: NodeConfig) -> Result<(), StartupError> {
    let shutdown = Shutdown::new();

    let client_tls = ClientTlsMaterial::load(&config.tls)?;
    let relay = RelayClient::from_config(&config, client_tls)?;
    let node = Node::from_config(&config, relay, Arc::new(shutdown.clone()));
    tracing::info!(hostname = node.hostname(), "Node initialized");

    let server = HopServer::new(Arc::new(node), &config.timeouts);
    let mut tasks: JoinSet<ListenerTask> = JoinSet::new();

    if config.observability.metrics_enabled {
        let handle = metrics::install_recorder()?;
        let metrics_listener = listener::bind(&config.listener.address(config.listener.metrics_port), "metrics").await?;
        let stopped = shutdown.stopped();
        tasks.spawn(async move {
            axum::serve(metrics_listener, metrics::router(handle))
                .with_graceful_shutdown(stopped)
                .await?;
            Ok(())
        });
    }

    let http_listener = listener::bind(&config.listener.address(config.listener.http_port), "http").await?;
    let stopped = shutdown.stopped();
    let http_server = server.clone();
    tasks.spawn(async move { Ok(http_server.run(http_listener, stopped).await?) });

    let drain = Duration::from_secs(config.timeouts.drain_secs);

    if let (Some(cert), Some(key)) = (&config.tls.cert, &config.tls.key) {
        let tls = load_tls_config(cert, key).await?;
        let addr = listener::socket_addr(&config.listener.address(config.listener.https_port))?;
        let handle = axum_server::Handle::new();

        let stopper = handle.clone();
        let stopped = shutdown.stopped();
        tokio::spawn(async move {
            stopped.await;
            stopper.graceful_shutdown(Some(drain));
        });
        tasks.spawn(async move { Ok(server.run_tls(addr, tls, handle).await?) });
    }

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let signal = wait_for_signal().await;
        tracing::info!(signal, "Shutdown signal received");
        signal_shutdown.trigger();
    });

    let mut failure = None;
    tokio::select! {
        _ = shutdown.stopped() => {}
        Some(joined) = tasks.join_next() => {
            failure = listener_failure(joined);
            tracing::warn!("A listener exited, stopping the node");
            shutdown.trigger();
        }
    }

    tracing::info!(drain_secs = drain.as_secs(), "Draining connections");
    let drained = tokio::time::timeout(drain, async {
        while let Some(joined) = tasks.join_next().await {
            if let Some(e) = listener_failure(joined) {
                tracing::error!(error = %e, "Listener failed while draining");
            }
        }
    })
    .await;
    if drained.is_err() {
        tracing::warn!("Drain period elapsed, closing remaining connections");
        tasks.abort_all();
    }

    tracing::info!("Shutdown complete");
    failure.map_or(Ok(()), Err)
}

fn listener_failure(joined: Result<ListenerTask, tokio::task::JoinError>) -> Option<StartupError> {
    match joined {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e),
        Err(e) => Some(StartupError::Io(std::io::Error::other(e.to_string()))),
    }
}
