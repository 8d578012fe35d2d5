//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: every path and method runs the chain
//! - Wire up middleware (tracing, request ID, request timeout)
//! - Serve plain HTTP and HTTPS with the same router

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderName, Request},
    response::Response,
    routing::any,
    Router,
};
use axum_server::{tls_rustls::RustlsConfig, Handle};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::Instrument;

use crate::chain::run_chain;
use crate::config::schema::TimeoutConfig;
use crate::http::request::{BodySummary, HopRequestId, InboundRequest, X_REQUEST_ID};
use crate::http::response::into_http_response;
use crate::net::tls::{TlsInfo, TlsInfoAcceptor};
use crate::node::Node;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub node: Arc<Node>,
}

/// The hop listener. Cheap to clone; every clone serves the same node.
#[derive(Clone)]
pub struct HopServer {
    router: Router,
}

impl HopServer {
    pub fn new(node: Arc<Node>, timeouts: &TimeoutConfig) -> Self {
        let router = Self::build_router(AppState { node }, Duration::from_secs(timeouts.request_secs));
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState, request_timeout: Duration) -> Router {
        let request_id = HeaderName::from_static(X_REQUEST_ID);
        Router::new()
            .route("/{*path}", any(hop_handler))
            .route("/", any(hop_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(request_id.clone(), HopRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(request_id))
                    .layer(TimeoutLayer::new(request_timeout)),
            )
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve plain HTTP until `shutdown` resolves and open connections finish.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;

        tracing::info!(address = %addr, "HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS. Stopping goes through `handle`.
    pub async fn run_tls(self, addr: SocketAddr, tls: RustlsConfig, handle: Handle) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, "HTTPS server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum_server::bind(addr)
            .acceptor(TlsInfoAcceptor::new(tls))
            .handle(handle)
            .serve(app)
            .await?;

        tracing::info!(address = %addr, "HTTPS server stopped");
        Ok(())
    }
}

/// Every request: snapshot it, run the chain, answer with the trace.
async fn hop_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();

    let request_id = parts
        .headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let remote_addr = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let tls = parts.extensions.get::<TlsInfo>().cloned();

    let body = BodySummary::read(body).await;
    let inbound = InboundRequest::from_parts(parts, body, remote_addr, tls);
    let span = tracing::info_span!("hop", request_id = %request_id, path = %inbound.path());
    tracing::debug!(parent: &span, dump = ?inbound.dump(), "Inbound request");

    let chain = run_chain(&state.node, &inbound).instrument(span.clone()).await;
    tracing::debug!(parent: &span, status = %chain.status, "Chain complete");

    metrics::record_hop(chain.status.as_u16(), start);
    into_http_response(chain, state.node.lifecycle.clone())
}
