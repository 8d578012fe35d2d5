//! Chain interpreter: tokenize, execute, relay, synthesize.

use crate::chain::context::{ExecutionContext, RelayOutcome};
use crate::chain::executor::Executor;
use crate::chain::parser::parse_path;
use crate::chain::synth::{synthesize, ChainResponse};
use crate::http::request::InboundRequest;
use crate::observability::metrics;
use crate::node::Node;

/// Run the chain encoded in the request path. Always produces a response.
pub async fn run_chain(node: &Node, inbound: &InboundRequest) -> ChainResponse {
    let path = inbound.path();
    let mut ctx = ExecutionContext::new();
    ctx.log(format!("I am {}, will do {}", node.hostname(), path));

    let tokens = parse_path(path);
    let executor = Executor::new(node.env.as_ref(), node.dice.as_ref(), inbound);
    for directive in &tokens.directives {
        executor.execute(&mut ctx, directive).await;
    }

    if let Some(hop) = &tokens.hop {
        if ctx.skip {
            ctx.log(format!("Skipping call to {}", hop.address));
            ctx.relay = RelayOutcome::Skipped;
            metrics::record_relay(RelayOutcome::Skipped);
        } else {
            node.relay.relay(&mut ctx, hop).await;
        }
    }

    synthesize(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::context::LifecycleAction;
    use crate::chain::env::{FixedDice, StaticEnvironment};
    use crate::relay::transport::{OutboundRequest, RelayResponse, Transport, Transports};
    use crate::relay::{ProxySettings, RelayClient};
    use crate::error::ChainError;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, StatusCode, Version};
    use futures_util::future::BoxFuture;
    use std::sync::{Arc, Mutex};

    /// Echoes the requested URL back with status 200.
    #[derive(Default)]
    struct EchoTransport {
        urls: Mutex<Vec<String>>,
    }

    impl Transport for EchoTransport {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn send(&self, request: OutboundRequest) -> BoxFuture<'_, Result<RelayResponse, ChainError>> {
            self.urls.lock().unwrap().push(request.url.to_string());
            Box::pin(async move {
                Ok(RelayResponse {
                    version: Version::HTTP_11,
                    status: StatusCode::OK,
                    headers: HeaderMap::new(),
                    body: Bytes::new(),
                })
            })
        }
    }

    fn node(transport: Arc<EchoTransport>) -> Node {
        Node::new(RelayClient::new(Transports::plain(transport), ProxySettings::default()))
            .with_env(Arc::new(StaticEnvironment::new("hop1")))
            .with_dice(Arc::new(FixedDice(0)))
    }

    #[tokio::test]
    async fn code_only_chain() {
        let response = run_chain(&node(Default::default()), &InboundRequest::get("/-code:500")).await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body, "| I am hop1, will do /-code:500\n| Returning code 500\n");
    }

    #[tokio::test]
    async fn not_alone_does_not_change_code() {
        let response = run_chain(&node(Default::default()), &InboundRequest::get("/-not/-code:500")).await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn explicit_code_overrides_relay() {
        let transport = Arc::new(EchoTransport::default());
        let response = run_chain(
            &node(transport.clone()),
            &InboundRequest::get("/-code:404/localhost%3A12/-code:500"),
        )
        .await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(*transport.urls.lock().unwrap(), vec!["http://localhost:12/-code:500"]);
    }

    #[tokio::test]
    async fn relay_status_is_used_without_code() {
        let transport = Arc::new(EchoTransport::default());
        let response = run_chain(&node(transport.clone()), &InboundRequest::get("/localhost%3A12/-code:404")).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(*transport.urls.lock().unwrap(), vec!["http://localhost:12/-code:404"]);
        assert!(response.body.contains("| Called http://localhost:12/-code:404: 200 OK\n"));
    }

    #[tokio::test]
    async fn skipped_hop_is_not_called() {
        let transport = Arc::new(EchoTransport::default());
        let response = run_chain(&node(transport.clone()), &InboundRequest::get("/-on:hop9/hop2/-code:500")).await;
        assert_eq!(response.status, StatusCode::OK);
        assert!(transport.urls.lock().unwrap().is_empty());
        assert!(response.body.ends_with("| Skipping call to hop2\n"));
    }

    #[tokio::test]
    async fn rnd_zero_skips_the_hop() {
        let transport = Arc::new(EchoTransport::default());
        let response = run_chain(&node(transport.clone()), &InboundRequest::get("/-rnd:0/hop2")).await;
        assert!(transport.urls.lock().unwrap().is_empty());
        assert!(response.body.contains("Skipping call to hop2"));
    }

    #[tokio::test]
    async fn quit_is_deferred_to_the_response() {
        let response = run_chain(&node(Default::default()), &InboundRequest::get("/-quit")).await;
        assert_eq!(response.action, Some(LifecycleAction::FinishGracefully));
        assert!(response.body.ends_with("| Quitting\n"));
    }
}
