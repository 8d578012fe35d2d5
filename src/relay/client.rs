//! Relay Client: turns a hop address plus the context's outbound state into
//! one call to the next hop, and folds the answer back into the context.

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use std::time::Duration;

use crate::chain::context::{ExecutionContext, RelayOutcome};
use crate::chain::parser::HopAddress;
use crate::config::NodeConfig;
use crate::error::{ArgumentError, ChainError, StartupError};
use crate::http::request::dump_body;
use crate::net::tls::ClientTlsMaterial;
use crate::observability::metrics;
use crate::relay::proxy::ProxySettings;
use crate::relay::target::RelayTarget;
use crate::relay::transport::{OutboundRequest, RelayResponse, Transports};

fn status_line(status: StatusCode) -> String {
    format!("{} {}", status.as_u16(), status.canonical_reason().unwrap_or_default())
        .trim_end()
        .to_string()
}

fn outbound_headers(ctx: &ExecutionContext) -> Result<HeaderMap, ArgumentError> {
    let mut headers = HeaderMap::with_capacity(ctx.outbound_headers.len());
    for (name, value) in ctx.outbound_headers.iter() {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ArgumentError::InvalidHeader(name.to_string()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| ArgumentError::InvalidHeader(format!("{}: {}", name, value)))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

fn dump_response(response: &RelayResponse) -> Vec<String> {
    let mut lines = vec![format!("{:?} {}", response.version, status_line(response.status))];
    for (name, value) in response.headers.iter() {
        lines.push(format!("{}: {}", name, String::from_utf8_lossy(value.as_bytes())));
    }
    lines.push(String::new());
    lines.extend(dump_body(response.body.len(), &response.body));
    lines
}

/// Issues relay calls for every request of the node.
#[derive(Clone)]
pub struct RelayClient {
    transports: Transports,
    proxies: ProxySettings,
}

impl RelayClient {
    pub fn new(transports: Transports, proxies: ProxySettings) -> Self {
        Self { transports, proxies }
    }

    pub fn from_config(config: &NodeConfig, tls: Option<ClientTlsMaterial>) -> Result<Self, StartupError> {
        let proxies = ProxySettings::from_config(&config.proxy)?;
        let idle = Duration::from_secs(config.timeouts.idle_secs);
        let transports = Transports::build(tls, &proxies, idle)?;
        if let Some(proxy) = &proxies.http {
            tracing::info!(proxy = %proxy, tunneling = proxies.tunneling, "HTTP proxy configured");
        }
        if let Some(proxy) = &proxies.https {
            tracing::info!(proxy = %proxy, tunneling = proxies.tunneling, "HTTPS proxy configured");
        }
        Ok(Self::new(transports, proxies))
    }

    /// Call the next hop and record the outcome on the context.
    pub async fn relay(&self, ctx: &mut ExecutionContext, hop: &HopAddress) {
        let outcome = match RelayTarget::from_hop(hop) {
            Ok(target) => self.call(ctx, target).await,
            Err(e) => {
                ctx.log(format!("Cannot call {}: {}", hop.address, e));
                RelayOutcome::Failed
            }
        };
        metrics::record_relay(outcome);
        ctx.relay = outcome;
    }

    async fn call(&self, ctx: &mut ExecutionContext, url: RelayTarget) -> RelayOutcome {
        match self.send(ctx, &url).await {
            Ok(response) => {
                ctx.log(format!("Called {}: {}", url, status_line(response.status)));
                if ctx.show_details {
                    for line in dump_response(&response) {
                        ctx.log(format!(".\t{}", line));
                    }
                }
                for name in ctx.forward_back.clone() {
                    let value = response
                        .headers
                        .get(name.as_str())
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    ctx.log(format!("Back forwarding header {}: {}", name, value));
                    if !value.is_empty() {
                        ctx.response_headers.set(name, value);
                    }
                }
                RelayOutcome::Succeeded(response.status)
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Relay failed");
                ctx.log(format!("Couldn't call {}: {}", url, e));
                RelayOutcome::Failed
            }
        }
    }

    async fn send(&self, ctx: &mut ExecutionContext, url: &RelayTarget) -> Result<RelayResponse, ChainError> {
        let mut headers = outbound_headers(ctx)?;
        let mut wire_url = url.clone();

        if let Some(proxy) = self.proxies.for_scheme(url.scheme()) {
            tracing::debug!(proxy = %proxy, url = %url, "Using proxy");
            if !self.proxies.tunneling {
                if !headers.contains_key(header::HOST) {
                    let authority = url.authority();
                    let host = HeaderValue::from_str(&authority)
                        .map_err(|_| ArgumentError::InvalidHeader(authority.clone()))?;
                    headers.insert(header::HOST, host);
                }
                wire_url = url.via_proxy(proxy).map_err(ChainError::Configuration)?;
                ctx.log(format!("Overriding url: {}", wire_url));
            }
            if ctx.show_details {
                ctx.log(format!("Using proxy: {}", proxy));
            }
        }

        let transport = self.transports.for_scheme(url.scheme())?;
        let size = ctx.outbound_payload_size;
        tracing::debug!(
            url = %wire_url,
            transport = transport.name(),
            bytes = size,
            headers = ?headers,
            "Calling next hop"
        );

        transport
            .send(OutboundRequest {
                url: wire_url,
                headers,
                payload: Bytes::from(vec![b'X'; size]),
            })
            .await
    }
}
