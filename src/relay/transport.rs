//! Outbound transports.
//!
//! A [`Transport`] issues exactly one request and buffers the whole answer.
//! Transports are built once at startup and shared by every request; both
//! implementations keep pooled connections.

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, Version};
use futures_util::future::BoxFuture;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioTimer},
};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::error::{error_chain, ChainError, StartupError};
use crate::net::tls::ClientTlsMaterial;
use crate::relay::proxy::ProxySettings;
use crate::relay::target::RelayTarget;

/// Idle connections kept per host.
const MAX_IDLE_PER_HOST: usize = 10;

/// One relay call, fully built.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub url: RelayTarget,
    pub headers: HeaderMap,
    pub payload: Bytes,
}

/// What the next hop answered.
#[derive(Debug, Clone)]
pub struct RelayResponse {
    pub version: Version,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

pub trait Transport: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &'static str;

    fn send(&self, request: OutboundRequest) -> BoxFuture<'_, Result<RelayResponse, ChainError>>;
}

fn transport_error(err: &(dyn std::error::Error + 'static)) -> ChainError {
    ChainError::Transport(error_chain(err))
}

/// Plain HTTP over the hyper-util pooled client.
pub struct HyperTransport {
    client: Client<HttpConnector, Body>,
}

impl HyperTransport {
    pub fn new(idle_timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(idle_timeout)
            .pool_max_idle_per_host(MAX_IDLE_PER_HOST)
            .pool_timer(TokioTimer::new())
            .build(HttpConnector::new());
        Self { client }
    }
}

impl Transport for HyperTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    fn send(&self, request: OutboundRequest) -> BoxFuture<'_, Result<RelayResponse, ChainError>> {
        Box::pin(async move {
            let uri = request.url.to_uri()?;
            let mut req = Request::builder()
                .method(Method::GET)
                .uri(uri)
                .body(Body::from(request.payload))
                .map_err(|e| transport_error(&e))?;
            *req.headers_mut() = request.headers;

            let response: hyper::Response<hyper::body::Incoming> =
                self.client.request(req).await.map_err(|e| transport_error(&e))?;
            let (parts, body) = response.into_parts();
            let body = axum::body::to_bytes(Body::new(body), usize::MAX)
                .await
                .map_err(|e| transport_error(&e))?;

            Ok(RelayResponse {
                version: parts.version,
                status: parts.status,
                headers: parts.headers,
                body,
            })
        })
    }
}

/// reqwest-backed transport: mutual TLS and/or a tunneling proxy.
///
/// reqwest addresses requests by [`Url`], so dot segments in the path are
/// resolved before the request leaves. The plain transport sends the path
/// verbatim.
pub struct ReqwestTransport {
    client: reqwest::Client,
    name: &'static str,
}

impl ReqwestTransport {
    fn builder(idle_timeout: Duration) -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .pool_idle_timeout(idle_timeout)
            .pool_max_idle_per_host(MAX_IDLE_PER_HOST)
    }

    /// Plain HTTP tunneled through `proxy`.
    pub fn proxied(proxy: &Url, idle_timeout: Duration) -> Result<Self, StartupError> {
        let proxy = reqwest::Proxy::http(proxy.as_str())
            .map_err(|e| StartupError::Proxy(error_chain(&e)))?;
        let client = Self::builder(idle_timeout)
            .proxy(proxy)
            .build()
            .map_err(|e| StartupError::Proxy(error_chain(&e)))?;
        Ok(Self {
            client,
            name: "http via proxy",
        })
    }

    /// HTTPS presenting the node certificate. Server certificates are not
    /// verified.
    pub fn mutual_tls(
        material: ClientTlsMaterial,
        proxy: Option<&Url>,
        idle_timeout: Duration,
    ) -> Result<Self, StartupError> {
        let mut builder = Self::builder(idle_timeout)
            .use_native_tls()
            .identity(material.identity)
            .danger_accept_invalid_certs(true);
        for root in material.roots {
            builder = builder.add_root_certificate(root);
        }
        builder = match proxy {
            Some(proxy) => builder.proxy(
                reqwest::Proxy::https(proxy.as_str())
                    .map_err(|e| StartupError::Proxy(error_chain(&e)))?,
            ),
            None => builder.no_proxy(),
        };
        let client = builder
            .build()
            .map_err(|e| StartupError::Tls(error_chain(&e)))?;
        Ok(Self {
            client,
            name: "https",
        })
    }
}

impl Transport for ReqwestTransport {
    fn name(&self) -> &'static str {
        self.name
    }

    fn send(&self, request: OutboundRequest) -> BoxFuture<'_, Result<RelayResponse, ChainError>> {
        Box::pin(async move {
            let response = self
                .client
                .get(request.url.to_url()?)
                .headers(request.headers)
                .body(request.payload)
                .send()
                .await
                .map_err(|e| transport_error(&e))?;

            let version = response.version();
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await.map_err(|e| transport_error(&e))?;

            Ok(RelayResponse {
                version,
                status,
                headers,
                body,
            })
        })
    }
}

/// The transports available to the relay, one per scheme.
#[derive(Clone)]
pub struct Transports {
    pub http: Arc<dyn Transport>,
    pub https: Option<Arc<dyn Transport>>,
}

impl Transports {
    /// Build from TLS material and proxy settings. Without TLS material the
    /// `https` slot stays empty and HTTPS hops fail with a configuration error.
    pub fn build(
        tls: Option<ClientTlsMaterial>,
        proxies: &ProxySettings,
        idle_timeout: Duration,
    ) -> Result<Self, StartupError> {
        let http: Arc<dyn Transport> = match proxies.http_tunnel() {
            Some(proxy) => Arc::new(ReqwestTransport::proxied(proxy, idle_timeout)?),
            None => Arc::new(HyperTransport::new(idle_timeout)),
        };
        let https = match tls {
            Some(material) => Some(Arc::new(ReqwestTransport::mutual_tls(
                material,
                proxies.https_tunnel(),
                idle_timeout,
            )?) as Arc<dyn Transport>),
            None => None,
        };
        Ok(Self { http, https })
    }

    /// Only a plain transport.
    pub fn plain(transport: Arc<dyn Transport>) -> Self {
        Self {
            http: transport,
            https: None,
        }
    }

    pub fn for_scheme(&self, scheme: &str) -> Result<&Arc<dyn Transport>, ChainError> {
        match scheme {
            "http" => Ok(&self.http),
            "https" => self
                .https
                .as_ref()
                .ok_or_else(|| ChainError::Configuration("TLS is not initialized".to_string())),
            other => Err(ChainError::Configuration(format!("unknown scheme {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::parser::HopAddress;

    #[tokio::test]
    async fn https_without_tls_is_a_configuration_error() {
        let transports = Transports::build(None, &ProxySettings::default(), Duration::from_secs(30)).unwrap();
        assert_eq!(transports.http.name(), "http");
        let err = transports.for_scheme("https").err().unwrap();
        assert_eq!(err.to_string(), "configuration error: TLS is not initialized");
        assert!(transports.for_scheme("ftp").is_err());
    }

    #[tokio::test]
    async fn tunneling_http_proxy_swaps_the_plain_transport() {
        let proxies = ProxySettings {
            http: Some(Url::parse("http://proxy:3128").unwrap()),
            https: None,
            tunneling: true,
        };
        let transports = Transports::build(None, &proxies, Duration::from_secs(30)).unwrap();
        assert_eq!(transports.http.name(), "http via proxy");
    }

    #[tokio::test]
    async fn connection_refused_is_a_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HyperTransport::new(Duration::from_secs(30));
        let err = transport
            .send(OutboundRequest {
                url: RelayTarget::from_hop(&HopAddress {
                    address: format!("127.0.0.1%3A{}", addr.port()),
                    residual: String::new(),
                })
                .unwrap(),
                headers: HeaderMap::new(),
                payload: Bytes::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::Transport(_)));
    }

    #[tokio::test]
    async fn plain_transport_sends_the_path_verbatim() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap();
            socket
                .write_all(b"HTTP/1.1 204 No Content\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .await
                .unwrap();
            String::from_utf8_lossy(&buf[..n]).to_string()
        });

        let transport = HyperTransport::new(Duration::from_secs(30));
        let response = transport
            .send(OutboundRequest {
                url: RelayTarget::from_hop(&HopAddress {
                    address: format!("127.0.0.1%3A{}", addr.port()),
                    residual: "-code:500/%2E%2E/hop3/../x".into(),
                })
                .unwrap(),
                headers: HeaderMap::new(),
                payload: Bytes::new(),
            })
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::NO_CONTENT);

        let head = server.await.unwrap();
        assert!(head.starts_with("GET /-code:500/%2E%2E/hop3/../x HTTP/1.1\r\n"));
    }
}
