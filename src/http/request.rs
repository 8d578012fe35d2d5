//! Inbound request snapshot.
//!
//! # Responsibilities
//! - Capture what directives may inspect (host, headers, body, peer, TLS)
//! - Render the request dump used by `-info` and verbose logging
//!
//! # Design Decisions
//! - The body is drained once before the chain runs: every byte is counted,
//!   only the head is kept for dumps, and no size is ever refused
//! - Header lookups mirror HTTP semantics: case-insensitive, first value wins

use axum::body::{Body, Bytes};
use axum::http::{header, request::Parts, HeaderMap, HeaderValue, Method, Request, Uri, Version};
use futures_util::StreamExt;
use std::net::SocketAddr;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::net::tls::TlsInfo;

/// Bodies at or above this size are summarized instead of dumped.
pub const DUMP_BODY_LIMIT: usize = 1024;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates a UUID v4 request ID when the caller did not send one.
#[derive(Debug, Clone, Copy, Default)]
pub struct HopRequestId;

impl MakeRequestId for HopRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// What a hop keeps of a request body: its length and the first
/// [`DUMP_BODY_LIMIT`] bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodySummary {
    pub len: usize,
    pub head: Bytes,
}

impl BodySummary {
    pub fn from_bytes(body: Bytes) -> Self {
        let head = body.slice(..body.len().min(DUMP_BODY_LIMIT));
        Self { len: body.len(), head }
    }

    /// Drain `body`. A stream that breaks off keeps what arrived.
    pub async fn read(body: Body) -> Self {
        let mut stream = body.into_data_stream();
        let mut len = 0;
        let mut head = Vec::new();

        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(chunk) => {
                    len += chunk.len();
                    let room = DUMP_BODY_LIMIT.saturating_sub(head.len());
                    head.extend_from_slice(&chunk[..chunk.len().min(room)]);
                }
                Err(e) => {
                    tracing::warn!(error = %e, received = len, "Request body ended early");
                    break;
                }
            }
        }

        Self {
            len,
            head: Bytes::from(head),
        }
    }

    pub fn dump(&self) -> Vec<String> {
        dump_body(self.len, &self.head)
    }
}

/// Everything a hop knows about the request it is serving.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: BodySummary,
    pub remote_addr: Option<SocketAddr>,
    pub tls: Option<TlsInfo>,
}

impl InboundRequest {
    pub fn from_parts(
        parts: Parts,
        body: BodySummary,
        remote_addr: Option<SocketAddr>,
        tls: Option<TlsInfo>,
    ) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            version: parts.version,
            headers: parts.headers,
            body,
            remote_addr,
            tls,
        }
    }

    /// A bare GET for `path`, used by tests and tools.
    pub fn get(path: &str) -> Self {
        Self {
            method: Method::GET,
            uri: path.parse().unwrap_or_default(),
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            body: BodySummary::default(),
            remote_addr: None,
            tls: None,
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = value.parse() {
            self.headers.insert(name, value);
        }
        self
    }

    /// Raw, still percent-encoded path.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// First value of a header, empty when absent or not text.
    pub fn header(&self, name: &str) -> String {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    /// Requested host (Host header, else the URI authority), port included.
    pub fn host(&self) -> String {
        let host = self.header(header::HOST.as_str());
        if !host.is_empty() {
            return host;
        }
        self.uri
            .authority()
            .map(|a| a.to_string())
            .unwrap_or_default()
    }

    pub fn remote(&self) -> String {
        self.remote_addr
            .map(|addr| addr.to_string())
            .unwrap_or_default()
    }

    /// Request line, headers, blank line and (small) body.
    pub fn dump(&self) -> Vec<String> {
        let target = self
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let mut lines = vec![format!("{} {} {:?}", self.method, target, self.version)];

        let host = self.host();
        if !host.is_empty() {
            lines.push(format!("Host: {}", host));
        }
        for (name, value) in self.headers.iter() {
            if name == header::HOST {
                continue;
            }
            lines.push(format!("{}: {}", name, String::from_utf8_lossy(value.as_bytes())));
        }
        lines.push(String::new());
        lines.extend(self.body.dump());
        lines
    }
}

/// Body lines for a dump: the text when small, a size note otherwise.
/// `head` holds at least the first `len` bytes of a small body.
pub fn dump_body(len: usize, head: &[u8]) -> Vec<String> {
    if len == 0 {
        Vec::new()
    } else if len < DUMP_BODY_LIMIT {
        String::from_utf8_lossy(&head[..len.min(head.len())])
            .split('\n')
            .map(|line| line.trim_end_matches('\r').to_string())
            .collect()
    } else {
        vec![format!("<{} bytes>", len)]
    }
}
