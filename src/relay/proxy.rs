//! Upstream proxy selection for relayed calls.
//!
//! # Modes
//! - Tunneling: the transport itself is built with the proxy and talks to it
//! - Rewriting: the request URL's authority is replaced by the proxy's, the
//!   Host header keeps the original target
//!
//! Proxies are chosen by the hop's URL scheme only; environment proxy
//! variables are read once at startup through the CLI, never per request.

use url::Url;

use crate::config::ProxyConfig;
use crate::config::validation::parse_proxy_url;
use crate::error::StartupError;

#[derive(Debug, Clone, Default)]
pub struct ProxySettings {
    pub http: Option<Url>,
    pub https: Option<Url>,
    pub tunneling: bool,
}

fn parse_optional(raw: &Option<String>) -> Result<Option<Url>, StartupError> {
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(raw) => parse_proxy_url(raw)
            .map(Some)
            .map_err(|reason| StartupError::Proxy(format!("invalid proxy {:?}: {}", raw, reason))),
    }
}

impl ProxySettings {
    pub fn from_config(config: &ProxyConfig) -> Result<Self, StartupError> {
        Ok(Self {
            http: parse_optional(&config.http_proxy)?,
            https: parse_optional(&config.https_proxy)?,
            tunneling: config.tunneling,
        })
    }

    /// Proxy configured for a URL scheme, if any.
    pub fn for_scheme(&self, scheme: &str) -> Option<&Url> {
        match scheme {
            "http" => self.http.as_ref(),
            "https" => self.https.as_ref(),
            _ => None,
        }
    }

    /// Proxy the `http` transport must tunnel through.
    pub fn http_tunnel(&self) -> Option<&Url> {
        self.http.as_ref().filter(|_| self.tunneling)
    }

    /// Proxy the `https` transport must tunnel through.
    pub fn https_tunnel(&self) -> Option<&Url> {
        self.https.as_ref().filter(|_| self.tunneling)
    }
}

/// Point `url` at the proxy's host and port, keeping scheme, path and query.
pub fn rewrite_to_proxy(url: &mut Url, proxy: &Url) -> Result<(), String> {
    url.set_host(proxy.host_str())
        .map_err(|e| format!("cannot use proxy host: {}", e))?;
    url.set_port(proxy.port())
        .map_err(|_| "cannot use proxy port".to_string())
}
