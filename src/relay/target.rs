//! Relay targets.
//!
//! Only the origin (scheme and authority) goes through [`Url`]. The path is
//! kept as written, so dot segments and escapes in the residual reach the
//! next hop unchanged.

use axum::http::Uri;
use std::fmt;
use url::Url;

use crate::chain::parser::{percent_decode, HopAddress};
use crate::error::ChainError;
use crate::relay::proxy::rewrite_to_proxy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayTarget {
    origin: Url,
    path: String,
}

impl RelayTarget {
    /// Decoded address, default scheme `http`, then `/` and the raw residual.
    pub fn from_hop(hop: &HopAddress) -> Result<Self, ChainError> {
        let host = percent_decode(&hop.address)?;
        let base = if host.starts_with("http://") || host.starts_with("https://") {
            host.into_owned()
        } else {
            format!("http://{}", host)
        };
        let origin = Url::parse(&base).map_err(|e| ChainError::Parse {
            input: base.clone(),
            reason: e.to_string(),
        })?;
        if origin.cannot_be_a_base() || origin.host_str().is_none() {
            return Err(ChainError::Parse {
                input: base,
                reason: "no host".to_string(),
            });
        }

        let prefix = origin.path().trim_end_matches('/');
        let path = format!("{}/{}", prefix, hop.residual);
        Ok(Self { origin, path })
    }

    pub fn scheme(&self) -> &str {
        self.origin.scheme()
    }

    /// `host[:port]`, as a Host header would carry it.
    pub fn authority(&self) -> String {
        let host = self.origin.host_str().unwrap_or_default();
        match self.origin.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The same path sent to the proxy's host and port.
    pub fn via_proxy(&self, proxy: &Url) -> Result<Self, String> {
        let mut origin = self.origin.clone();
        rewrite_to_proxy(&mut origin, proxy)?;
        Ok(Self {
            origin,
            path: self.path.clone(),
        })
    }

    /// Request target with the path verbatim.
    pub fn to_uri(&self) -> Result<Uri, ChainError> {
        let raw = self.to_string();
        raw.parse().map_err(|e: axum::http::uri::InvalidUri| ChainError::Parse {
            input: raw,
            reason: e.to_string(),
        })
    }

    /// As a [`Url`]. WHATWG parsing resolves dot segments in the path.
    pub fn to_url(&self) -> Result<Url, ChainError> {
        let raw = self.to_string();
        Url::parse(&raw).map_err(|e| ChainError::Parse {
            input: raw,
            reason: e.to_string(),
        })
    }
}

impl fmt::Display for RelayTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme(), self.authority(), self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hop(address: &str, residual: &str) -> HopAddress {
        HopAddress {
            address: address.into(),
            residual: residual.into(),
        }
    }

    fn target(address: &str, residual: &str) -> String {
        RelayTarget::from_hop(&hop(address, residual)).unwrap().to_string()
    }

    #[test]
    fn address_is_decoded_and_scheme_defaults_to_http() {
        assert_eq!(target("localhost%3A12", "-code:404"), "http://localhost:12/-code:404");
        assert_eq!(target("https%3A%2F%2Fhop2%3A8443", ""), "https://hop2:8443/");
        assert_eq!(target("HOP2%3A80", ""), "http://hop2/");

        assert!(RelayTarget::from_hop(&hop("bad%zz", "")).is_err());
        assert!(RelayTarget::from_hop(&hop("hop2%3Anotaport", "")).is_err());
    }

    #[test]
    fn residual_is_kept_byte_for_byte() {
        assert_eq!(
            target("hop2", "-code:500/%2E%2E/hop3"),
            "http://hop2/-code:500/%2E%2E/hop3"
        );
        assert_eq!(target("hop2", "a/../b/./c//d"), "http://hop2/a/../b/./c//d");

        let uri = RelayTarget::from_hop(&hop("hop2%3A8080", "x/%2e%2e/y"))
            .unwrap()
            .to_uri()
            .unwrap();
        assert_eq!(uri.path(), "/x/%2e%2e/y");
        assert_eq!(uri.authority().map(|a| a.as_str()), Some("hop2:8080"));
    }

    #[test]
    fn address_path_prefixes_the_residual() {
        assert_eq!(target("http%3A%2F%2Fhop2%2Fbase%2F", "-code:500"), "http://hop2/base/-code:500");
    }

    #[test]
    fn proxy_keeps_the_path() {
        let proxy = Url::parse("http://proxy:3128").unwrap();
        let target = RelayTarget::from_hop(&hop("hop2%3A8080", "a/../b"))
            .unwrap()
            .via_proxy(&proxy)
            .unwrap();
        assert_eq!(target.to_string(), "http://proxy:3128/a/../b");
        assert_eq!(target.authority(), "proxy:3128");
    }
}
