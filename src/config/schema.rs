//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a hop node.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for a hop node.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct NodeConfig {
    /// Listening interface and ports.
    pub listener: ListenerConfig,

    /// Certificate material for the HTTPS listener and the HTTPS relay.
    pub tls: TlsConfig,

    /// Upstream proxies used by the relay.
    pub proxy: ProxyConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Chain interpreter settings.
    pub chain: ChainConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to listen on (e.g., "0.0.0.0").
    pub interface: String,

    /// Plain HTTP port.
    pub http_port: u16,

    /// HTTPS port (only bound when TLS material is configured).
    pub https_port: u16,

    /// Prometheus metrics port.
    pub metrics_port: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            interface: "0.0.0.0".to_string(),
            http_port: 80,
            https_port: 443,
            metrics_port: 8080,
        }
    }
}

impl ListenerConfig {
    /// `interface:port` in a form `SocketAddr` can parse (IPv6 bracketed).
    pub fn address(&self, port: u16) -> String {
        if self.interface.contains(':') && !self.interface.starts_with('[') {
            format!("[{}]:{}", self.interface, port)
        } else {
            format!("{}:{}", self.interface, port)
        }
    }
}

/// TLS configuration. The node is TLS-enabled iff both `cert` and `key` are set.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TlsConfig {
    /// Path to certificate file (PEM), also used as the relay client identity.
    pub cert: Option<PathBuf>,

    /// Path to private key file (PEM, PKCS#8).
    pub key: Option<PathBuf>,

    /// Extra trust roots (PEM bundle) added to the system roots.
    pub cacert: Option<PathBuf>,
}

impl TlsConfig {
    pub fn enabled(&self) -> bool {
        self.cert.is_some() && self.key.is_some()
    }
}

/// Upstream proxy configuration for relayed calls.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Proxy for `http` hops.
    pub http_proxy: Option<String>,

    /// Proxy for `https` hops.
    pub https_proxy: Option<String>,

    /// Tunnel through the proxy instead of rewriting the target host.
    pub tunneling: bool,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout applied to every listener, in seconds.
    pub request_secs: u64,

    /// Idle timeout for pooled relay connections, in seconds.
    pub idle_secs: u64,

    /// Bounded drain period after `-quit` or a shutdown signal, in seconds.
    pub drain_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 10,
            idle_secs: 30,
            drain_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Verbose logging (request/response dumps at debug level).
    pub verbose: bool,

    /// Enable the metrics listener.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            metrics_enabled: true,
        }
    }
}

/// Chain interpreter configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ChainConfig {
    /// Seed for `-rnd`; unseeded draws come from the thread RNG.
    pub seed: Option<u64>,
}
