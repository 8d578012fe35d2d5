//! Command-line flags and environment overrides.
//!
//! Flags are layered on top of the (optional) TOML file: anything given on
//! the command line or through its environment variable wins.

use clap::Parser;
use std::path::PathBuf;

use crate::config::loader::{read_config, ConfigError};
use crate::config::schema::NodeConfig;
use crate::config::validation::validate_config;

#[derive(Parser, Debug, Default)]
#[command(name = "hop")]
#[command(about = "Synthetic call-chain HTTP node", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Port for HTTP
    #[arg(long, alias = "port_http", env = "PORT")]
    pub port_http: Option<u16>,

    /// Port for HTTPS
    #[arg(long, alias = "port_https", env = "PORT_HTTPS")]
    pub port_https: Option<u16>,

    /// Port for Prometheus metrics
    #[arg(long, alias = "port_metrics")]
    pub port_metrics: Option<u16>,

    /// HTTP proxy
    #[arg(long, alias = "http_proxy", env = "http_proxy")]
    pub http_proxy: Option<String>,

    /// HTTPS proxy
    #[arg(long, alias = "https_proxy", env = "https_proxy")]
    pub https_proxy: Option<String>,

    /// Tunnel through the proxy (otherwise only the target host is rewritten)
    #[arg(long, alias = "proxy_tunneling")]
    pub proxy_tunneling: bool,

    /// CA certificate
    #[arg(long)]
    pub cacert: Option<PathBuf>,

    /// Certificate
    #[arg(long)]
    pub cert: Option<PathBuf>,

    /// Key
    #[arg(long)]
    pub key: Option<PathBuf>,

    /// The interface to listen on
    #[arg(long)]
    pub interface: Option<String>,

    /// Seed for -rnd draws
    #[arg(long)]
    pub seed: Option<u64>,

    /// Drain period for graceful shutdown, in seconds
    #[arg(long, alias = "drain_secs")]
    pub drain_secs: Option<u64>,
}

impl Cli {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(self, config: &mut NodeConfig) {
        if self.verbose {
            config.observability.verbose = true;
        }
        if let Some(port) = self.port_http {
            config.listener.http_port = port;
        }
        if let Some(port) = self.port_https {
            config.listener.https_port = port;
        }
        if let Some(port) = self.port_metrics {
            config.listener.metrics_port = port;
        }
        if let Some(proxy) = self.http_proxy {
            config.proxy.http_proxy = Some(proxy);
        }
        if let Some(proxy) = self.https_proxy {
            config.proxy.https_proxy = Some(proxy);
        }
        if self.proxy_tunneling {
            config.proxy.tunneling = true;
        }
        if let Some(path) = self.cacert {
            config.tls.cacert = Some(path);
        }
        if let Some(path) = self.cert {
            config.tls.cert = Some(path);
        }
        if let Some(path) = self.key {
            config.tls.key = Some(path);
        }
        if let Some(interface) = self.interface {
            config.listener.interface = interface;
        }
        if let Some(seed) = self.seed {
            config.chain.seed = Some(seed);
        }
        if let Some(secs) = self.drain_secs {
            config.timeouts.drain_secs = secs;
        }
    }

    /// Build the effective configuration: file, then flags, then validation.
    pub fn resolve(mut self) -> Result<NodeConfig, ConfigError> {
        let mut config = match self.config.take() {
            Some(path) => read_config(&path)?,
            None => NodeConfig::default(),
        };
        self.apply(&mut config);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}
