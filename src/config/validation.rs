//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Check proxy URLs and TLS file pairing
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: NodeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use url::Url;

use crate::config::schema::NodeConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn push(errors: &mut Vec<ValidationError>, field: &'static str, message: impl Into<String>) {
    errors.push(ValidationError {
        field,
        message: message.into(),
    });
}

/// Parse a proxy URL, requiring an http(s) scheme and a host.
pub fn parse_proxy_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported proxy scheme {:?}", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("proxy URL has no host".to_string());
    }
    Ok(url)
}

/// Validate a configuration, collecting every problem.
pub fn validate_config(config: &NodeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let listener = &config.listener;
    if listener.interface.is_empty() {
        push(&mut errors, "listener.interface", "must not be empty");
    }
    if listener.http_port == 0 {
        push(&mut errors, "listener.http_port", "must be non-zero");
    }
    if config.tls.enabled() && listener.https_port == 0 {
        push(&mut errors, "listener.https_port", "must be non-zero");
    }
    if config.observability.metrics_enabled && listener.metrics_port == 0 {
        push(&mut errors, "listener.metrics_port", "must be non-zero");
    }

    if config.tls.cert.is_some() != config.tls.key.is_some() {
        push(&mut errors, "tls", "cert and key must be given together");
    }

    for (field, value) in [
        ("proxy.http_proxy", &config.proxy.http_proxy),
        ("proxy.https_proxy", &config.proxy.https_proxy),
    ] {
        if let Some(raw) = value.as_deref().filter(|raw| !raw.is_empty()) {
            if let Err(reason) = parse_proxy_url(raw) {
                push(&mut errors, field, format!("{:?}: {}", raw, reason));
            }
        }
    }

    if config.timeouts.request_secs == 0 {
        push(&mut errors, "timeouts.request_secs", "must be greater than 0");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&NodeConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = NodeConfig::default();
        config.listener.http_port = 0;
        config.tls.cert = Some(PathBuf::from("cert.pem"));
        config.proxy.https_proxy = Some("ftp://proxy".into());
        config.timeouts.request_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.http_port",
                "tls",
                "proxy.https_proxy",
                "timeouts.request_secs"
            ]
        );
    }

    #[test]
    fn empty_proxy_means_none() {
        let mut config = NodeConfig::default();
        config.proxy.http_proxy = Some(String::new());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn proxy_url_needs_host() {
        assert!(parse_proxy_url("http://proxy:3128").is_ok());
        assert!(parse_proxy_url("not a url").is_err());
    }
}
