//! Error types for the hop node.
//!
//! Every error raised while interpreting a chain is *recorded*: it becomes a
//! trace line and execution moves on. Only [`StartupError`] is fatal.

use thiserror::Error;

/// A failure while executing one step of the chain.
#[derive(Error, Debug)]
pub enum ChainError {
    /// Malformed hop address or URL.
    #[error("cannot parse {input:?}: {reason}")]
    Parse { input: String, reason: String },

    /// Missing or invalid directive argument.
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    /// Directive name outside the known set.
    #[error("no such directive")]
    UnknownDirective,

    /// DNS, TLS or connection failure on the relay.
    #[error("{0}")]
    Transport(String),

    /// The relay needs something that was never configured.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Argument validation failures for a single directive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("missing argument")]
    Missing,

    #[error("missing '=' in {0:?}")]
    MissingValue(String),

    #[error("bad percent-encoding in {0:?}")]
    BadEncoding(String),

    #[error("{value:?} is not {expected}")]
    Invalid {
        value: String,
        expected: &'static str,
    },

    #[error("invalid header {0:?}")]
    InvalidHeader(String),
}

/// Fatal errors raised while bringing the node up.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::loader::ConfigError),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("proxy error: {0}")]
    Proxy(String),

    #[error("metrics error: {0}")]
    Metrics(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Flatten an error and its sources into one line.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_errors_render_reason() {
        let err = ChainError::from(ArgumentError::Invalid {
            value: "abc".into(),
            expected: "an integer",
        });
        assert_eq!(err.to_string(), "\"abc\" is not an integer");
        assert_eq!(ArgumentError::Missing.to_string(), "missing argument");
    }

    #[test]
    fn error_chain_includes_sources() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "connection refused");
        let err = StartupError::from(io);
        assert_eq!(error_chain(&err), "IO error: connection refused");
    }
}
