//! TLS configuration and certificate loading.
//!
//! The same certificate/key pair serves the HTTPS listener and identifies the
//! node as a client when it relays over HTTPS.

use std::fs;
use std::io;
use std::path::Path;

use axum_server::accept::{Accept, DefaultAcceptor};
use axum_server::tls_rustls::{RustlsAcceptor, RustlsConfig};
use futures_util::future::BoxFuture;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::server::TlsStream;
use tower_http::add_extension::AddExtension;

use crate::config::TlsConfig;
use crate::error::StartupError;

fn require_file(path: &Path, what: &str) -> Result<(), io::Error> {
    if !path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} file not found: {:?}", what, path),
        ));
    }
    Ok(())
}

/// Load TLS configuration for the HTTPS listener from certificate and key files.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, io::Error> {
    require_file(cert_path, "Certificate")?;
    require_file(key_path, "Private key")?;
    RustlsConfig::from_pem_file(cert_path, key_path).await
}

/// Client-side TLS material for the HTTPS relay transport.
pub struct ClientTlsMaterial {
    pub identity: reqwest::Identity,
    pub roots: Vec<reqwest::Certificate>,
}

impl std::fmt::Debug for ClientTlsMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientTlsMaterial")
            .field("roots", &self.roots.len())
            .finish_non_exhaustive()
    }
}

/// Parse every certificate of a PEM bundle.
pub fn load_ca_bundle(path: &Path) -> Result<Vec<reqwest::Certificate>, StartupError> {
    let data = fs::read(path)
        .map_err(|e| StartupError::Tls(format!("failed to load root certificate from {:?}: {}", path, e)))?;
    let ders = rustls_pemfile::certs(&mut data.as_slice())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| StartupError::Tls(format!("failed to parse root certificate from {:?}: {}", path, e)))?;
    if ders.is_empty() {
        return Err(StartupError::Tls(format!(
            "failed to parse root certificate from {:?}: no certificates found",
            path
        )));
    }
    ders.iter()
        .map(|der| {
            reqwest::Certificate::from_der(der.as_ref())
                .map_err(|e| StartupError::Tls(format!("invalid root certificate in {:?}: {}", path, e)))
        })
        .collect()
}

impl ClientTlsMaterial {
    /// Load the client identity and extra trust roots. `None` when TLS is off.
    pub fn load(config: &TlsConfig) -> Result<Option<Self>, StartupError> {
        let (Some(cert_path), Some(key_path)) = (&config.cert, &config.key) else {
            return Ok(None);
        };
        tracing::info!("Initializing TLS");

        let cert = fs::read(cert_path)
            .map_err(|e| StartupError::Tls(format!("failed to load certificate {:?}: {}", cert_path, e)))?;
        let key = fs::read(key_path)
            .map_err(|e| StartupError::Tls(format!("failed to load key {:?}: {}", key_path, e)))?;
        let identity = reqwest::Identity::from_pkcs8_pem(&cert, &key)
            .map_err(|e| StartupError::Tls(format!("failed to load client certificate or key: {}", e)))?;

        let roots = match &config.cacert {
            Some(path) => load_ca_bundle(path)?,
            None => Vec::new(),
        };

        Ok(Some(Self { identity, roots }))
    }
}

/// Negotiated parameters of an inbound TLS connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsInfo {
    pub version: String,
    pub cipher: String,
    pub protocol: String,
    pub server_name: String,
}

impl std::fmt::Display for TlsInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TLS version {}, cipher {}, protocol {}, server name {}",
            self.version, self.cipher, self.protocol, self.server_name
        )
    }
}

/// Rustls acceptor that stores the negotiated [`TlsInfo`] in every request
/// of the connection.
#[derive(Clone)]
pub struct TlsInfoAcceptor {
    inner: RustlsAcceptor<DefaultAcceptor>,
}

impl TlsInfoAcceptor {
    pub fn new(config: RustlsConfig) -> Self {
        Self {
            inner: RustlsAcceptor::new(config),
        }
    }
}

impl<I, S> Accept<I, S> for TlsInfoAcceptor
where
    I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    S: Send + 'static,
{
    type Stream = TlsStream<I>;
    type Service = AddExtension<S, TlsInfo>;
    type Future = BoxFuture<'static, io::Result<(Self::Stream, Self::Service)>>;

    fn accept(&self, stream: I, service: S) -> Self::Future {
        let acceptor = self.inner.clone();
        Box::pin(async move {
            let (stream, service) = acceptor.accept(stream, service).await?;
            let (_, session) = stream.get_ref();
            let info = TlsInfo {
                version: session
                    .protocol_version()
                    .map(|v| format!("{:?}", v))
                    .unwrap_or_default(),
                cipher: session
                    .negotiated_cipher_suite()
                    .map(|suite| format!("{:?}", suite.suite()))
                    .unwrap_or_default(),
                protocol: session
                    .alpn_protocol()
                    .map(|p| String::from_utf8_lossy(p).into_owned())
                    .unwrap_or_default(),
                server_name: session.server_name().unwrap_or_default().to_string(),
            };
            tracing::debug!(tls = %info, "TLS handshake complete");
            Ok((stream, AddExtension::new(service, info)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tls_info_renders_like_a_trace_line() {
        let info = TlsInfo {
            version: "TLSv1_3".into(),
            cipher: "TLS13_AES_128_GCM_SHA256".into(),
            protocol: "h2".into(),
            server_name: "hop1".into(),
        };
        assert_eq!(
            info.to_string(),
            "TLS version TLSv1_3, cipher TLS13_AES_128_GCM_SHA256, protocol h2, server name hop1"
        );
    }

    #[test]
    fn tls_disabled_loads_nothing() {
        assert!(ClientTlsMaterial::load(&TlsConfig::default()).unwrap().is_none());
    }

    #[test]
    fn missing_bundle_is_an_error() {
        let err = load_ca_bundle(Path::new("/nonexistent/ca.pem")).unwrap_err();
        assert!(err.to_string().contains("failed to load root certificate"));
    }

    #[tokio::test]
    async fn missing_server_files_are_reported() {
        let err = load_tls_config(Path::new("/nonexistent/cert.pem"), Path::new("/nonexistent/key.pem"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
