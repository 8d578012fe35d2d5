//! Listener binding.

use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::error::StartupError;

/// Parse a configured `host:port` address.
pub fn socket_addr(address: &str) -> Result<SocketAddr, StartupError> {
    address.parse().map_err(|e| {
        StartupError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid listen address {:?}: {}", address, e),
        ))
    })
}

/// Bind a TCP listener and log where it ended up.
pub async fn bind(address: &str, role: &'static str) -> Result<TcpListener, StartupError> {
    let listener = TcpListener::bind(socket_addr(address)?).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, role, "Listener bound");
    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses_must_be_socket_addresses() {
        assert_eq!(socket_addr("0.0.0.0:80").unwrap().port(), 80);
        assert!(socket_addr("[::1]:8443").unwrap().is_ipv6());
        assert!(socket_addr("localhost:80").is_err());
    }

    #[tokio::test]
    async fn binds_ephemeral_port() {
        let listener = bind("127.0.0.1:0", "test").await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }
}
