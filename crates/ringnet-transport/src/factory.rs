//! Factory for constructing a configured [`WsTlsTransport`].
//!
//! Callers describe what they want (bind address, certificate, key) and
//! the factory does the file I/O and TLS plumbing.

use crate::error::{Result, TransportError};
use crate::ws::WsTlsTransport;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tokio_rustls::rustls::{Certificate, PrivateKey};

/// Configuration for creating the node's listening transport.
#[derive(Debug, Clone)]
pub struct TransportFactoryConfig {
    /// Local address to bind to.
    pub bind_addr: SocketAddr,
    /// Path to a PEM certificate chain for TLS termination.
    pub cert_path: PathBuf,
    /// Path to the matching PEM private key.
    pub key_path: PathBuf,
}

impl TransportFactoryConfig {
    /// Create a new configuration.
    pub fn new(bind_addr: SocketAddr, cert_path: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Self {
        Self {
            bind_addr,
            cert_path: cert_path.into(),
            key_path: key_path.into(),
        }
    }
}

/// Builds a bound [`WsTlsTransport`] from a [`TransportFactoryConfig`].
pub struct TransportFactory;

impl TransportFactory {
    /// Load the certificate and key from disk and bind a listener.
    pub async fn create(config: TransportFactoryConfig) -> Result<WsTlsTransport> {
        let cert_chain = load_cert_chain(&config.cert_path)?;
        let private_key = load_private_key(&config.key_path)?;
        WsTlsTransport::bind(config.bind_addr, cert_chain, private_key).await
    }
}

fn load_cert_chain(path: &Path) -> Result<Vec<Certificate>> {
    let bytes = std::fs::read(path).map_err(TransportError::Io)?;
    let mut reader = std::io::BufReader::new(bytes.as_slice());
    let certs = rustls_pemfile::certs(&mut reader)
        .map_err(|e| TransportError::Tls(format!("malformed certificate at {}: {e}", path.display())))?;
    if certs.is_empty() {
        return Err(TransportError::Tls(format!(
            "no certificates found in {}",
            path.display()
        )));
    }
    Ok(certs.into_iter().map(Certificate).collect())
}

fn load_private_key(path: &Path) -> Result<PrivateKey> {
    let bytes = std::fs::read(path).map_err(TransportError::Io)?;
    let mut reader = std::io::BufReader::new(bytes.as_slice());
    let keys = rustls_pemfile::pkcs8_private_keys(&mut reader)
        .map_err(|e| TransportError::Tls(format!("malformed private key at {}: {e}", path.display())))?;
    keys.into_iter()
        .next()
        .map(PrivateKey)
        .ok_or_else(|| TransportError::Tls(format!("no private key found in {}", path.display())))
}
