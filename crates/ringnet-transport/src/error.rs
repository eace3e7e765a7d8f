//! Error types for ringnet-transport.

use thiserror::Error;

/// Transport-layer errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// I/O error from the underlying socket.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS handshake or configuration failure.
    #[error("TLS error: {0}")]
    Tls(String),

    /// WebSocket handshake or framing failure.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// The connection was already closed.
    #[error("connection closed")]
    Closed,

    /// The listener failed to bind.
    #[error("failed to bind listener: {0}")]
    BindFailed(String),

    /// A dial target could not be parsed or reached.
    #[error("dial failed: {0}")]
    DialFailed(String),
}

/// Result type for ringnet-transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
