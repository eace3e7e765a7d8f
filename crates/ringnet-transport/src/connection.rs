//! The abstract text-frame transport: connect, accept, send-utf8,
//! receive-utf8, close, and close-reason events, over a TLS-secured
//! bidirectional channel.

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Close code used for a graceful, expected shutdown. Any other code on a
/// close event is an abnormal close and should drive reconnect.
pub const NORMAL_CLOSURE: u16 = 1000;

/// One item read from a connection: either a text frame or the connection
/// closing with a given code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Closed { code: u16 },
}

/// A single bidirectional text-frame connection to a remote peer.
#[async_trait]
pub trait TransportConnection: Send + Sync {
    /// Send one UTF-8 text frame.
    async fn send_text(&self, frame: &str) -> Result<()>;

    /// Receive the next frame: a text payload, or a close event.
    async fn recv_text(&self) -> Result<Frame>;

    /// Close the connection with the given code (use [`NORMAL_CLOSURE`] for
    /// a graceful shutdown).
    async fn close(&self, code: u16) -> Result<()>;

    /// The remote socket/authority address, for logging and gossip.
    fn remote_address(&self) -> &str;
}

/// Produces outbound connections (dial) and accepts inbound ones (listen).
///
/// Concrete implementations wrap a specific text-frame transport (e.g. TLS
/// WebSocket, see [`crate::ws`]); `ringnet-core` is written only against
/// this trait so the transport is swappable (the test suite substitutes an
/// in-process transport).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Dial a remote address, completing once the underlying connection
    /// (TLS + framing) is established. The trust handshake runs on top of
    /// the returned connection.
    async fn dial(&self, url: &str) -> Result<Arc<dyn TransportConnection>>;

    /// Wait for and accept the next inbound connection.
    async fn accept(&self) -> Result<Arc<dyn TransportConnection>>;
}
