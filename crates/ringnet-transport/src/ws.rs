//! TLS WebSocket implementation of [`Transport`]/[`TransportConnection`].
//!
//! A ringnet node speaks one text frame per protocol message over a
//! WebSocket connection, wrapped in TLS, dialed as `wss://host:port`. The
//! server side terminates TLS itself with a certificate/key pair rather
//! than delegating to a reverse proxy, since the overlay has no such proxy
//! in front of it.

use crate::connection::{Frame, Transport, TransportConnection};
use crate::error::{Result, TransportError};
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_rustls::rustls::{self, Certificate, PrivateKey};
use tokio_rustls::TlsAcceptor;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::debug;

type ServerStream = tokio_rustls::server::TlsStream<TcpStream>;
type ClientStream = MaybeTlsStream<TcpStream>;

enum Socket {
    Server(WebSocketStream<ServerStream>),
    Client(WebSocketStream<ClientStream>),
}

/// A connected WebSocket, split into independently lockable read/write
/// halves so `send_text` and `recv_text` don't contend with each other.
pub struct WsConnection {
    remote: String,
    reader: Mutex<Reader>,
    writer: Mutex<Writer>,
}

enum Reader {
    Server(SplitStream<WebSocketStream<ServerStream>>),
    Client(SplitStream<WebSocketStream<ClientStream>>),
}

enum Writer {
    Server(SplitSink<WebSocketStream<ServerStream>, WsMessage>),
    Client(SplitSink<WebSocketStream<ClientStream>, WsMessage>),
}

impl WsConnection {
    fn new(remote: String, socket: Socket) -> Self {
        let (reader, writer) = match socket {
            Socket::Server(s) => {
                let (w, r) = s.split();
                (Reader::Server(r), Writer::Server(w))
            }
            Socket::Client(s) => {
                let (w, r) = s.split();
                (Reader::Client(r), Writer::Client(w))
            }
        };
        Self {
            remote,
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
        }
    }
}

#[async_trait]
impl TransportConnection for WsConnection {
    async fn send_text(&self, frame: &str) -> Result<()> {
        let msg = WsMessage::Text(frame.to_string());
        let mut writer = self.writer.lock().await;
        let result = match &mut *writer {
            Writer::Server(w) => w.send(msg).await,
            Writer::Client(w) => w.send(msg).await,
        };
        result.map_err(|e| TransportError::WebSocket(e.to_string()))
    }

    async fn recv_text(&self) -> Result<Frame> {
        let mut reader = self.reader.lock().await;
        let next = match &mut *reader {
            Reader::Server(r) => r.next().await,
            Reader::Client(r) => r.next().await,
        };
        match next {
            Some(Ok(WsMessage::Text(text))) => Ok(Frame::Text(text)),
            Some(Ok(WsMessage::Close(frame))) => Ok(Frame::Closed {
                code: frame.map(|f| u16::from(f.code)).unwrap_or(1000),
            }),
            Some(Ok(_)) => {
                debug!(remote = %self.remote, "ignoring non-text frame");
                Ok(Frame::Closed { code: 1003 })
            }
            Some(Err(e)) => Err(TransportError::WebSocket(e.to_string())),
            None => Ok(Frame::Closed { code: 1006 }),
        }
    }

    async fn close(&self, code: u16) -> Result<()> {
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: "".into(),
        };
        let msg = WsMessage::Close(Some(frame));
        let mut writer = self.writer.lock().await;
        let result = match &mut *writer {
            Writer::Server(w) => w.send(msg).await,
            Writer::Client(w) => w.send(msg).await,
        };
        result.map_err(|e| TransportError::WebSocket(e.to_string()))
    }

    fn remote_address(&self) -> &str {
        &self.remote
    }
}

/// TLS WebSocket transport: a bound listener for inbound connections, and
/// a dialer for outbound ones.
pub struct WsTlsTransport {
    listener: TcpListener,
    acceptor: TlsAcceptor,
    local_addr: SocketAddr,
}

impl WsTlsTransport {
    /// Bind a listener at `bind_addr` and prepare it to terminate TLS with
    /// the given certificate chain and private key.
    pub async fn bind(
        bind_addr: SocketAddr,
        cert_chain: Vec<Certificate>,
        private_key: PrivateKey,
    ) -> Result<Self> {
        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|e| TransportError::BindFailed(e.to_string()))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| TransportError::BindFailed(e.to_string()))?;

        let server_config = rustls::ServerConfig::builder()
            .with_safe_defaults()
            .with_no_client_auth()
            .with_single_cert(cert_chain, private_key)
            .map_err(|e| TransportError::Tls(e.to_string()))?;
        let acceptor = TlsAcceptor::from(Arc::new(server_config));

        Ok(Self {
            listener,
            acceptor,
            local_addr,
        })
    }

    /// The address actually bound (useful when `bind_addr`'s port was 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[async_trait]
impl Transport for WsTlsTransport {
    async fn dial(&self, url: &str) -> Result<Arc<dyn TransportConnection>> {
        let (ws_stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| TransportError::DialFailed(e.to_string()))?;
        debug!(%url, "dialed peer");
        Ok(Arc::new(WsConnection::new(
            url.to_string(),
            Socket::Client(ws_stream),
        )))
    }

    async fn accept(&self) -> Result<Arc<dyn TransportConnection>> {
        let (tcp_stream, remote_addr) = self.listener.accept().await?;
        let tls_stream = self
            .acceptor
            .accept(tcp_stream)
            .await
            .map_err(|e| TransportError::Tls(e.to_string()))?;
        let ws_stream = tokio_tungstenite::accept_async(tls_stream)
            .await
            .map_err(|e| TransportError::WebSocket(e.to_string()))?;
        debug!(remote = %remote_addr, "accepted inbound connection");
        Ok(Arc::new(WsConnection::new(
            remote_addr.to_string(),
            Socket::Server(ws_stream),
        )))
    }
}
