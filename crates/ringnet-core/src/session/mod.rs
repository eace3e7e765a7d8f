//! The per-connection session: wraps an opaque transport handle and owns
//! everything the handshake and data channel need, as one struct rather
//! than a grab-bag of mutable fields hung off a connection object.

pub mod data_channel;
pub mod handshake;

use chrono::{DateTime, Utc};
use ringnet_crypto::symmetric::SessionKey;
use ringnet_transport::TransportConnection;
use rsa::RsaPublicKey;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handshake/connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    AwaitHelo,
    Trusted,
    Closed,
}

/// A message appended to a connection's `unconfirmed` list while waiting
/// for a CONFIRM. Retries rebuild the wire frame with a fresh
/// hash/timestamp: this tracks a specific send attempt, not a stable
/// logical id.
#[derive(Debug, Clone)]
pub struct PendingMessage {
    pub message_type: crate::message::MessageType,
    pub body: serde_json::Value,
    pub hash: String,
    pub timestamp: String,
}

/// Per-connection state: the transport handle plus everything the
/// handshake and data channel mutate.
pub struct Session {
    connection: Arc<dyn TransportConnection>,
    state: Mutex<ConnectionState>,
    reported_address: Mutex<Option<String>>,
    reported_port: Mutex<Option<u16>>,
    peer_public_key: Mutex<Option<RsaPublicKey>>,
    peer_ring_signature: Mutex<Option<Vec<u8>>>,
    tx: Mutex<Option<SessionKey>>,
    rx: Mutex<Option<SessionKey>>,
    require_confirmation: Mutex<bool>,
    unconfirmed: Mutex<Vec<PendingMessage>>,
    created_at: DateTime<Utc>,
    active_at: Mutex<DateTime<Utc>>,
}

impl Session {
    pub fn new(connection: Arc<dyn TransportConnection>) -> Self {
        let now = Utc::now();
        Self {
            connection,
            state: Mutex::new(ConnectionState::AwaitHelo),
            reported_address: Mutex::new(None),
            reported_port: Mutex::new(None),
            peer_public_key: Mutex::new(None),
            peer_ring_signature: Mutex::new(None),
            tx: Mutex::new(None),
            rx: Mutex::new(None),
            require_confirmation: Mutex::new(false),
            unconfirmed: Mutex::new(Vec::new()),
            created_at: now,
            active_at: Mutex::new(now),
        }
    }

    pub fn remote_address(&self) -> &str {
        self.connection.remote_address()
    }

    pub async fn state(&self) -> ConnectionState {
        *self.state.lock().await
    }

    pub async fn set_state(&self, state: ConnectionState) {
        *self.state.lock().await = state;
    }

    pub async fn is_trusted(&self) -> bool {
        matches!(self.state().await, ConnectionState::Trusted)
    }

    pub async fn peer_ring_signature(&self) -> Option<Vec<u8>> {
        self.peer_ring_signature.lock().await.clone()
    }

    pub async fn peer_public_key(&self) -> Option<RsaPublicKey> {
        self.peer_public_key.lock().await.clone()
    }

    pub async fn reported_address(&self) -> Option<String> {
        self.reported_address.lock().await.clone()
    }

    pub async fn reported_port(&self) -> Option<u16> {
        *self.reported_port.lock().await
    }

    pub async fn require_confirmation(&self) -> bool {
        *self.require_confirmation.lock().await
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub async fn active_at(&self) -> DateTime<Utc> {
        *self.active_at.lock().await
    }

    pub async fn touch(&self) {
        *self.active_at.lock().await = Utc::now();
    }

    pub async fn send_frame(&self, frame: &str) -> crate::error::Result<()> {
        self.connection.send_text(frame).await?;
        Ok(())
    }

    pub async fn recv_frame(&self) -> crate::error::Result<ringnet_transport::Frame> {
        Ok(self.connection.recv_text().await?)
    }

    pub async fn close(&self, code: u16) -> crate::error::Result<()> {
        self.set_state(ConnectionState::Closed).await;
        self.connection.close(code).await?;
        Ok(())
    }

    pub async fn set_peer(&self, public_key: RsaPublicKey, ring_signature: Vec<u8>) {
        *self.peer_public_key.lock().await = Some(public_key);
        *self.peer_ring_signature.lock().await = Some(ring_signature);
    }

    pub async fn set_reported_listening(&self, address: String, port: u16) {
        *self.reported_address.lock().await = Some(address);
        *self.reported_port.lock().await = Some(port);
    }

    pub async fn set_tx_key(&self, key: SessionKey) {
        *self.tx.lock().await = Some(key);
    }

    pub async fn set_rx_key(&self, key: SessionKey) {
        *self.rx.lock().await = Some(key);
    }

    pub async fn tx_key(&self) -> Option<SessionKey> {
        self.tx.lock().await.clone()
    }

    pub async fn rx_key(&self) -> Option<SessionKey> {
        self.rx.lock().await.clone()
    }

    pub async fn set_require_confirmation(&self, value: bool) {
        *self.require_confirmation.lock().await = value;
    }

    pub async fn push_unconfirmed(&self, message: PendingMessage) {
        self.unconfirmed.lock().await.push(message);
    }

    /// Remove an entry by exact (hash, timestamp) match, scanning from the
    /// tail.
    pub async fn confirm(&self, hash: &str, timestamp: &str) -> bool {
        let mut unconfirmed = self.unconfirmed.lock().await;
        if let Some(pos) = unconfirmed
            .iter()
            .rposition(|m| m.hash == hash && m.timestamp == timestamp)
        {
            unconfirmed.remove(pos);
            true
        } else {
            false
        }
    }

    /// Remove and return the matching pending entry, for a retry to rebuild
    /// a fresh frame from its logical type/body: retries regenerate the
    /// hash/timestamp rather than reusing the original.
    pub async fn take_unconfirmed(&self, hash: &str, timestamp: &str) -> Option<PendingMessage> {
        let mut unconfirmed = self.unconfirmed.lock().await;
        let pos = unconfirmed.iter().rposition(|m| m.hash == hash && m.timestamp == timestamp)?;
        Some(unconfirmed.remove(pos))
    }

    pub async fn is_unconfirmed(&self, hash: &str, timestamp: &str) -> bool {
        self.unconfirmed
            .lock()
            .await
            .iter()
            .any(|m| m.hash == hash && m.timestamp == timestamp)
    }
}
