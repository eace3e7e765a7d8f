//! Fan-out broadcast with per-target confirmation tracking and retry.
//!
//! Retries are enqueued as a fresh scheduled task per send attempt rather
//! than a recursive call back into `broadcast`, to keep stack depth
//! bounded. Each task re-reads the connection's `unconfirmed` list at
//! fire time, never at schedule time.

use crate::config::CONFIRMATION_RETRY_DELAY;
use crate::message::MessageType;
use crate::peer_table::PeerTable;
use crate::session::{data_channel, PendingMessage, Session};
use ringnet_crypto::Identity;
use std::sync::Arc;
use tracing::warn;

/// Publishes application messages to trusted peers and retries until
/// confirmed.
pub struct BroadcastRouter {
    identity: Arc<Identity>,
    peer_table: Arc<PeerTable>,
}

impl BroadcastRouter {
    pub fn new(identity: Arc<Identity>, peer_table: Arc<PeerTable>) -> Self {
        Self { identity, peer_table }
    }

    /// Send `body` as `message_type` to one connection (`target`) or fan
    /// out to every trusted connection.
    pub async fn broadcast(self: &Arc<Self>, message_type: MessageType, body: serde_json::Value, target: Option<&[u8]>) {
        match target {
            Some(signature) => {
                if let Some(session) = self.peer_table.get(signature).await {
                    self.send_to(signature.to_vec(), session, message_type, body).await;
                }
            }
            None => {
                for (signature, session) in self.peer_table.all().await {
                    self.send_to(signature, session, message_type.clone(), body.clone()).await;
                }
            }
        }
    }

    async fn send_to(self: &Arc<Self>, ring_signature: Vec<u8>, session: Arc<Session>, message_type: MessageType, body: serde_json::Value) {
        let trusted = session.is_trusted().await;
        // HELO frames are allowed through on untrusted connections for the
        // handshake path itself; everything else silently skips.
        if !trusted && !matches!(message_type, MessageType::Helo) {
            return;
        }

        match data_channel::send(&self.identity, &session, message_type.clone(), body.clone()).await {
            Ok((hash, timestamp)) => {
                session
                    .push_unconfirmed(PendingMessage {
                        message_type: message_type.clone(),
                        body: body.clone(),
                        hash: hash.clone(),
                        timestamp: timestamp.clone(),
                    })
                    .await;
                if !matches!(message_type, MessageType::Confirm) {
                    self.schedule_retry(ring_signature, session, hash, timestamp);
                }
            }
            Err(err) => {
                warn!(error = %err, "send failed, rescheduling through the broadcast path");
                let router = self.clone();
                tokio::spawn(async move {
                    router.send_to(ring_signature, session, message_type, body).await;
                });
            }
        }
    }

    fn schedule_retry(self: &Arc<Self>, ring_signature: Vec<u8>, session: Arc<Session>, hash: String, timestamp: String) {
        let router = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(CONFIRMATION_RETRY_DELAY).await;
            // Re-read the unconfirmed list at fire time, not at schedule
            // time: a CONFIRM may have landed in the meantime.
            let Some(pending) = session.take_unconfirmed(&hash, &timestamp).await else {
                return;
            };
            router
                .send_to(ring_signature, session, pending.message_type, pending.body)
                .await;
        });
    }
}
