//! The HELO → TRUSTED trust handshake.
//!
//! Both sides send a HELO immediately on connect. Each side that receives
//! a HELO replies with its own TRUSTED carrying fresh session key material
//! encrypted for the peer. A connection only enters [`ConnectionState::Trusted`]
//! once *both* the outbound TRUSTED has been sent (this side's `tx_key` is
//! committed) and the peer's TRUSTED has been received and decrypted (this
//! side's `rx_key` is known) — only at that point are both the send and
//! receive session keys actually present, so a trusted connection can
//! always encrypt and decrypt frames in both directions (see DESIGN.md for
//! the reasoning behind fixing this ordering).

use super::{ConnectionState, Session};
use crate::context::PeerContext;
use crate::error::{PeerError, Result};
use crate::events::Event;
use crate::message::{Message, MessageType};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ringnet_crypto::symmetric::SessionKey;
use ringnet_crypto::{asymmetric, identity::Identity};
use ringnet_discovery::candidate::CandidateAddress;
use rsa::RsaPublicKey;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Serialize, Deserialize)]
struct HeloBody {
    #[serde(rename = "publicKey")]
    public_key: String,
    signature: String,
}

#[derive(Serialize, Deserialize)]
struct Listening {
    port: u16,
    address: String,
}

#[derive(Serialize, Deserialize)]
struct GossipPeer {
    address: String,
    signature: String,
}

#[derive(Serialize, Deserialize)]
struct TrustedBody {
    key: String,
    iv: String,
    peers: Vec<GossipPeer>,
    listening: Listening,
    #[serde(rename = "requireConfirmation")]
    require_confirmation: bool,
}

/// Send the initial HELO on a freshly opened connection: each side sends
/// one immediately.
pub async fn send_helo(identity: &Identity, session: &Session) -> Result<()> {
    let body = HeloBody {
        public_key: asymmetric::public_key_to_pem(identity.public_key())?,
        signature: BASE64.encode(identity.ring_signature()),
    };
    let message = Message::new(MessageType::Helo, serde_json::to_value(&body)?);
    session.send_frame(&message.to_frame()?).await
}

/// Handle an inbound HELO frame. Closes the connection without reply on
/// self-connect or admission failure; otherwise replies with this side's
/// TRUSTED.
pub async fn handle_helo(ctx: &PeerContext, session: &Arc<Session>, message: &Message) -> Result<()> {
    let body: HeloBody = serde_json::from_value(message.body.clone())
        .map_err(|e| PeerError::Admission(format!("malformed HELO body: {e}").into()))?;

    let peer_signature = BASE64
        .decode(&body.signature)
        .map_err(|e| PeerError::Admission(format!("malformed HELO signature: {e}").into()))?;
    let peer_public_key = asymmetric::public_key_from_pem(&body.public_key)
        .map_err(|e| PeerError::Admission(format!("malformed HELO public key: {e}").into()))?;

    if peer_signature == ctx.identity.ring_signature() {
        warn!(remote = %session.remote_address(), "self-connect detected, closing");
        session.close(1000).await?;
        return Err(PeerError::admission("self-connect"));
    }

    if ctx.identity.verify_peer(&peer_public_key, &peer_signature).is_err() {
        warn!(remote = %session.remote_address(), "HELO failed ring verification, closing");
        session.close(1000).await?;
        return Err(PeerError::admission("ring signature did not verify"));
    }

    session.set_peer(peer_public_key.clone(), peer_signature.clone()).await;

    let tx = SessionKey::generate();
    send_trusted(ctx, session, &peer_public_key, &peer_signature, &tx).await?;
    session.set_tx_key(tx).await;

    debug!(remote = %session.remote_address(), "sent TRUSTED in response to HELO");
    Ok(())
}

async fn send_trusted(
    ctx: &PeerContext,
    session: &Session,
    peer_public_key: &RsaPublicKey,
    peer_signature: &[u8],
    tx: &SessionKey,
) -> Result<()> {
    let peers = ctx
        .peer_table
        .peer_list(&[peer_signature.to_vec()])
        .await
        .into_iter()
        .map(|entry| GossipPeer {
            address: entry.address,
            signature: BASE64.encode(entry.signature),
        })
        .collect();

    let body = TrustedBody {
        key: BASE64.encode(asymmetric::encrypt_for(peer_public_key, &tx.key)?),
        iv: BASE64.encode(asymmetric::encrypt_for(peer_public_key, &tx.iv)?),
        peers,
        listening: Listening {
            port: ctx.config.listen_port,
            address: ctx.config.public_address.clone(),
        },
        require_confirmation: ctx.config.require_confirmation,
    };
    let body_value = serde_json::to_value(&body)?;
    let body_json = body_value.to_string();
    let signature = BASE64.encode(asymmetric::sign(ctx.identity.private_key(), body_json.as_bytes())?);

    let message = Message::new(MessageType::Trusted, body_value).with_signature(signature);
    session.send_frame(&message.to_frame()?).await
}

/// Handle an inbound TRUSTED frame.
pub async fn handle_trusted(ctx: &PeerContext, session: &Arc<Session>, message: &Message) -> Result<()> {
    if session.tx_key().await.is_none() {
        warn!(remote = %session.remote_address(), "TRUSTED received before this side sent its own, out of order");
        return Err(PeerError::session("TRUSTED received out of order"));
    }

    let peer_public_key = session
        .peer_public_key()
        .await
        .ok_or_else(|| PeerError::session("TRUSTED received before HELO"))?;
    let peer_signature = session
        .peer_ring_signature()
        .await
        .ok_or_else(|| PeerError::session("TRUSTED received before HELO"))?;

    let signature = message
        .header
        .signature
        .as_deref()
        .ok_or_else(|| PeerError::session("TRUSTED missing header signature"))?;
    let signature_bytes = BASE64
        .decode(signature)
        .map_err(|e| PeerError::Session(format!("malformed TRUSTED signature: {e}").into()))?;
    let body_json = message.body.to_string();
    asymmetric::verify(&peer_public_key, body_json.as_bytes(), &signature_bytes)
        .map_err(|_| PeerError::session("TRUSTED body signature did not verify"))?;

    let body: TrustedBody = serde_json::from_value(message.body.clone())
        .map_err(|e| PeerError::Session(format!("malformed TRUSTED body: {e}").into()))?;

    let rx_key = asymmetric::decrypt_own(
        ctx.identity.private_key(),
        &BASE64
            .decode(&body.key)
            .map_err(|e| PeerError::Session(format!("malformed key field: {e}").into()))?,
    )?;
    let rx_iv = asymmetric::decrypt_own(
        ctx.identity.private_key(),
        &BASE64
            .decode(&body.iv)
            .map_err(|e| PeerError::Session(format!("malformed iv field: {e}").into()))?,
    )?;
    let rx_key: [u8; 32] = rx_key
        .try_into()
        .map_err(|_| PeerError::session("decrypted tx_key had the wrong length"))?;
    let rx_iv: [u8; 16] = rx_iv
        .try_into()
        .map_err(|_| PeerError::session("decrypted tx_iv had the wrong length"))?;

    session.set_rx_key(SessionKey::from_parts(rx_key, rx_iv)).await;
    session
        .set_reported_listening(body.listening.address.clone(), body.listening.port)
        .await;
    session.set_require_confirmation(body.require_confirmation).await;
    session.set_state(ConnectionState::Trusted).await;

    ctx.peer_table.insert(peer_signature.clone(), session.clone()).await;
    info!(remote = %session.remote_address(), "connection trusted");
    ctx.events.emit(Event::Connection {
        ring_signature: peer_signature,
        remote_address: session.remote_address().to_string(),
    });

    if intake_gossip(ctx, &body.peers).await {
        debug!("gossip intake appended new candidates, restarting discovery");
        tokio::spawn(crate::discovery::run_pass(Arc::new(ctx.clone())));
    }
    Ok(())
}

/// Feed the gossiped peer list into the discovery queue. Returns whether
/// anything new was appended.
async fn intake_gossip(ctx: &PeerContext, peers: &[GossipPeer]) -> bool {
    let connected: Vec<Vec<u8>> = ctx.peer_table.all().await.into_iter().map(|(sig, _)| sig).collect();
    let own_signature = ctx.identity.ring_signature().to_vec();
    let candidates: Vec<CandidateAddress> = peers
        .iter()
        .filter_map(|p| BASE64.decode(&p.signature).ok().map(|sig| (p, sig)))
        .map(|(p, sig)| CandidateAddress::new(p.address.clone(), Some(sig)))
        .collect();

    let mut queue = ctx.discovery_queue.lock().await;
    ringnet_discovery::engine::intake_gossip(&mut queue, candidates, |candidate| {
        candidate.signature() == Some(own_signature.as_slice())
            || connected.iter().any(|c| Some(c.as_slice()) == candidate.signature())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PeerConfig;
    use crate::context::PeerContext;
    use crate::events::EventBus;
    use crate::peer_table::PeerTable;
    use async_trait::async_trait;
    use ringnet_crypto::asymmetric::generate_keypair;
    use ringnet_crypto::identity::issue_ring_signature;
    use ringnet_discovery::DiscoveryQueue;
    use ringnet_transport::{Frame, Transport, TransportConnection};
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Mutex;

    struct RecordingConnection {
        sent: Arc<StdMutex<Vec<String>>>,
    }

    #[async_trait]
    impl TransportConnection for RecordingConnection {
        async fn send_text(&self, frame: &str) -> ringnet_transport::error::Result<()> {
            self.sent.lock().unwrap().push(frame.to_string());
            Ok(())
        }
        async fn recv_text(&self) -> ringnet_transport::error::Result<Frame> {
            Ok(Frame::Closed { code: 1000 })
        }
        async fn close(&self, _code: u16) -> ringnet_transport::error::Result<()> {
            Ok(())
        }
        fn remote_address(&self) -> &str {
            "recording"
        }
    }

    struct NullTransport;

    #[async_trait]
    impl Transport for NullTransport {
        async fn dial(&self, _url: &str) -> ringnet_transport::error::Result<Arc<dyn TransportConnection>> {
            std::future::pending().await
        }
        async fn accept(&self) -> ringnet_transport::error::Result<Arc<dyn TransportConnection>> {
            std::future::pending().await
        }
    }

    fn test_identity(ring_sk: &rsa::RsaPrivateKey, ring_pk: &rsa::RsaPublicKey) -> Identity {
        let (sk, pk) = generate_keypair().unwrap();
        let sig = issue_ring_signature(ring_sk, &pk).unwrap();
        Identity::new(sk, pk, sig, ring_pk.clone()).unwrap()
    }

    fn test_ctx(identity: Identity, listen_port: u16) -> Arc<PeerContext> {
        Arc::new(PeerContext {
            identity: Arc::new(identity),
            peer_table: Arc::new(PeerTable::new()),
            discovery_queue: Arc::new(Mutex::new(DiscoveryQueue::new())),
            events: Arc::new(EventBus::new()),
            transport: Arc::new(NullTransport),
            config: PeerConfig {
                listen_port,
                public_address: format!("127.0.0.1:{listen_port}"),
                ..PeerConfig::default()
            },
        })
    }

    /// Drives two sessions through `send_helo`/`handle_helo`/`handle_trusted`
    /// directly, the way `connection::run` does, rather than setting state by
    /// hand. Catches regressions in the out-of-order guard that hand-built
    /// `Trusted` test doubles elsewhere in this crate cannot.
    #[tokio::test]
    async fn two_sides_reach_trusted_through_the_real_handshake_functions() {
        let (ring_sk, ring_pk) = generate_keypair().unwrap();
        let identity_a = test_identity(&ring_sk, &ring_pk);
        let identity_b = test_identity(&ring_sk, &ring_pk);
        let ctx_a = test_ctx(identity_a, 26781);
        let ctx_b = test_ctx(identity_b, 26782);

        let sent_a = Arc::new(StdMutex::new(Vec::new()));
        let sent_b = Arc::new(StdMutex::new(Vec::new()));
        let session_a = Arc::new(Session::new(Arc::new(RecordingConnection { sent: sent_a.clone() })));
        let session_b = Arc::new(Session::new(Arc::new(RecordingConnection { sent: sent_b.clone() })));

        fn take(buf: &Arc<StdMutex<Vec<String>>>, index: usize) -> Message {
            let frames = buf.lock().unwrap();
            Message::from_frame(&frames[index]).unwrap()
        }

        send_helo(&ctx_a.identity, &session_a).await.unwrap();
        send_helo(&ctx_b.identity, &session_b).await.unwrap();

        let helo_from_a = take(&sent_a, 0);
        let helo_from_b = take(&sent_b, 0);

        handle_helo(&ctx_b, &session_b, &helo_from_a).await.unwrap();
        handle_helo(&ctx_a, &session_a, &helo_from_b).await.unwrap();

        assert_eq!(sent_a.lock().unwrap().len(), 2);
        assert_eq!(sent_b.lock().unwrap().len(), 2);

        let trusted_from_a = take(&sent_a, 1);
        let trusted_from_b = take(&sent_b, 1);

        handle_trusted(&ctx_b, &session_b, &trusted_from_a).await.unwrap();
        handle_trusted(&ctx_a, &session_a, &trusted_from_b).await.unwrap();

        assert!(session_a.is_trusted().await);
        assert!(session_b.is_trusted().await);
        assert!(ctx_a.peer_table.contains(ctx_b.identity.ring_signature()).await);
        assert!(ctx_b.peer_table.contains(ctx_a.identity.ring_signature()).await);
    }

    #[tokio::test]
    async fn a_trusted_frame_arriving_before_this_side_has_sent_its_own_is_rejected() {
        let (ring_sk, ring_pk) = generate_keypair().unwrap();
        let identity_a = test_identity(&ring_sk, &ring_pk);
        let ctx_b = test_ctx(test_identity(&ring_sk, &ring_pk), 26782);

        let session_b = Arc::new(Session::new(Arc::new(RecordingConnection {
            sent: Arc::new(StdMutex::new(Vec::new())),
        })));

        // B never sent its own TRUSTED (its tx_key is unset), so a TRUSTED
        // arriving now, however well-formed its sender made it, is out of
        // order and must be rejected before any of its fields are trusted.
        session_b.set_peer(identity_a.public_key().clone(), identity_a.ring_signature().to_vec()).await;

        let bogus_trusted = Message::new(
            MessageType::Trusted,
            serde_json::json!({
                "key": "",
                "iv": "",
                "peers": [],
                "listening": {"port": 0, "address": ""},
                "requireConfirmation": false,
            }),
        )
        .with_signature(String::new());

        let err = handle_trusted(&ctx_b, &session_b, &bogus_trusted).await.unwrap_err();
        assert!(matches!(err, PeerError::Session(_)));
        assert!(!session_b.is_trusted().await);
    }
}
