//! The data channel: sign-then-encrypt on send, decrypt-then-verify on
//! receive. Runs once a connection is TRUSTED.

use super::{ConnectionState, Session};
use crate::context::PeerContext;
use crate::error::{PeerError, Result};
use crate::events::Event;
use crate::message::{ConfirmRef, Header, Message, MessageType};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ringnet_crypto::symmetric::SessionKey;
use ringnet_crypto::{asymmetric, identity::Identity};
use std::sync::Arc;
use tracing::{debug, warn};

/// A MESSAGE/CONFIRM frame, signed and encrypted and ready to write.
pub struct PreparedMessage {
    pub hash: String,
    pub timestamp: String,
    pub frame: String,
}

/// Build the wire frame for `message_type`/`body` under `tx`: sign the
/// serialized body, then encrypt it.
pub fn prepare(
    identity: &Identity,
    tx: &SessionKey,
    message_type: MessageType,
    body: serde_json::Value,
    confirm: Option<ConfirmRef>,
) -> Result<PreparedMessage> {
    let logical = Message::new(message_type.clone(), body.clone());
    let body_json = serde_json::to_string(&body)?;
    let signature = BASE64.encode(asymmetric::sign(identity.private_key(), body_json.as_bytes())?);
    let ciphertext = tx.encrypt(body_json.as_bytes())?;

    let wire = Message {
        header: Header {
            message_type,
            hash: logical.header.hash.clone(),
            timestamp: logical.header.timestamp.clone(),
            signature: Some(signature),
            confirm,
        },
        body: serde_json::Value::String(BASE64.encode(ciphertext)),
    };

    Ok(PreparedMessage {
        hash: logical.header.hash,
        timestamp: logical.header.timestamp,
        frame: wire.to_frame()?,
    })
}

/// Encrypt, sign, and send one application message on an already-TRUSTED
/// session. Returns the (hash, timestamp) identifying this send attempt,
/// for the caller to track in `unconfirmed`.
pub async fn send(
    identity: &Identity,
    session: &Session,
    message_type: MessageType,
    body: serde_json::Value,
) -> Result<(String, String)> {
    let tx = session
        .tx_key()
        .await
        .ok_or_else(|| PeerError::session("no tx key established on this connection"))?;
    let prepared = prepare(identity, &tx, message_type, body, None)?;
    session.send_frame(&prepared.frame).await?;
    Ok((prepared.hash, prepared.timestamp))
}

/// Send a CONFIRM acknowledging `(hash, timestamp)`. CONFIRM frames are
/// encrypted and signed like any other frame but bypass the
/// confirmation-retry logic themselves.
pub async fn send_confirm(identity: &Identity, session: &Session, hash: String, timestamp: String) -> Result<()> {
    let tx = session
        .tx_key()
        .await
        .ok_or_else(|| PeerError::session("no tx key established on this connection"))?;
    let confirm = ConfirmRef { hash, timestamp };
    let prepared = prepare(identity, &tx, MessageType::Confirm, serde_json::json!({}), Some(confirm))?;
    session.send_frame(&prepared.frame).await
}

/// Process a received MESSAGE or CONFIRM frame on a TRUSTED connection.
pub async fn handle_frame(ctx: &PeerContext, session: &Arc<Session>, message: &Message) -> Result<()> {
    if session.state().await != ConnectionState::Trusted {
        debug!(remote = %session.remote_address(), "dropping data frame on an untrusted connection");
        return Ok(());
    }

    let rx = session
        .rx_key()
        .await
        .ok_or_else(|| PeerError::session("no rx key established on this connection"))?;
    let peer_public_key = session
        .peer_public_key()
        .await
        .ok_or_else(|| PeerError::session("data frame on a connection with no peer key"))?;

    let ciphertext = match message.body.as_str() {
        Some(encoded) => match BASE64.decode(encoded) {
            Ok(bytes) => bytes,
            Err(_) => {
                debug!(remote = %session.remote_address(), "dropping frame with malformed base64 body");
                return Ok(());
            }
        },
        None => {
            debug!(remote = %session.remote_address(), "dropping frame with non-string body");
            return Ok(());
        }
    };

    let plaintext = match rx.decrypt(&ciphertext) {
        Ok(bytes) => bytes,
        Err(_) => {
            warn!(remote = %session.remote_address(), "decryption failed, dropping frame");
            return Ok(());
        }
    };

    let Some(signature) = message.header.signature.as_deref() else {
        debug!(remote = %session.remote_address(), "dropping unsigned data frame");
        return Ok(());
    };
    let Ok(signature_bytes) = BASE64.decode(signature) else {
        debug!(remote = %session.remote_address(), "dropping frame with malformed signature encoding");
        return Ok(());
    };
    if asymmetric::verify(&peer_public_key, &plaintext, &signature_bytes).is_err() {
        warn!(remote = %session.remote_address(), "signature verification failed, dropping frame");
        return Ok(());
    }

    let Ok(body) = serde_json::from_slice::<serde_json::Value>(&plaintext) else {
        debug!(remote = %session.remote_address(), "dropping frame with malformed body");
        return Ok(());
    };

    session.touch().await;

    match &message.header.message_type {
        MessageType::Confirm => handle_confirm(session, message).await,
        MessageType::Message | MessageType::Custom(_) => {
            handle_application_message(ctx, session, message, body).await?;
        }
        MessageType::Peers => {
            debug!(remote = %session.remote_address(), "ignoring standalone PEERS frame (unused outside TRUSTED gossip)");
        }
        MessageType::Helo | MessageType::Trusted => {
            debug!(remote = %session.remote_address(), "ignoring handshake frame on an already-trusted connection");
        }
    }
    Ok(())
}

async fn handle_confirm(session: &Arc<Session>, message: &Message) {
    let Some(confirm) = &message.header.confirm else {
        debug!(remote = %session.remote_address(), "CONFIRM frame missing header.confirm");
        return;
    };
    session.confirm(&confirm.hash, &confirm.timestamp).await;
}

async fn handle_application_message(
    ctx: &PeerContext,
    session: &Arc<Session>,
    message: &Message,
    body: serde_json::Value,
) -> Result<()> {
    let type_label = message.header.message_type.label();
    ctx.events.emit(Event::Message {
        message_type: type_label,
        body: body.clone(),
    });
    if let MessageType::Custom(name) = &message.header.message_type {
        ctx.events.emit(Event::Custom {
            name: name.clone(),
            body,
        });
    }

    if session.require_confirmation().await {
        send_confirm(
            &ctx.identity,
            session,
            message.header.hash.clone(),
            message.header.timestamp.clone(),
        )
        .await?;
    }
    Ok(())
}
