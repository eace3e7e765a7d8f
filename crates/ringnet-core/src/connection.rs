//! The per-connection read loop: demultiplexes frames off the transport
//! and dispatches them to the handshake or data channel.

use crate::context::PeerContext;
use crate::events::Event;
use crate::message::{Message, MessageType};
use crate::session::{handshake, ConnectionState, Session};
use ringnet_transport::{Frame, TransportConnection, NORMAL_CLOSURE};
use std::sync::Arc;
use tracing::{debug, warn};

/// Drive one connection end to end: send the initial HELO, then loop
/// reading frames until the connection closes, dispatching each to the
/// handshake or data channel. On an abnormal close, re-enqueues the
/// peer's reported address for reconnect.
pub async fn run(ctx: Arc<PeerContext>, session: Arc<Session>) {
    if let Err(err) = handshake::send_helo(&ctx.identity, &session).await {
        warn!(remote = %session.remote_address(), error = %err, "failed to send initial HELO");
        return;
    }

    loop {
        let frame = match session.recv_frame().await {
            Ok(frame) => frame,
            Err(err) => {
                warn!(remote = %session.remote_address(), error = %err, "transport read failed");
                on_disconnect(&ctx, &session, NORMAL_CLOSURE + 1).await;
                return;
            }
        };

        match frame {
            Frame::Text(text) => {
                if let Err(err) = dispatch(&ctx, &session, &text).await {
                    debug!(remote = %session.remote_address(), error = %err, "frame dispatch failed");
                }
            }
            Frame::Closed { code } => {
                on_disconnect(&ctx, &session, code).await;
                return;
            }
        }
    }
}

/// Accept one inbound connection and hand it the same read loop.
pub async fn accept_inbound(ctx: Arc<PeerContext>, connection: Arc<dyn TransportConnection>) {
    ctx.events.emit(Event::Request {
        remote_address: connection.remote_address().to_string(),
    });
    let session = Arc::new(Session::new(connection));
    run(ctx, session).await;
}

async fn dispatch(ctx: &PeerContext, session: &Arc<Session>, frame: &str) -> crate::error::Result<()> {
    let message = Message::from_frame(frame)
        .map_err(|e| crate::error::PeerError::Session(format!("malformed frame: {e}").into()))?;

    match &message.header.message_type {
        MessageType::Helo => handshake::handle_helo(ctx, session, &message).await,
        MessageType::Trusted => handshake::handle_trusted(ctx, session, &message).await,
        _ => crate::session::data_channel::handle_frame(ctx, session, &message).await,
    }
}

async fn on_disconnect(ctx: &Arc<PeerContext>, session: &Arc<Session>, code: u16) {
    session.set_state(ConnectionState::Closed).await;
    let ring_signature = session.peer_ring_signature().await;
    if let Some(ref signature) = ring_signature {
        ctx.peer_table.remove(signature).await;
    }

    if code == NORMAL_CLOSURE {
        debug!(remote = %session.remote_address(), "connection closed normally");
        return;
    }

    warn!(remote = %session.remote_address(), code, "abnormal close, scheduling reconnect");
    let Some(address) = session.reported_address().await else {
        return;
    };
    crate::discovery::schedule_reconnect(ctx.clone(), address, ring_signature);
}
