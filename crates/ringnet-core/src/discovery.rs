//! The async discovery loop: pops candidates off the queue and turns
//! [`ringnet_discovery::engine::DiscoveryStep::Dial`] into an actual
//! connection attempt.

use crate::connection;
use crate::context::PeerContext;
use crate::events::Event;
use crate::session::Session;
use ringnet_discovery::candidate::CandidateAddress;
use ringnet_discovery::engine::{self, DiscoveryStep};
use std::sync::Arc;
use tracing::{debug, warn};

/// Seed the discovery queue from `config.discovery_addresses` and, if
/// `start_discovery` is set, run the first pass.
pub async fn start(ctx: Arc<PeerContext>) {
    {
        let mut queue = ctx.discovery_queue.lock().await;
        for candidate in &ctx.config.discovery_addresses {
            queue.push(CandidateAddress::new(
                candidate.address.clone(),
                candidate.signature.clone(),
            ));
        }
    }

    if ctx.config.start_discovery {
        run_pass(ctx).await;
    }
}

/// Drain the discovery queue, dialing every candidate that survives the
/// skip check, one at a time. Emits `Discovering` when the drain starts
/// and `Discovered` once it empties.
pub async fn run_pass(ctx: Arc<PeerContext>) {
    let was_empty = ctx.discovery_queue.lock().await.is_empty();
    if was_empty {
        return;
    }
    ctx.events.emit(Event::Discovering);

    loop {
        let candidate = {
            let mut queue = ctx.discovery_queue.lock().await;
            match queue.pop() {
                Some(candidate) => candidate,
                None => break,
            }
        };

        let own_signature = ctx.identity.ring_signature().to_vec();
        // `engine::step` wants a plain closure, so resolve connected-peer
        // membership as a snapshot up front rather than calling back into
        // the (async) peer table from inside the predicate.
        let connected: Vec<Vec<u8>> = ctx.peer_table.all().await.into_iter().map(|(sig, _)| sig).collect();
        let should_skip = |candidate: &CandidateAddress| -> bool {
            candidate.signature() == Some(own_signature.as_slice())
                || candidate
                    .signature()
                    .is_some_and(|sig| connected.iter().any(|c| c.as_slice() == sig))
        };
        let step = engine::step(candidate, &ctx.config.discovery, should_skip);

        match step {
            DiscoveryStep::Skipped => continue,
            DiscoveryStep::Expanded(expanded) => {
                let mut queue = ctx.discovery_queue.lock().await;
                for candidate in expanded {
                    queue.push(candidate);
                }
            }
            DiscoveryStep::Dial { url, .. } => {
                dial(ctx.clone(), url).await;
            }
        }
    }

    ctx.events.emit(Event::Discovered);
}

/// Open an outbound connection and hand it the same per-connection read
/// loop an inbound accept would get, sending the initial HELO first.
async fn dial(ctx: Arc<PeerContext>, url: String) {
    let conn = match ctx.transport.dial(&url).await {
        Ok(conn) => conn,
        Err(err) => {
            warn!(url = %url, error = %err, "discovery dial failed");
            return;
        }
    };
    ctx.events.emit(Event::Request {
        remote_address: conn.remote_address().to_string(),
    });
    let session = Arc::new(Session::new(conn));
    tokio::spawn(connection::run(ctx, session));
}

/// Re-enqueue a peer's last-known address after an abnormal close, and
/// restart discovery after a fixed backoff if the queue was otherwise
/// idle.
pub fn schedule_reconnect(ctx: Arc<PeerContext>, address: String, ring_signature: Option<Vec<u8>>) {
    tokio::spawn(async move {
        tokio::time::sleep(crate::config::RECONNECT_BACKOFF_DELAY).await;
        let candidate = CandidateAddress::new(address, ring_signature);
        let appended = ctx.discovery_queue.lock().await.push(candidate);
        if appended {
            debug!("reconnect candidate enqueued, restarting discovery");
            run_pass(ctx).await;
        }
    });
}
