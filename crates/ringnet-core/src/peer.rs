//! The top-level peer runtime: wires identity, transport, peer table,
//! discovery, and broadcast together and exposes the embedder-facing
//! surface.

use crate::broadcast::BroadcastRouter;
use crate::config::PeerConfig;
use crate::connection;
use crate::context::PeerContext;
use crate::discovery;
use crate::error::{PeerError, Result};
use crate::events::{Event, EventBus};
use crate::identity;
use crate::message::MessageType;
use crate::peer_table::{PeerListEntry, PeerTable};
use ringnet_discovery::DiscoveryQueue;
use ringnet_transport::{Transport, NORMAL_CLOSURE};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

struct PeerInner {
    ctx: Arc<PeerContext>,
    broadcast: Arc<BroadcastRouter>,
    running: AtomicBool,
    accept_task: Mutex<Option<JoinHandle<()>>>,
}

/// A running ringnet peer. Cloning shares the same runtime state; the
/// actual work lives behind the inner `Arc`.
#[derive(Clone)]
pub struct Peer {
    inner: Arc<PeerInner>,
}

impl Peer {
    /// Load (or generate) identity, bind the accept loop onto `transport`,
    /// and start discovery.
    pub async fn start(config: PeerConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let identity = Arc::new(identity::load_or_generate(&config.identity)?);
        let peer_table = Arc::new(PeerTable::new());
        let events = Arc::new(EventBus::new());
        let ctx = Arc::new(PeerContext {
            identity: identity.clone(),
            peer_table: peer_table.clone(),
            discovery_queue: Arc::new(Mutex::new(DiscoveryQueue::new())),
            events: events.clone(),
            transport: transport.clone(),
            config,
        });
        let broadcast = Arc::new(BroadcastRouter::new(identity, peer_table));

        let inner = Arc::new(PeerInner {
            ctx: ctx.clone(),
            broadcast,
            running: AtomicBool::new(true),
            accept_task: Mutex::new(None),
        });
        let peer = Self { inner };

        let accept_ctx = ctx.clone();
        let accept_task = tokio::spawn(accept_loop(accept_ctx, transport));
        *peer.inner.accept_task.lock().await = Some(accept_task);

        discovery::start(ctx.clone()).await;
        info!("peer ready");
        ctx.events.emit(Event::Ready);

        Ok(peer)
    }

    /// This peer's ring admission signature, as advertised in HELO/gossip.
    pub fn ring_signature(&self) -> &[u8] {
        self.inner.ctx.identity.ring_signature()
    }

    /// Subscribe to an event by name.
    pub fn on(&self, event_name: impl Into<String>, handler: impl Fn(&Event) + Send + Sync + 'static) {
        self.inner.ctx.events.on(event_name, handler);
    }

    /// Send `body` as a reserved MESSAGE frame, to one peer or (if `target`
    /// is `None`) every trusted peer.
    pub async fn broadcast(&self, body: serde_json::Value, target: Option<&[u8]>) {
        self.inner.broadcast.broadcast(MessageType::Message, body, target).await;
    }

    /// Send `body` under an embedder-defined `header.type` name.
    pub async fn broadcast_custom(&self, name: String, body: serde_json::Value, target: Option<&[u8]>) {
        self.inner
            .broadcast
            .broadcast(MessageType::Custom(name), body, target)
            .await;
    }

    /// Snapshot of every trusted peer, with `omit` excluded by ring
    /// signature.
    pub async fn peer_list(&self, omit: &[Vec<u8>]) -> Vec<PeerListEntry> {
        self.inner.ctx.peer_table.peer_list(omit).await
    }

    /// Stop accepting new connections and close every trusted connection.
    /// A peer cannot be restarted after this.
    pub async fn shutdown(&self) -> Result<()> {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            return Err(PeerError::session("peer is already shut down"));
        }

        if let Some(task) = self.inner.accept_task.lock().await.take() {
            task.abort();
        }

        for (signature, session) in self.inner.ctx.peer_table.all().await {
            if let Err(err) = session.close(NORMAL_CLOSURE).await {
                warn!(error = %err, "error closing a connection during shutdown");
            }
            self.inner.ctx.peer_table.remove(&signature).await;
        }

        info!("peer shut down");
        Ok(())
    }
}

async fn accept_loop(ctx: Arc<PeerContext>, transport: Arc<dyn Transport>) {
    loop {
        match transport.accept().await {
            Ok(connection) => {
                tokio::spawn(connection::accept_inbound(ctx.clone(), connection));
            }
            Err(err) => {
                warn!(error = %err, "accept loop stopped");
                return;
            }
        }
    }
}
