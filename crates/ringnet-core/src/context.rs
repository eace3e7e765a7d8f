//! Shared state threaded through the handshake, data channel, discovery,
//! and broadcast modules — the pieces of a running [`crate::peer::Peer`]
//! that outlive any single connection.

use crate::config::PeerConfig;
use crate::events::EventBus;
use crate::peer_table::PeerTable;
use ringnet_crypto::Identity;
use ringnet_discovery::DiscoveryQueue;
use ringnet_transport::Transport;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Everything a connection's handshake/data-channel tasks need to reach
/// outside themselves: the identity, the peer table, the discovery queue,
/// the event surface, and the transport used to dial newly-gossiped peers.
#[derive(Clone)]
pub struct PeerContext {
    pub identity: Arc<Identity>,
    pub peer_table: Arc<PeerTable>,
    pub discovery_queue: Arc<Mutex<DiscoveryQueue>>,
    pub events: Arc<EventBus>,
    pub transport: Arc<dyn Transport>,
    pub config: PeerConfig,
}
