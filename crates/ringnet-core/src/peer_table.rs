//! The live set of trusted peers.
//!
//! The table owns every live [`Session`] and is the sole place connections
//! are destroyed, keyed by the peer's ring-signature bytes so duplicate
//! admission tickets can never coexist.

use crate::session::Session;
use chrono::{DateTime, Utc};
use ringnet_discovery::candidate::normalize_address;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// One row of `getPeerList()` output.
#[derive(Debug, Clone)]
pub struct PeerListEntry {
    pub address: String,
    pub signature: Vec<u8>,
    pub created: DateTime<Utc>,
    pub active: DateTime<Utc>,
    pub trusted: bool,
}

/// Keyed by ring-signature bytes, guarded by one mutex for the whole table.
#[derive(Default)]
pub struct PeerTable {
    peers: Mutex<HashMap<Vec<u8>, Arc<Session>>>,
}

impl PeerTable {
    pub fn new() -> Self {
        Self {
            peers: Mutex::new(HashMap::new()),
        }
    }

    /// Register a trusted session under its peer's ring signature.
    pub async fn insert(&self, ring_signature: Vec<u8>, session: Arc<Session>) {
        self.peers.lock().await.insert(ring_signature, session);
    }

    /// Remove and return the session for `ring_signature`, if present.
    /// Callers use this to drive the actual connection close.
    pub async fn remove(&self, ring_signature: &[u8]) -> Option<Arc<Session>> {
        self.peers.lock().await.remove(ring_signature)
    }

    pub async fn contains(&self, ring_signature: &[u8]) -> bool {
        self.peers.lock().await.contains_key(ring_signature)
    }

    pub async fn get(&self, ring_signature: &[u8]) -> Option<Arc<Session>> {
        self.peers.lock().await.get(ring_signature).cloned()
    }

    pub async fn len(&self) -> usize {
        self.peers.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.peers.lock().await.is_empty()
    }

    /// All live sessions, for fan-out broadcast and shutdown.
    pub async fn all(&self) -> Vec<(Vec<u8>, Arc<Session>)> {
        self.peers
            .lock()
            .await
            .iter()
            .map(|(sig, session)| (sig.clone(), session.clone()))
            .collect()
    }

    /// Every TRUSTED connection whose ring signature is not in `omit`,
    /// with the reported listening address normalized and port-qualified.
    pub async fn peer_list(&self, omit: &[Vec<u8>]) -> Vec<PeerListEntry> {
        let peers = self.peers.lock().await;
        let mut entries = Vec::new();
        for (signature, session) in peers.iter() {
            if omit.iter().any(|s| s == signature) {
                continue;
            }
            if !session.is_trusted().await {
                continue;
            }
            let Some(reported) = session.reported_address().await else {
                continue;
            };
            let port = session.reported_port().await;
            let address = qualify_address(&reported, port);
            entries.push(PeerListEntry {
                address,
                signature: signature.clone(),
                created: session.created_at(),
                active: session.active_at().await,
                trusted: true,
            });
        }
        entries
    }
}

/// Strip `::ffff:` and, if the result has no colon (no explicit port),
/// append the reported listening port.
fn qualify_address(address: &str, port: Option<u16>) -> String {
    let normalized = normalize_address(address);
    if !normalized.contains(':') {
        if let Some(port) = port {
            return format!("{normalized}:{port}");
        }
    }
    normalized
}
