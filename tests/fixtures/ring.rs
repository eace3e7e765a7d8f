//! Builds a ring authority plus however many admitted peers a test needs,
//! all talking over a shared [`crate::MemoryNetwork`] instead of real sockets.

use crate::memory_transport::MemoryTransport;
use crate::MemoryNetwork;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ringnet_core::config::{DiscoveryAddress, IdentityPaths, PeerConfig};
use ringnet_core::Peer;
use ringnet_crypto::{asymmetric, identity::issue_ring_signature};
use ringnet_discovery::DiscoveryConfig;
use ringnet_transport::Transport;
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

static NEXT_PORT: AtomicU16 = AtomicU16::new(30000);

/// A running peer plus the temp directory backing its identity files,
/// kept alive for the fixture's lifetime.
pub struct PeerHandle {
    pub peer: Peer,
    pub address: String,
    _identity_dir: TempDir,
}

impl PeerHandle {
    pub fn ring_signature(&self) -> Vec<u8> {
        self.peer.ring_signature().to_vec()
    }
}

/// A ring authority and the in-memory network its peers dial each other on.
pub struct Ring {
    network: Arc<MemoryNetwork>,
    ring_private_key: RsaPrivateKey,
    ring_public_key: RsaPublicKey,
}

impl Ring {
    pub fn new() -> Self {
        let (ring_private_key, ring_public_key) = asymmetric::generate_keypair().expect("ring keypair");
        Self {
            network: MemoryNetwork::new(),
            ring_private_key,
            ring_public_key,
        }
    }

    fn allocate_address() -> String {
        let port = NEXT_PORT.fetch_add(1, Ordering::SeqCst);
        format!("127.0.0.1:{port}")
    }

    /// Reserve an address for a peer that hasn't started yet, e.g. to seed
    /// a self-connect test's own discovery address ahead of `spawn_peer_at`.
    pub fn reserve_address() -> String {
        Self::allocate_address()
    }

    /// Admit and start a peer, seeded with `discovery_addresses` and
    /// optionally starting discovery immediately.
    pub async fn spawn_peer(&self, discovery_addresses: Vec<DiscoveryAddress>, start_discovery: bool) -> PeerHandle {
        self.spawn_peer_at(Self::allocate_address(), discovery_addresses, start_discovery).await
    }

    /// Like `spawn_peer`, but bound to a caller-chosen address (reserved up
    /// front via `reserve_address`).
    pub async fn spawn_peer_at(&self, address: String, discovery_addresses: Vec<DiscoveryAddress>, start_discovery: bool) -> PeerHandle {
        let port: u16 = address.rsplit(':').next().unwrap().parse().unwrap();

        let dir = TempDir::new().expect("temp dir for identity files");
        let (private_key, public_key) = asymmetric::generate_keypair().expect("peer keypair");
        let signature = issue_ring_signature(&self.ring_private_key, &public_key).expect("ring signature");

        let private_key_path = dir.path().join("private.pem");
        let public_key_path = dir.path().join("public.pem");
        let ring_public_key_path = dir.path().join("ring_public.pem");
        let signature_path = dir.path().join("signature.b64");

        std::fs::write(&private_key_path, asymmetric::private_key_to_pem(&private_key).unwrap()).unwrap();
        std::fs::write(&public_key_path, asymmetric::public_key_to_pem(&public_key).unwrap()).unwrap();
        std::fs::write(
            &ring_public_key_path,
            asymmetric::public_key_to_pem(&self.ring_public_key).unwrap(),
        )
        .unwrap();
        std::fs::write(&signature_path, BASE64.encode(signature)).unwrap();

        let config = PeerConfig {
            listen_port: port,
            public_address: address.clone(),
            discovery_addresses,
            discovery: DiscoveryConfig {
                own_port: port,
                ..DiscoveryConfig::default()
            },
            start_discovery,
            identity: IdentityPaths {
                private_key: private_key_path,
                public_key: public_key_path,
                ring_public_key: ring_public_key_path,
                signature: signature_path,
            },
            require_confirmation: false,
            debug: false,
        };

        let transport = MemoryTransport::new(address.clone(), self.network.clone()) as Arc<dyn Transport>;
        let peer = Peer::start(config, transport).await.expect("peer starts");

        PeerHandle {
            peer,
            address,
            _identity_dir: dir,
        }
    }
}

impl Default for Ring {
    fn default() -> Self {
        Self::new()
    }
}
