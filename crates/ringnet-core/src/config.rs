//! Peer configuration.

use ringnet_discovery::DiscoveryConfig;
use std::path::PathBuf;
use std::time::Duration;

/// A discovery candidate as given at startup: either a bare address or an
/// address paired with the ring signature it is expected to present.
#[derive(Debug, Clone)]
pub struct DiscoveryAddress {
    pub address: String,
    pub signature: Option<Vec<u8>>,
}

impl From<&str> for DiscoveryAddress {
    fn from(address: &str) -> Self {
        Self {
            address: address.to_string(),
            signature: None,
        }
    }
}

/// Paths to the identity material the peer loads at startup.
#[derive(Debug, Clone)]
pub struct IdentityPaths {
    pub private_key: PathBuf,
    pub public_key: PathBuf,
    pub ring_public_key: PathBuf,
    pub signature: PathBuf,
}

/// Default listen port, overridable by the `RINGNET_LISTEN` environment
/// variable.
pub const DEFAULT_LISTEN_PORT: u16 = 26781;

/// Fixed delay before a confirmation-pending message is retried.
pub const CONFIRMATION_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Fixed delay before a discovery restart after an abnormal close.
pub const RECONNECT_BACKOFF_DELAY: Duration = Duration::from_secs(60);

/// Library-level configuration for a [`crate::peer::Peer`].
#[derive(Debug, Clone)]
pub struct PeerConfig {
    /// Port to listen on.
    pub listen_port: u16,
    /// Address advertised to peers in TRUSTED (`listening.address`).
    pub public_address: String,
    /// Initial discovery candidates.
    pub discovery_addresses: Vec<DiscoveryAddress>,
    /// Port-expansion range used by the discovery engine.
    pub discovery: DiscoveryConfig,
    /// Whether to begin discovery immediately on startup.
    pub start_discovery: bool,
    /// Identity file paths.
    pub identity: IdentityPaths,
    /// Whether this peer demands and retries confirmations.
    pub require_confirmation: bool,
    /// Verbose diagnostic logging.
    pub debug: bool,
}

impl PeerConfig {
    /// Read the listen port from `RINGNET_LISTEN`, falling back to
    /// [`DEFAULT_LISTEN_PORT`].
    pub fn listen_port_from_env() -> u16 {
        std::env::var("RINGNET_LISTEN")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_LISTEN_PORT)
    }
}

impl Default for PeerConfig {
    fn default() -> Self {
        let listen_port = Self::listen_port_from_env();
        Self {
            listen_port,
            public_address: format!("127.0.0.1:{listen_port}"),
            discovery_addresses: Vec::new(),
            discovery: DiscoveryConfig {
                own_port: listen_port,
                ..DiscoveryConfig::default()
            },
            start_discovery: true,
            identity: IdentityPaths {
                private_key: PathBuf::from("private.pem"),
                public_key: PathBuf::from("public.pem"),
                ring_public_key: PathBuf::from("ring_public.pem"),
                signature: PathBuf::from("signature.b64"),
            },
            require_confirmation: false,
            debug: false,
        }
    }
}
