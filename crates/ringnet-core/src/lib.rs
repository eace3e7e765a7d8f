//! # ringnet-core
//!
//! The peer runtime: the HELO/TRUSTED trust handshake, the encrypted data
//! channel, gossip-driven discovery, the peer table, and confirmed
//! broadcast. Generic over [`ringnet_transport::Transport`] so the same
//! runtime drives both the real TLS WebSocket transport and an in-process
//! test double.

pub mod broadcast;
pub mod config;
pub mod connection;
pub mod context;
pub mod discovery;
pub mod error;
pub mod events;
pub mod identity;
pub mod message;
pub mod peer;
pub mod peer_table;
pub mod session;

pub use broadcast::BroadcastRouter;
pub use config::{DiscoveryAddress, IdentityPaths, PeerConfig};
pub use context::PeerContext;
pub use error::{PeerError, Result};
pub use events::{Event, EventBus};
pub use message::{ConfirmRef, Header, Message, MessageType};
pub use peer::Peer;
pub use peer_table::{PeerListEntry, PeerTable};
pub use session::{ConnectionState, Session};
