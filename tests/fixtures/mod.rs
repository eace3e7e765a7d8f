//! Test fixtures for spinning up a ring of in-process peers.

pub mod ring;

pub use ring::{PeerHandle, Ring};
