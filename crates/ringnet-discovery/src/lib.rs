//! # ringnet-discovery
//!
//! The candidate-address queue and discovery algorithm that converges a
//! ringnet overlay toward a complete graph.
//!
//! This crate is intentionally transport-free: it models the queue, address
//! normalization/parsing, port expansion, and gossip intake as pure data and
//! functions. The async dial loop that turns a [`engine::DiscoveryStep::Dial`]
//! into an actual connection attempt lives in `ringnet-core`, which owns the
//! peer table this crate's predicates are checked against.

pub mod address;
pub mod candidate;
pub mod engine;
pub mod error;
pub mod queue;

pub use candidate::{CandidateAddress, CandidateKey};
pub use engine::{DiscoveryConfig, DiscoveryStep};
pub use error::DiscoveryError;
pub use queue::DiscoveryQueue;
