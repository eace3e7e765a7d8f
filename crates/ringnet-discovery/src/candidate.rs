//! Candidate address normalization and deduplication.
//!
//! The `::ffff:` IPv4-mapped prefix is stripped at exactly one boundary,
//! and candidate-queue membership never relies on raw string/JSON equality
//! (which would fail to deduplicate logically-identical candidates with
//! differently-ordered fields). [`CandidateAddress::new`] normalizes once
//! at construction, and [`CandidateAddress::key`] gives a canonical form
//! for set/queue membership checks.

const IPV4_MAPPED_PREFIX: &str = "::ffff:";

/// An address learned from configuration or gossip, queued for dialing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateAddress {
    address: String,
    signature: Option<Vec<u8>>,
}

/// Canonical key used for queue/connected-set membership comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateKey {
    address: String,
    signature: Option<Vec<u8>>,
}

impl CandidateAddress {
    /// Construct a candidate, normalizing the address exactly once.
    pub fn new(address: impl Into<String>, signature: Option<Vec<u8>>) -> Self {
        Self {
            address: normalize_address(&address.into()),
            signature,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn signature(&self) -> Option<&[u8]> {
        self.signature.as_deref()
    }

    /// Canonical key for membership checks (queue dedup, connected-set
    /// lookup, self-detection).
    pub fn key(&self) -> CandidateKey {
        CandidateKey {
            address: self.address.clone(),
            signature: self.signature.clone(),
        }
    }

    /// A candidate carrying the given signature, at the same address.
    pub fn with_signature(&self, signature: Vec<u8>) -> Self {
        Self {
            address: self.address.clone(),
            signature: Some(signature),
        }
    }
}

/// Strip a leading `::ffff:` IPv4-mapped prefix. Applied once, at
/// candidate construction.
pub fn normalize_address(address: &str) -> String {
    address
        .strip_prefix(IPV4_MAPPED_PREFIX)
        .unwrap_or(address)
        .to_string()
}
