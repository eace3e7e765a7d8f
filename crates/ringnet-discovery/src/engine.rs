//! Pure discovery-step logic: port expansion and the one-candidate-at-a-time
//! algorithm. Kept free of transport/async concerns so it can be driven and
//! tested deterministically; the async dial loop lives in `ringnet-core`,
//! which owns the peer table this crate only receives predicates against.

use crate::address;
use crate::candidate::CandidateAddress;
use crate::queue::DiscoveryQueue;

/// Port-expansion configuration (`discoveryRange`, default 26780-26790).
#[derive(Debug, Clone, Copy)]
pub struct DiscoveryConfig {
    pub port_range: Option<(u16, u16)>,
    pub own_port: u16,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            port_range: Some((26780, 26790)),
            own_port: 26781,
        }
    }
}

/// The outcome of processing one popped candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryStep {
    /// The candidate was already connected or was ourselves.
    Skipped,
    /// The candidate had no port; these expanded candidates were produced
    /// instead of dialing the original (the original is never dialed).
    Expanded(Vec<CandidateAddress>),
    /// The candidate should be dialed at this URL.
    Dial {
        url: String,
        signature: Option<Vec<u8>>,
    },
}

/// Process one popped candidate.
///
/// `should_skip` reports whether a candidate is already connected (by ring
/// signature) or is this peer's own signature; the caller composes that
/// check against its live peer table.
pub fn step(
    candidate: CandidateAddress,
    cfg: &DiscoveryConfig,
    mut should_skip: impl FnMut(&CandidateAddress) -> bool,
) -> DiscoveryStep {
    if should_skip(&candidate) {
        return DiscoveryStep::Skipped;
    }

    let parsed = address::parse(candidate.address());
    if parsed.port.is_none() {
        let ports: Vec<u16> = match cfg.port_range {
            Some((lo, hi)) => (lo..=hi).collect(),
            None => vec![cfg.own_port],
        };
        let expanded: Vec<CandidateAddress> = ports
            .into_iter()
            .map(|port| {
                let addr = format!("{}:{port}", parsed.host);
                CandidateAddress::new(addr, candidate.signature().map(<[u8]>::to_vec))
            })
            .filter(|c| !should_skip(c))
            .collect();
        return DiscoveryStep::Expanded(expanded);
    }

    let url = parsed.to_dial_url(parsed.port.expect("checked above"));
    DiscoveryStep::Dial {
        url,
        signature: candidate.signature().map(<[u8]>::to_vec),
    }
}

/// Gossip intake: append each peer-list entry that is not already
/// connected, queued, or self. Returns `true` if anything new was
/// appended (the caller should start a discovery pass if it was idle).
pub fn intake_gossip(
    queue: &mut DiscoveryQueue,
    peers: Vec<CandidateAddress>,
    mut should_skip: impl FnMut(&CandidateAddress) -> bool,
) -> bool {
    let mut appended = false;
    for peer in peers {
        if should_skip(&peer) {
            continue;
        }
        if queue.push(peer) {
            appended = true;
        }
    }
    appended
}
