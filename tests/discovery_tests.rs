//! Transitive discovery: a peer seeded with only one address should come to
//! trust a second peer it never dialed directly, learned from gossip
//! carried in the first peer's TRUSTED.

use ringnet_core::config::DiscoveryAddress;
use ringnet_integration_tests::fixtures::Ring;
use ringnet_integration_tests::test_helpers::{wait_until_async, SETTLE_INTERVAL, SETTLE_TIMEOUT};

#[tokio::test]
async fn a_freshly_dialed_peer_learns_of_a_peer_it_never_seeded_directly() {
    let ring = Ring::new();

    let c = ring.spawn_peer(vec![], false).await;
    let b = ring
        .spawn_peer(vec![DiscoveryAddress::from(c.address.as_str())], true)
        .await;

    let b_c_converged = wait_until_async(SETTLE_TIMEOUT, SETTLE_INTERVAL, || async { b.peer.peer_list(&[]).await.len() == 1 }).await;
    assert!(b_c_converged, "B should trust C before A ever joins");

    let a = ring
        .spawn_peer(vec![DiscoveryAddress::from(b.address.as_str())], true)
        .await;

    let a_sees_both = wait_until_async(SETTLE_TIMEOUT, SETTLE_INTERVAL, || async { a.peer.peer_list(&[]).await.len() == 2 }).await;
    assert!(a_sees_both, "A should transitively discover C via B's gossip");

    let a_list = a.peer.peer_list(&[]).await;
    let a_signatures: Vec<Vec<u8>> = a_list.into_iter().map(|entry| entry.signature).collect();
    assert!(a_signatures.contains(&b.ring_signature()));
    assert!(a_signatures.contains(&c.ring_signature()));
}
