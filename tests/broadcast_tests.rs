//! Application message delivery across a trusted connection: reserved
//! MESSAGE frames and embedder-defined custom types, sent through
//! `broadcast`/`broadcast_custom` and observed via `subscribe`.

use ringnet_core::config::DiscoveryAddress;
use ringnet_integration_tests::fixtures::Ring;
use ringnet_integration_tests::test_helpers::{wait_until, wait_until_async, SETTLE_INTERVAL, SETTLE_TIMEOUT};
use std::sync::{Arc, Mutex};

#[tokio::test]
async fn a_broadcast_message_is_delivered_to_the_trusted_peer() {
    let ring = Ring::new();
    let b = ring.spawn_peer(vec![], false).await;
    let a = ring
        .spawn_peer(vec![DiscoveryAddress::from(b.address.as_str())], true)
        .await;

    let trusted = wait_until_async(SETTLE_TIMEOUT, SETTLE_INTERVAL, || async { a.peer.peer_list(&[]).await.len() == 1 }).await;
    assert!(trusted, "A and B must trust before broadcasting");

    let received: Arc<Mutex<Vec<serde_json::Value>>> = Arc::new(Mutex::new(Vec::new()));
    let received2 = received.clone();
    b.peer.on("message", move |event| {
        if let ringnet_core::Event::Message { body, .. } = event {
            received2.lock().unwrap().push(body.clone());
        }
    });

    a.peer.broadcast(serde_json::json!({"greeting": "hello"}), None).await;

    let delivered = wait_until(SETTLE_TIMEOUT, SETTLE_INTERVAL, || !received.lock().unwrap().is_empty()).await;
    assert!(delivered, "B should receive A's broadcast message");
    assert_eq!(received.lock().unwrap()[0], serde_json::json!({"greeting": "hello"}));
}

#[tokio::test]
async fn a_custom_message_fires_its_own_named_event() {
    let ring = Ring::new();
    let b = ring.spawn_peer(vec![], false).await;
    let a = ring
        .spawn_peer(vec![DiscoveryAddress::from(b.address.as_str())], true)
        .await;

    let trusted = wait_until_async(SETTLE_TIMEOUT, SETTLE_INTERVAL, || async { a.peer.peer_list(&[]).await.len() == 1 }).await;
    assert!(trusted, "A and B must trust before broadcasting");

    let received: Arc<Mutex<Vec<serde_json::Value>>> = Arc::new(Mutex::new(Vec::new()));
    let received2 = received.clone();
    b.peer.on("ping", move |event| {
        if let ringnet_core::Event::Custom { body, .. } = event {
            received2.lock().unwrap().push(body.clone());
        }
    });

    a.peer
        .broadcast_custom("ping".to_string(), serde_json::json!({"seq": 1}), None)
        .await;

    let delivered = wait_until(SETTLE_TIMEOUT, SETTLE_INTERVAL, || !received.lock().unwrap().is_empty()).await;
    assert!(delivered, "B should receive A's custom \"ping\" event");
    assert_eq!(received.lock().unwrap()[0], serde_json::json!({"seq": 1}));
}
