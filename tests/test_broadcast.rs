//! Integration tests for fan-out broadcasting.

mod common;

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use alloy::primitives::{address, keccak256, Bytes, U256};
use common::MockNode;
use ethkit::{types::UnsignedTransaction, AppError, Broadcaster, LocalKeySigner, Node};

const TEST_PRIVATE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

fn signed() -> ethkit::types::SignedTransaction {
    let signer = LocalKeySigner::from_private_key(TEST_PRIVATE_KEY, Some(1)).unwrap();
    signer
        .sign_sync(&UnsignedTransaction {
            nonce: 0,
            to: Some(address!("70997970C51812dc3A010C7d01b50e0d17dc79C8")),
            value: U256::from(1u64),
            gas_limit: 21_000,
            gas_price: 10_000_000_000,
            data: Bytes::new(),
        })
        .unwrap()
}

#[tokio::test]
async fn test_one_rejection_one_acceptance() {
    let provider1 = MockNode::new("provider1").rejecting_sends("nonce too low").arc();
    let provider2 = MockNode::new("provider2").arc();
    let broadcaster = Broadcaster::new(vec![provider1.clone() as Arc<dyn Node>, provider2.clone()]);
    let tx = signed();

    let outcome = broadcaster.broadcast(&tx).await;

    assert_eq!(outcome.hash, tx.hash());
    assert!(outcome.broadcasted);
    assert_eq!(
        outcome.errors,
        BTreeMap::from([("provider1".to_string(), "nonce too low".to_string())])
    );
    assert_eq!(provider2.sent(), vec![tx.encoded()]);
    assert!(provider1.sent().is_empty());
}

#[tokio::test]
async fn test_all_rejected_is_not_broadcasted() {
    let broadcaster = Broadcaster::new(vec![
        MockNode::new("a").rejecting_sends("insufficient funds").arc() as Arc<dyn Node>,
        MockNode::new("b").failing("connection refused").arc(),
    ]);

    let outcome = broadcaster.broadcast(&signed()).await;

    assert!(!outcome.broadcasted);
    assert_eq!(outcome.errors.len(), 2);
    assert_eq!(outcome.errors["a"], "insufficient funds");
}

#[tokio::test(start_paused = true)]
async fn test_waits_for_every_node() {
    let slow = MockNode::new("slow").with_delay(Duration::from_secs(3)).arc();
    let fast = MockNode::new("fast").arc();
    let broadcaster = Broadcaster::new(vec![slow.clone() as Arc<dyn Node>, fast.clone()]);

    let outcome = broadcaster.broadcast(&signed()).await;

    assert!(outcome.broadcasted);
    assert!(outcome.errors.is_empty());
    assert_eq!(slow.sent().len(), 1);
    assert_eq!(fast.sent().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_counts_as_rejection() {
    let broadcaster = Broadcaster::new(vec![
        MockNode::new("stuck").with_delay(Duration::from_secs(60)).arc() as Arc<dyn Node>
    ])
    .with_call_timeout(Duration::from_secs(1));

    let outcome = broadcaster.broadcast(&signed()).await;

    assert!(!outcome.broadcasted);
    assert!(outcome.errors["stuck"].contains("timed out"));
}

#[tokio::test]
async fn test_broadcast_hex() {
    let node = MockNode::new("a").arc();
    let broadcaster = Broadcaster::new(vec![node.clone() as Arc<dyn Node>]);
    let raw = signed().encoded();

    let outcome = broadcaster.broadcast_hex(&alloy::hex::encode_prefixed(&raw)).await.unwrap();

    assert!(outcome.broadcasted);
    assert_eq!(outcome.hash, keccak256(&raw));
    assert_eq!(node.sent(), vec![raw]);

    let err = broadcaster.broadcast_hex("0x").await.unwrap_err();
    assert!(matches!(err, AppError::Encode(_)));
}
