//! Integration tests against real nodes.
//!
//! Run with: `cargo test --test test_network -- --ignored`

mod common;

use alloy::primitives::{address, U256};

/// Vitalik's public address (well-known, always has ETH).
const VITALIK: alloy::primitives::Address = address!("d8dA6BF26964aF9D7eEd9e03E53415D37aA96045");

#[tokio::test]
#[ignore = "Requires network access and environment variables"]
async fn test_get_eth_balance() {
    let client = skip_if_no_client!();

    let balance = client.get_balance(VITALIK).await;

    assert!(balance.is_ok(), "get_balance should succeed: {:?}", balance.err());
    assert!(balance.unwrap() > U256::ZERO);
}

#[tokio::test]
#[ignore = "Requires network access and environment variables"]
async fn test_current_block_and_header() {
    let client = skip_if_no_client!();

    let number = client.current_block().await.unwrap();
    let header = client.header_by_number(Some(number)).await.unwrap();

    assert_eq!(header.number, number);
}

#[tokio::test]
#[ignore = "Requires network access and environment variables"]
async fn test_usdc_decimals() {
    let client = skip_if_no_client!();
    let usdc = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");

    assert!(client.is_contract(usdc).await.unwrap());
    assert_eq!(client.erc20_decimals(usdc, None).await.unwrap(), 6);
}
