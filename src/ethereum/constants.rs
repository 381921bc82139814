//! Ethereum network constants.
//!
//! Contains chain IDs, explorer endpoints and the reference timing policy.

use std::time::Duration;

// ============================================================================
// Chain IDs
// ============================================================================

/// Ethereum Mainnet chain ID.
pub const ETHEREUM_MAINNET_CHAIN_ID: u64 = 1;

/// Ropsten testnet chain ID.
pub const ROPSTEN_CHAIN_ID: u64 = 3;

/// Rinkeby testnet chain ID.
pub const RINKEBY_CHAIN_ID: u64 = 4;

/// Kovan testnet chain ID.
pub const KOVAN_CHAIN_ID: u64 = 42;

/// BNB Smart Chain chain ID.
pub const BSC_CHAIN_ID: u64 = 56;

/// BNB Smart Chain testnet chain ID.
pub const BSC_TESTNET_CHAIN_ID: u64 = 97;

/// TomoChain mainnet chain ID. Tomo signs with this fixed identifier.
pub const TOMO_CHAIN_ID: u64 = 88;

// ============================================================================
// Block explorers
// ============================================================================

pub const ETHERSCAN_DOMAIN: &str = "api.etherscan.io";
pub const ROPSTEN_ETHERSCAN_DOMAIN: &str = "api-ropsten.etherscan.io";
pub const RINKEBY_ETHERSCAN_DOMAIN: &str = "api-rinkeby.etherscan.io";
pub const KOVAN_ETHERSCAN_DOMAIN: &str = "api-kovan.etherscan.io";
pub const BSCSCAN_DOMAIN: &str = "api.bscscan.com";
pub const TESTNET_BSCSCAN_DOMAIN: &str = "api-testnet.bscscan.com";

/// Tomoscan account endpoint, the address is appended.
pub const TOMOSCAN_ACCOUNT_URL: &str = "https://scan.tomochain.com/api/accounts";

/// Default gas station feed used for Ethereum mainnet.
pub const GAS_STATION_URL: &str = "https://ethgasstation.info/json/ethgasAPI.json";

// ============================================================================
// Timing and gas policy
// ============================================================================

/// Upper bound on a single node call.
pub const NODE_CALL_TIMEOUT: Duration = Duration::from_secs(4);

/// How long a feed-backed gas price stays fresh.
pub const GAS_PRICE_TTL: Duration = Duration::from_secs(30);

/// Interval between monitor polls.
pub const MONITOR_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// A hash never seen on any node for this long is reported lost.
pub const MONITOR_LOST_AFTER: Duration = Duration::from_secs(180);

/// Gas used by a plain value transfer.
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

/// Decimals of the native asset.
pub const NATIVE_DECIMALS: u8 = 18;

/// Decimals of Gwei relative to wei.
pub const GWEI_DECIMALS: u8 = 9;
