//! Per-chain configuration.
//!
//! Everything that differs between chains (explorer, gas price strategy,
//! replay protection) is resolved once into a [`ChainConfig`] and threaded
//! through the client instead of being re-selected at every call site.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::constants::*;
use crate::error::AppError;

/// Supported chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Chain {
    Ethereum,
    Ropsten,
    Kovan,
    Rinkeby,
    Bsc,
    BscTest,
    Tomo,
}

impl Chain {
    /// Numeric chain id.
    pub fn chain_id(self) -> u64 {
        match self {
            Chain::Ethereum => ETHEREUM_MAINNET_CHAIN_ID,
            Chain::Ropsten => ROPSTEN_CHAIN_ID,
            Chain::Kovan => KOVAN_CHAIN_ID,
            Chain::Rinkeby => RINKEBY_CHAIN_ID,
            Chain::Bsc => BSC_CHAIN_ID,
            Chain::BscTest => BSC_TESTNET_CHAIN_ID,
            Chain::Tomo => TOMO_CHAIN_ID,
        }
    }

    /// Name as used in configuration.
    pub fn as_str(self) -> &'static str {
        match self {
            Chain::Ethereum => "ethereum",
            Chain::Ropsten => "ropsten",
            Chain::Kovan => "kovan",
            Chain::Rinkeby => "rinkeby",
            Chain::Bsc => "bsc",
            Chain::BscTest => "bsc-test",
            Chain::Tomo => "tomo",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ethereum" | "mainnet" => Ok(Chain::Ethereum),
            "ropsten" => Ok(Chain::Ropsten),
            "kovan" => Ok(Chain::Kovan),
            "rinkeby" => Ok(Chain::Rinkeby),
            "bsc" => Ok(Chain::Bsc),
            "bsc-test" => Ok(Chain::BscTest),
            "tomo" => Ok(Chain::Tomo),
            other => Err(AppError::Config(format!("'{}' chain is not supported", other))),
        }
    }
}

/// How a recommended gas price is obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum GasPriceStrategy {
    /// A constant price in Gwei.
    Fixed(f64),
    /// An external JSON feed, cached with a TTL.
    Feed { url: String },
    /// The nodes' own `eth_gasPrice` suggestion.
    Node,
}

/// Where contract ABIs are fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplorerKind {
    /// Etherscan-compatible `module=contract&action=getabi` API.
    Etherscan { domain: String },
    /// Tomoscan account API.
    Tomoscan { url: String },
}

/// Resolved configuration for one chain.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub chain: Chain,
    pub chain_id: u64,
    pub explorer: ExplorerKind,
    pub explorer_api_key: Option<String>,
    pub gas_price: GasPriceStrategy,
    /// Chain id bound into signatures; `None` signs without replay protection.
    pub replay_protection: Option<u64>,
}

impl ChainConfig {
    /// Reference configuration for a chain.
    pub fn for_chain(chain: Chain) -> Self {
        let etherscan = |domain: &str| ExplorerKind::Etherscan { domain: domain.to_string() };
        let (explorer, gas_price) = match chain {
            Chain::Ethereum => (
                etherscan(ETHERSCAN_DOMAIN),
                GasPriceStrategy::Feed { url: GAS_STATION_URL.to_string() },
            ),
            Chain::Ropsten => (etherscan(ROPSTEN_ETHERSCAN_DOMAIN), GasPriceStrategy::Fixed(5.0)),
            Chain::Kovan => (etherscan(KOVAN_ETHERSCAN_DOMAIN), GasPriceStrategy::Node),
            Chain::Rinkeby => (etherscan(RINKEBY_ETHERSCAN_DOMAIN), GasPriceStrategy::Node),
            Chain::Bsc => (etherscan(BSCSCAN_DOMAIN), GasPriceStrategy::Node),
            Chain::BscTest => (etherscan(TESTNET_BSCSCAN_DOMAIN), GasPriceStrategy::Node),
            Chain::Tomo => (
                ExplorerKind::Tomoscan { url: TOMOSCAN_ACCOUNT_URL.to_string() },
                GasPriceStrategy::Fixed(1.0),
            ),
        };

        Self {
            chain,
            chain_id: chain.chain_id(),
            explorer,
            explorer_api_key: None,
            gas_price,
            replay_protection: Some(chain.chain_id()),
        }
    }

    /// Set the explorer API key.
    pub fn with_explorer_api_key(mut self, key: impl Into<String>) -> Self {
        self.explorer_api_key = Some(key.into());
        self
    }

    /// Override the gas price strategy.
    pub fn with_gas_price(mut self, strategy: GasPriceStrategy) -> Self {
        self.gas_price = strategy;
        self
    }
}
