//! Configuration management module.
//!
//! Handles loading configuration from environment variables.

use std::env;

use crate::{
    error::AppError,
    ethereum::chain::{Chain, ChainConfig, GasPriceStrategy},
};

/// A named JSON-RPC endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEntry {
    pub name: String,
    pub url: String,
}

/// Library configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Target chain.
    pub chain: Chain,
    /// Nodes used for reads.
    pub rpc_nodes: Vec<NodeEntry>,
    /// Nodes used for broadcasting (default: the read nodes).
    pub broadcast_nodes: Vec<NodeEntry>,
    /// Block explorer API key.
    pub explorer_api_key: Option<String>,
    /// Override for the gas price feed.
    pub gas_price_feed_url: Option<String>,
    /// Logging level (default: info).
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `ETHEREUM_RPC_NODES`: comma separated `name=url` pairs
    ///
    /// Optional environment variables:
    /// - `ETHEREUM_CHAIN`: chain name (default: ethereum)
    /// - `ETHEREUM_BROADCAST_NODES`: `name=url` pairs for broadcasting
    /// - `EXPLORER_API_KEY`: block explorer API key
    /// - `GAS_PRICE_FEED_URL`: gas station style feed
    /// - `LOG_LEVEL`: Logging level (default: info)
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let chain = match env::var("ETHEREUM_CHAIN") {
            Ok(name) => name.parse()?,
            Err(_) => Chain::Ethereum,
        };

        let rpc_nodes = env::var("ETHEREUM_RPC_NODES").map_err(|_| {
            AppError::Config("ETHEREUM_RPC_NODES environment variable not set".into())
        })?;
        let rpc_nodes = parse_nodes(&rpc_nodes)?;

        let broadcast_nodes = match env::var("ETHEREUM_BROADCAST_NODES") {
            Ok(raw) => parse_nodes(&raw)?,
            Err(_) => rpc_nodes.clone(),
        };

        let explorer_api_key = non_empty_var("EXPLORER_API_KEY");
        let gas_price_feed_url = non_empty_var("GAS_PRICE_FEED_URL");
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self { chain, rpc_nodes, broadcast_nodes, explorer_api_key, gas_price_feed_url, log_level })
    }

    /// Chain configuration with the overrides from this config applied.
    pub fn chain_config(&self) -> ChainConfig {
        let mut chain = ChainConfig::for_chain(self.chain);
        if let Some(key) = &self.explorer_api_key {
            chain = chain.with_explorer_api_key(key.clone());
        }
        if let Some(url) = &self.gas_price_feed_url {
            chain = chain.with_gas_price(GasPriceStrategy::Feed { url: url.clone() });
        }
        chain
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse `name=url,name=url`. Names must be unique.
pub fn parse_nodes(raw: &str) -> Result<Vec<NodeEntry>, AppError> {
    let mut nodes: Vec<NodeEntry> = Vec::new();

    for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (name, url) = item
            .split_once('=')
            .ok_or_else(|| AppError::Config(format!("expected name=url, got '{}'", item)))?;
        let (name, url) = (name.trim(), url.trim());

        if name.is_empty() || url.is_empty() {
            return Err(AppError::Config(format!("expected name=url, got '{}'", item)));
        }
        if nodes.iter().any(|n| n.name == name) {
            return Err(AppError::Config(format!("duplicate node name '{}'", name)));
        }

        nodes.push(NodeEntry { name: name.to_string(), url: url.to_string() });
    }

    if nodes.is_empty() {
        return Err(AppError::Config("no nodes configured".into()));
    }
    Ok(nodes)
}
