//! Contract ABI lookup.

use std::collections::HashMap;

use alloy::{json_abi::JsonAbi, primitives::Address};
use async_trait::async_trait;
use serde::Deserialize;

use super::chain::ExplorerKind;
use crate::error::{AppError, Result};

/// Source of verified contract ABIs.
#[async_trait]
pub trait AbiFetcher: Send + Sync {
    async fn fetch_abi(&self, address: Address) -> Result<JsonAbi>;
}

#[derive(Debug, Deserialize)]
struct EtherscanResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: String,
}

#[derive(Debug, Deserialize)]
struct TomoscanResponse {
    #[serde(default)]
    contract: Option<TomoscanContract>,
}

#[derive(Debug, Deserialize)]
struct TomoscanContract {
    #[serde(rename = "abiCode", default)]
    abi_code: String,
}

fn parse_abi(address: Address, raw: &str) -> Result<JsonAbi> {
    serde_json::from_str(raw)
        .map_err(|e| AppError::Explorer(format!("invalid ABI for {}: {}", address, e)))
}

/// Block explorer HTTP client.
#[derive(Debug, Clone)]
pub struct ExplorerClient {
    kind: ExplorerKind,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl ExplorerClient {
    pub fn new(kind: ExplorerKind, api_key: Option<String>) -> Self {
        Self { kind, api_key, http: reqwest::Client::new() }
    }

    /// URL queried for `address`.
    pub fn abi_url(&self, address: Address) -> String {
        match &self.kind {
            ExplorerKind::Etherscan { domain } => {
                let mut url = format!(
                    "https://{}/api?module=contract&action=getabi&address={}",
                    domain, address
                );
                if let Some(key) = &self.api_key {
                    url.push_str("&apikey=");
                    url.push_str(key);
                }
                url
            }
            ExplorerKind::Tomoscan { url } => format!("{}/{}", url.trim_end_matches('/'), address),
        }
    }

    async fn get(&self, url: &str) -> Result<String> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::Explorer(e.to_string()))?;
        response.text().await.map_err(|e| AppError::Explorer(e.to_string()))
    }
}

/// Decode an etherscan `getabi` body.
fn abi_from_etherscan(address: Address, body: &str) -> Result<JsonAbi> {
    let parsed: EtherscanResponse = serde_json::from_str(body)
        .map_err(|e| AppError::Explorer(format!("unexpected explorer response: {}", e)))?;
    if parsed.status != "1" {
        return Err(AppError::Explorer(format!(
            "no ABI for {}: {} ({})",
            address, parsed.message, parsed.result
        )));
    }
    parse_abi(address, &parsed.result)
}

/// Decode a tomoscan account body.
fn abi_from_tomoscan(address: Address, body: &str) -> Result<JsonAbi> {
    let parsed: TomoscanResponse = serde_json::from_str(body)
        .map_err(|e| AppError::Explorer(format!("unexpected explorer response: {}", e)))?;
    match parsed.contract {
        Some(contract) if !contract.abi_code.is_empty() => parse_abi(address, &contract.abi_code),
        _ => Err(AppError::Explorer(format!("no verified ABI for {}", address))),
    }
}

#[async_trait]
impl AbiFetcher for ExplorerClient {
    async fn fetch_abi(&self, address: Address) -> Result<JsonAbi> {
        let url = self.abi_url(address);
        tracing::debug!(address = %address, "Fetching contract ABI");

        let body = self.get(&url).await?;
        match &self.kind {
            ExplorerKind::Etherscan { .. } => abi_from_etherscan(address, &body),
            ExplorerKind::Tomoscan { .. } => abi_from_tomoscan(address, &body),
        }
    }
}

/// In-memory ABI table, for offline analysis and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticAbiFetcher {
    abis: HashMap<Address, JsonAbi>,
}

impl StaticAbiFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, address: Address, abi: JsonAbi) -> Self {
        self.insert(address, abi);
        self
    }

    pub fn insert(&mut self, address: Address, abi: JsonAbi) {
        self.abis.insert(address, abi);
    }
}

#[async_trait]
impl AbiFetcher for StaticAbiFetcher {
    async fn fetch_abi(&self, address: Address) -> Result<JsonAbi> {
        self.abis
            .get(&address)
            .cloned()
            .ok_or_else(|| AppError::Explorer(format!("no ABI registered for {}", address)))
    }
}
