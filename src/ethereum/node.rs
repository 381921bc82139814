//! Single JSON-RPC endpoint.
//!
//! A [`Node`] performs exactly one call against one endpoint and reports
//! failures as [`AppError::Provider`] tagged with its name. Redundancy lives
//! one level up in [`EthereumClient`](super::EthereumClient).

use std::{borrow::Cow, sync::Arc};

use alloy::{
    eips::{BlockId, BlockNumberOrTag},
    network::Ethereum,
    primitives::{Address, Bytes, TxHash, B256, U256},
    providers::{Provider, ProviderBuilder, RootProvider},
    rpc::types::{Filter, TransactionRequest},
};
use async_trait::async_trait;

use crate::{
    config::NodeEntry,
    error::{AppError, Result},
    types::{BlockHeader, ChainTransaction, LogEntry, Receipt},
};

/// Type alias for the HTTP provider.
pub type HttpProvider = RootProvider<Ethereum>;

/// Which nonce to read for an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceKind {
    /// Transactions included in the latest block.
    Mined,
    /// Mined plus those sitting in the node's pool.
    Pending,
}

/// Log filter: a set of emitting contracts and a single topic0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
    pub addresses: Vec<Address>,
    pub topic: Option<B256>,
    pub from_block: u64,
    /// `None` leaves the range open up to the latest block.
    pub to_block: Option<u64>,
}

impl LogQuery {
    fn to_filter(&self) -> Filter {
        let mut filter = Filter::new().address(self.addresses.clone()).from_block(self.from_block);
        if let Some(to) = self.to_block {
            filter = filter.to_block(to);
        }
        if let Some(topic) = self.topic {
            filter = filter.event_signature(topic);
        }
        filter
    }
}

/// One Ethereum JSON-RPC endpoint.
#[async_trait]
pub trait Node: Send + Sync {
    /// Unique name used in error aggregation.
    fn name(&self) -> &str;

    fn url(&self) -> &str;

    async fn balance(&self, address: Address) -> Result<U256>;

    async fn nonce(&self, address: Address, kind: NonceKind) -> Result<u64>;

    async fn code(&self, address: Address) -> Result<Bytes>;

    /// `None` when the node does not know the hash.
    async fn transaction_by_hash(&self, hash: TxHash) -> Result<Option<ChainTransaction>>;

    /// `None` until the transaction is mined.
    async fn receipt(&self, hash: TxHash) -> Result<Option<Receipt>>;

    async fn estimate_gas(&self, request: TransactionRequest) -> Result<u64>;

    /// Gas price suggested by the node, in wei.
    async fn gas_price(&self) -> Result<u128>;

    async fn logs(&self, query: &LogQuery) -> Result<Vec<LogEntry>>;

    /// Header at `number`, or the latest header for `None`.
    async fn header_by_number(&self, number: Option<u64>) -> Result<BlockHeader>;

    /// `eth_call` at `block` (latest when `None`).
    async fn call(&self, to: Address, data: Bytes, block: Option<u64>) -> Result<Bytes>;

    async fn send_raw(&self, raw: Bytes) -> Result<TxHash>;

    async fn block_number(&self) -> Result<u64>;

    /// Untyped request for methods without a dedicated wrapper.
    async fn raw_request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value>;
}

/// [`Node`] backed by an alloy HTTP provider.
#[derive(Clone)]
pub struct RpcNode {
    name: String,
    url: String,
    provider: HttpProvider,
}

impl RpcNode {
    /// Create a node handle.
    ///
    /// Note: This does NOT make any network calls.
    pub fn new(name: impl Into<String>, url: &str) -> Result<Self> {
        let name = name.into();
        let parsed = url
            .parse()
            .map_err(|_| AppError::Config(format!("Invalid RPC URL for {}: {}", name, url)))?;

        let provider = ProviderBuilder::new().connect_http(parsed).root().clone();

        tracing::info!(node = %name, rpc_url = %url, "Ethereum node registered");

        Ok(Self { name, url: url.to_string(), provider })
    }

    /// One node per configured entry.
    pub fn connect_all(entries: &[NodeEntry]) -> Result<Vec<Arc<dyn Node>>> {
        entries
            .iter()
            .map(|entry| Ok(Arc::new(Self::new(&entry.name, &entry.url)?) as Arc<dyn Node>))
            .collect()
    }

    /// Get the underlying provider.
    pub fn provider(&self) -> &HttpProvider {
        &self.provider
    }

    fn err(&self, err: impl std::fmt::Display) -> AppError {
        AppError::provider(&self.name, err)
    }
}

impl std::fmt::Debug for RpcNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcNode").field("name", &self.name).field("url", &self.url).finish()
    }
}

fn block_id(block: Option<u64>) -> BlockId {
    match block {
        Some(n) => BlockId::number(n),
        None => BlockId::latest(),
    }
}

#[async_trait]
impl Node for RpcNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn url(&self) -> &str {
        &self.url
    }

    async fn balance(&self, address: Address) -> Result<U256> {
        self.provider.get_balance(address).await.map_err(|e| self.err(e))
    }

    async fn nonce(&self, address: Address, kind: NonceKind) -> Result<u64> {
        let call = self.provider.get_transaction_count(address);
        let result = match kind {
            NonceKind::Mined => call.latest().await,
            NonceKind::Pending => call.pending().await,
        };
        result.map_err(|e| self.err(e))
    }

    async fn code(&self, address: Address) -> Result<Bytes> {
        self.provider.get_code_at(address).await.map_err(|e| self.err(e))
    }

    async fn transaction_by_hash(&self, hash: TxHash) -> Result<Option<ChainTransaction>> {
        let tx = self.provider.get_transaction_by_hash(hash).await.map_err(|e| self.err(e))?;
        Ok(tx.as_ref().map(ChainTransaction::from))
    }

    async fn receipt(&self, hash: TxHash) -> Result<Option<Receipt>> {
        let receipt =
            self.provider.get_transaction_receipt(hash).await.map_err(|e| self.err(e))?;
        Ok(receipt.as_ref().map(Receipt::from))
    }

    async fn estimate_gas(&self, request: TransactionRequest) -> Result<u64> {
        self.provider.estimate_gas(request).await.map_err(|e| self.err(e))
    }

    async fn gas_price(&self) -> Result<u128> {
        self.provider.get_gas_price().await.map_err(|e| self.err(e))
    }

    async fn logs(&self, query: &LogQuery) -> Result<Vec<LogEntry>> {
        let logs = self.provider.get_logs(&query.to_filter()).await.map_err(|e| self.err(e))?;
        Ok(logs.iter().map(LogEntry::from).collect())
    }

    async fn header_by_number(&self, number: Option<u64>) -> Result<BlockHeader> {
        let tag = match number {
            Some(n) => BlockNumberOrTag::Number(n),
            None => BlockNumberOrTag::Latest,
        };
        let block = self
            .provider
            .get_block_by_number(tag)
            .await
            .map_err(|e| self.err(e))?
            .ok_or_else(|| self.err(format!("block {} not found", tag)))?;
        Ok(BlockHeader::from(&block.header))
    }

    async fn call(&self, to: Address, data: Bytes, block: Option<u64>) -> Result<Bytes> {
        let tx = TransactionRequest::default().to(to).input(data.into());
        self.provider.call(tx).block(block_id(block)).await.map_err(|e| self.err(e))
    }

    async fn send_raw(&self, raw: Bytes) -> Result<TxHash> {
        let pending = self.provider.send_raw_transaction(&raw).await.map_err(|e| self.err(e))?;
        Ok(*pending.tx_hash())
    }

    async fn block_number(&self) -> Result<u64> {
        self.provider.get_block_number().await.map_err(|e| self.err(e))
    }

    async fn raw_request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let method: Cow<'static, str> = Cow::Owned(method.to_string());
        self.provider
            .raw_request::<serde_json::Value, serde_json::Value>(method, params)
            .await
            .map_err(|e| self.err(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, b256};

    #[test]
    fn test_rpc_node_creation_is_lazy() {
        let node = RpcNode::new("local", "http://127.0.0.1:8545").unwrap();
        assert_eq!(node.name(), "local");
        assert_eq!(node.url(), "http://127.0.0.1:8545");
    }

    #[test]
    fn test_rpc_node_invalid_url() {
        let err = RpcNode::new("broken", "not a url").unwrap_err();
        match err {
            AppError::Config(msg) => assert!(msg.contains("broken")),
            other => panic!("Expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_connect_all() {
        let entries = vec![
            NodeEntry { name: "a".into(), url: "http://127.0.0.1:8545".into() },
            NodeEntry { name: "b".into(), url: "http://127.0.0.1:8546".into() },
        ];
        let nodes = RpcNode::connect_all(&entries).unwrap();
        let names: Vec<&str> = nodes.iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_rpc_node_debug_shows_name() {
        let node = RpcNode::new("infura", "http://127.0.0.1:8545").unwrap();
        let debug = format!("{:?}", node);
        assert!(debug.contains("RpcNode"));
        assert!(debug.contains("infura"));
    }

    #[test]
    fn test_log_query_to_filter() {
        let token = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
        let transfer = b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef");
        let query = LogQuery {
            addresses: vec![token],
            topic: Some(transfer),
            from_block: 100,
            to_block: Some(200),
        };
        let filter = query.to_filter();
        assert_eq!(filter.get_from_block(), Some(100));
        assert_eq!(filter.get_to_block(), Some(200));
        assert!(filter.address.matches(&token));
    }

    #[test]
    fn test_log_query_open_range() {
        let query = LogQuery { from_block: 5, ..Default::default() };
        let filter = query.to_filter();
        assert_eq!(filter.get_from_block(), Some(5));
        assert_eq!(filter.get_to_block(), None);
    }
}
