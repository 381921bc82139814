//! Redundant Ethereum RPC client.
//!
//! Every read is raced across all configured nodes: one task per node, each
//! bounded by the per-call timeout. The first success wins; when every node
//! fails the caller gets an [`AppError::Aggregate`] naming each of them.

use std::{collections::BTreeMap, future::Future, sync::Arc, time::Duration};

use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt},
    network::TransactionBuilder,
    json_abi::JsonAbi,
    primitives::{Address, Bytes, TxHash, U256},
    rpc::types::TransactionRequest,
};
use tokio::{sync::mpsc, time::timeout};

use super::{
    chain::ChainConfig,
    constants::{GWEI_DECIMALS, NODE_CALL_TIMEOUT},
    contracts::{self, erc20},
    explorer::{AbiFetcher, ExplorerClient},
    gas::GasPriceOracle,
    node::{LogQuery, Node, NonceKind, RpcNode},
};
use crate::{
    config::Config,
    error::{AggregateError, AppError, Result},
    types::{
        fixed_point_to_float, gwei_to_wei_u128, BlockHeader, ChainTransaction, LogEntry, Receipt,
        TxInfo,
    },
};

/// Redundant query engine over a named set of nodes.
#[derive(Clone)]
pub struct EthereumClient {
    chain: ChainConfig,
    nodes: Arc<BTreeMap<String, Arc<dyn Node>>>,
    call_timeout: Duration,
    gas_oracle: GasPriceOracle,
    abi_fetcher: Arc<dyn AbiFetcher>,
}

impl EthereumClient {
    /// Create a client over `nodes`.
    ///
    /// Note: This does NOT make any network calls. Node names must be unique.
    pub fn new(
        chain: ChainConfig,
        nodes: Vec<Arc<dyn Node>>,
        abi_fetcher: Arc<dyn AbiFetcher>,
    ) -> Result<Self> {
        let mut by_name = BTreeMap::new();
        for node in nodes {
            let name = node.name().to_string();
            if by_name.insert(name.clone(), node).is_some() {
                return Err(AppError::Config(format!("duplicate node name '{}'", name)));
            }
        }

        tracing::info!(
            chain = %chain.chain,
            nodes = by_name.len(),
            "Ethereum client created"
        );

        Ok(Self {
            gas_oracle: GasPriceOracle::from_strategy(&chain.gas_price),
            chain,
            nodes: Arc::new(by_name),
            call_timeout: NODE_CALL_TIMEOUT,
            abi_fetcher,
        })
    }

    /// Create a client from environment configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let chain = config.chain_config();
        let fetcher = ExplorerClient::new(chain.explorer.clone(), chain.explorer_api_key.clone());
        let nodes = RpcNode::connect_all(&config.rpc_nodes)?;
        Self::new(chain, nodes, Arc::new(fetcher))
    }

    /// Override the per-node call timeout.
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Override the gas price oracle.
    pub fn with_gas_oracle(mut self, oracle: GasPriceOracle) -> Self {
        self.gas_oracle = oracle;
        self
    }

    pub fn chain(&self) -> &ChainConfig {
        &self.chain
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Configured nodes, ordered by name.
    pub fn nodes(&self) -> Vec<Arc<dyn Node>> {
        self.nodes.values().cloned().collect()
    }

    // ========================================================================
    // Query engine
    // ========================================================================

    /// Start `f` on every node; results arrive in completion order.
    fn fan_out<T, F, Fut>(&self, f: F) -> mpsc::Receiver<(String, Result<T>)>
    where
        T: Send + 'static,
        F: Fn(Arc<dyn Node>) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(self.nodes.len().max(1));

        for (name, node) in self.nodes.iter() {
            let tx = tx.clone();
            let name = name.clone();
            let call = f(node.clone());
            let limit = self.call_timeout;

            tokio::spawn(async move {
                let result = match timeout(limit, call).await {
                    Ok(result) => result,
                    Err(_) => Err(AppError::provider(&name, format!("timed out after {:?}", limit))),
                };
                let _ = tx.send((name, result)).await;
            });
        }

        rx
    }

    /// Race `f` across all nodes and return the first success.
    pub async fn race<T, F, Fut>(&self, operation: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: Fn(Arc<dyn Node>) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        if self.nodes.is_empty() {
            return Err(AppError::Aggregate { operation, errors: AggregateError::default() });
        }

        let mut rx = self.fan_out(f);
        let mut errors = BTreeMap::new();

        while let Some((name, result)) = rx.recv().await {
            match result {
                Ok(value) => {
                    tracing::debug!(node = %name, operation, "Node call succeeded");
                    return Ok(value);
                }
                Err(e) => {
                    tracing::warn!(node = %name, operation, error = %e, "Node call failed");
                    errors.insert(name, e.into_node_message());
                }
            }
        }

        Err(AppError::Aggregate { operation, errors: AggregateError::new(errors) })
    }

    /// Race a lookup that may legitimately find nothing.
    ///
    /// The first `Some` wins. If no node found the item but at least one
    /// answered, the result is `Ok(None)`. Only when every node errors is an
    /// aggregate returned.
    pub async fn race_optional<T, F, Fut>(&self, operation: &'static str, f: F) -> Result<Option<T>>
    where
        T: Send + 'static,
        F: Fn(Arc<dyn Node>) -> Fut,
        Fut: Future<Output = Result<Option<T>>> + Send + 'static,
    {
        if self.nodes.is_empty() {
            return Err(AppError::Aggregate { operation, errors: AggregateError::default() });
        }

        let mut rx = self.fan_out(f);
        let mut errors = BTreeMap::new();
        let mut answered = false;

        while let Some((name, result)) = rx.recv().await {
            match result {
                Ok(Some(value)) => {
                    tracing::debug!(node = %name, operation, "Node call succeeded");
                    return Ok(Some(value));
                }
                Ok(None) => answered = true,
                Err(e) => {
                    tracing::warn!(node = %name, operation, error = %e, "Node call failed");
                    errors.insert(name, e.into_node_message());
                }
            }
        }

        if answered {
            Ok(None)
        } else {
            Err(AppError::Aggregate { operation, errors: AggregateError::new(errors) })
        }
    }

    // ========================================================================
    // Read primitives
    // ========================================================================

    /// Get native balance for an address.
    pub async fn get_balance(&self, address: Address) -> Result<U256> {
        self.race("get_balance", move |node| async move { node.balance(address).await }).await
    }

    /// Nonce counting only mined transactions.
    pub async fn get_mined_nonce(&self, address: Address) -> Result<u64> {
        self.race("get_mined_nonce", move |node| async move {
            node.nonce(address, NonceKind::Mined).await
        })
        .await
    }

    /// Nonce including transactions in the node's pool.
    pub async fn get_pending_nonce(&self, address: Address) -> Result<u64> {
        self.race("get_pending_nonce", move |node| async move {
            node.nonce(address, NonceKind::Pending).await
        })
        .await
    }

    pub async fn get_code(&self, address: Address) -> Result<Bytes> {
        self.race("get_code", move |node| async move { node.code(address).await }).await
    }

    /// Whether `address` has deployed code.
    pub async fn is_contract(&self, address: Address) -> Result<bool> {
        Ok(!self.get_code(address).await?.is_empty())
    }

    pub async fn transaction_by_hash(&self, hash: TxHash) -> Result<Option<ChainTransaction>> {
        self.race_optional("transaction_by_hash", move |node| async move {
            node.transaction_by_hash(hash).await
        })
        .await
    }

    pub async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<Receipt>> {
        self.race_optional("transaction_receipt", move |node| async move {
            node.receipt(hash).await
        })
        .await
    }

    /// Estimate gas for a call or creation (`to == None`).
    pub async fn estimate_gas(
        &self,
        from: Address,
        to: Option<Address>,
        gas_price_gwei: f64,
        value: U256,
        data: Bytes,
    ) -> Result<u64> {
        let mut request = TransactionRequest::default()
            .from(from)
            .gas_price(gwei_to_wei_u128(gas_price_gwei)?)
            .value(value)
            .input(data.into());
        request = match to {
            Some(to) => request.to(to),
            None => request.into_create(),
        };

        self.race("estimate_gas", move |node| {
            let request = request.clone();
            async move { node.estimate_gas(request).await }
        })
        .await
    }

    pub async fn get_logs(&self, query: LogQuery) -> Result<Vec<LogEntry>> {
        self.race("get_logs", move |node| {
            let query = query.clone();
            async move { node.logs(&query).await }
        })
        .await
    }

    /// Header at `number`, latest for `None`.
    pub async fn header_by_number(&self, number: Option<u64>) -> Result<BlockHeader> {
        self.race("header_by_number", move |node| async move {
            node.header_by_number(number).await
        })
        .await
    }

    pub async fn current_block(&self) -> Result<u64> {
        self.race("current_block", |node| async move { node.block_number().await }).await
    }

    /// Make a contract call at `block` (latest for `None`).
    pub async fn call_contract(&self, to: Address, data: Bytes, block: Option<u64>) -> Result<Bytes> {
        self.race("call_contract", move |node| {
            let data = data.clone();
            async move { node.call(to, data, block).await }
        })
        .await
    }

    /// Untyped JSON-RPC request.
    pub async fn raw_request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let method = method.to_string();
        self.race("raw_request", move |node| {
            let method = method.clone();
            let params = params.clone();
            async move { node.raw_request(&method, params).await }
        })
        .await
    }

    /// Nodes' `eth_gasPrice` suggestion, in wei.
    pub async fn node_gas_price(&self) -> Result<u128> {
        self.race("node_gas_price", |node| async move { node.gas_price().await }).await
    }

    // ========================================================================
    // Derived reads
    // ========================================================================

    /// Lifecycle status of `hash`.
    ///
    /// A mined transaction whose receipt cannot be read yet is reported
    /// `pending`; the next poll will pick the receipt up.
    pub async fn tx_info_from_hash(&self, hash: TxHash) -> TxInfo {
        let tx = match self.transaction_by_hash(hash).await {
            Ok(Some(tx)) => tx,
            Ok(None) => return TxInfo::not_found(),
            Err(e) => {
                tracing::warn!(hash = %hash, error = %e, "Transaction lookup failed");
                return TxInfo::error(e.to_string());
            }
        };

        if tx.is_pending() {
            return TxInfo::pending(tx);
        }

        match self.transaction_receipt(hash).await {
            Ok(Some(receipt)) => TxInfo::mined(tx, receipt),
            Ok(None) => TxInfo::pending(tx),
            Err(e) => {
                tracing::warn!(hash = %hash, error = %e, "Receipt lookup failed");
                TxInfo::pending(tx)
            }
        }
    }

    /// Verified ABI of `address` from this chain's explorer.
    pub async fn abi(&self, address: Address) -> Result<JsonAbi> {
        self.abi_fetcher.fetch_abi(address).await
    }

    /// Recommended gas price in Gwei.
    pub async fn recommended_gas_price(&self) -> Result<f64> {
        if self.gas_oracle.uses_nodes() {
            let wei = self.node_gas_price().await?;
            return Ok(fixed_point_to_float(U256::from(wei), GWEI_DECIMALS));
        }
        self.gas_oracle.recommended().await
    }

    // ========================================================================
    // Contract reads
    // ========================================================================

    /// Call `method(args)` on `address` and decode its outputs with `abi`.
    pub async fn read_contract(
        &self,
        address: Address,
        abi: &JsonAbi,
        method: &str,
        args: &[DynSolValue],
        block: Option<u64>,
    ) -> Result<Vec<DynSolValue>> {
        let function = contracts::find_function(abi, method, args.len())?;
        let data = function
            .abi_encode_input(args)
            .map_err(|e| AppError::Encode(format!("{}: {}", function.signature(), e)))?;

        let output = self.call_contract(address, data.into(), block).await?;
        contracts::decode_output(function, &output)
    }

    /// Like [`read_contract`](Self::read_contract), fetching the ABI first.
    pub async fn read_contract_by_address(
        &self,
        address: Address,
        method: &str,
        args: &[DynSolValue],
        block: Option<u64>,
    ) -> Result<Vec<DynSolValue>> {
        let abi = self.abi(address).await?;
        self.read_contract(address, &abi, method, args, block).await
    }

    /// Read an address-returning getter such as `owner()`.
    pub async fn address_from_contract(&self, contract: Address, method: &str) -> Result<Address> {
        let outputs = self.read_contract_by_address(contract, method, &[], None).await?;
        match outputs.first() {
            Some(DynSolValue::Address(address)) => Ok(*address),
            other => Err(AppError::Decode(format!(
                "{} on {} did not return an address: {:?}",
                method, contract, other
            ))),
        }
    }

    /// ERC-20 balance of `owner`, optionally at a historical block.
    pub async fn erc20_balance(
        &self,
        token: Address,
        owner: Address,
        block: Option<u64>,
    ) -> Result<U256> {
        tracing::debug!(token = %token, owner = %owner, "Querying ERC20 balance");
        let output = self.call_contract(token, erc20::balance_of_calldata(owner), block).await?;
        erc20::decode_amount(&output)
    }

    pub async fn erc20_decimals(&self, token: Address, block: Option<u64>) -> Result<u8> {
        let output = self.call_contract(token, erc20::decimals_calldata(), block).await?;
        erc20::decode_decimals(&output)
    }

    pub async fn erc20_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
        block: Option<u64>,
    ) -> Result<U256> {
        let output =
            self.call_contract(token, erc20::allowance_calldata(owner, spender), block).await?;
        erc20::decode_amount(&output)
    }
}

impl std::fmt::Debug for EthereumClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EthereumClient")
            .field("chain", &self.chain.chain)
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}
