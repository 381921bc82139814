//! Common utilities for integration tests.
#![allow(dead_code)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use alloy::{
    primitives::{keccak256, Address, Bytes, TxHash, U256},
    rpc::types::TransactionRequest,
};
use async_trait::async_trait;
use ethkit::{
    ethereum::{LogQuery, NonceKind, StaticAbiFetcher},
    types::{BlockHeader, ChainTransaction, LogEntry, Receipt},
    AppError, Chain, ChainConfig, Config, EthereumClient, GasPriceOracle, Node, Result,
};

/// In-memory [`Node`] with scripted answers.
///
/// Every call sleeps `delay` first, then fails with `failure` if set.
pub struct MockNode {
    name: String,
    delay: Duration,
    failure: Option<String>,
    send_failure: Option<String>,
    balance: U256,
    mined_nonce: u64,
    pending_nonce: u64,
    code: Bytes,
    gas_estimate: u64,
    gas_price: u128,
    call_output: Bytes,
    block_number: u64,
    transaction: Mutex<Option<ChainTransaction>>,
    receipt: Mutex<Option<Receipt>>,
    sent: Mutex<Vec<Bytes>>,
}

impl MockNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            delay: Duration::ZERO,
            failure: None,
            send_failure: None,
            balance: U256::ZERO,
            mined_nonce: 0,
            pending_nonce: 0,
            code: Bytes::new(),
            gas_estimate: 21_000,
            gas_price: 1_000_000_000,
            call_output: Bytes::new(),
            block_number: 1,
            transaction: Mutex::new(None),
            receipt: Mutex::new(None),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn rejecting_sends(mut self, message: &str) -> Self {
        self.send_failure = Some(message.to_string());
        self
    }

    pub fn with_balance(mut self, balance: U256) -> Self {
        self.balance = balance;
        self
    }

    pub fn with_nonces(mut self, mined: u64, pending: u64) -> Self {
        self.mined_nonce = mined;
        self.pending_nonce = pending;
        self
    }

    pub fn with_code(mut self, code: &[u8]) -> Self {
        self.code = Bytes::copy_from_slice(code);
        self
    }

    pub fn with_gas_estimate(mut self, gas: u64) -> Self {
        self.gas_estimate = gas;
        self
    }

    pub fn with_call_output(mut self, output: Bytes) -> Self {
        self.call_output = output;
        self
    }

    pub fn with_transaction(self, tx: ChainTransaction, receipt: Option<Receipt>) -> Self {
        self.set_transaction(Some(tx), receipt);
        self
    }

    pub fn set_transaction(&self, tx: Option<ChainTransaction>, receipt: Option<Receipt>) {
        *self.transaction.lock().unwrap() = tx;
        *self.receipt.lock().unwrap() = receipt;
    }

    /// Raw transactions this node accepted.
    pub fn sent(&self) -> Vec<Bytes> {
        self.sent.lock().unwrap().clone()
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    async fn respond<T>(&self, value: T) -> Result<T> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.failure {
            Some(message) => Err(AppError::provider(&self.name, message)),
            None => Ok(value),
        }
    }
}

#[async_trait]
impl Node for MockNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn url(&self) -> &str {
        "mock://"
    }

    async fn balance(&self, _address: Address) -> Result<U256> {
        self.respond(self.balance).await
    }

    async fn nonce(&self, _address: Address, kind: NonceKind) -> Result<u64> {
        let nonce = match kind {
            NonceKind::Mined => self.mined_nonce,
            NonceKind::Pending => self.pending_nonce,
        };
        self.respond(nonce).await
    }

    async fn code(&self, _address: Address) -> Result<Bytes> {
        self.respond(self.code.clone()).await
    }

    async fn transaction_by_hash(&self, hash: TxHash) -> Result<Option<ChainTransaction>> {
        let tx = self.transaction.lock().unwrap().clone().filter(|tx| tx.hash == hash);
        self.respond(tx).await
    }

    async fn receipt(&self, hash: TxHash) -> Result<Option<Receipt>> {
        let known = self.transaction.lock().unwrap().as_ref().map(|tx| tx.hash) == Some(hash);
        let receipt = if known { self.receipt.lock().unwrap().clone() } else { None };
        self.respond(receipt).await
    }

    async fn estimate_gas(&self, _request: TransactionRequest) -> Result<u64> {
        self.respond(self.gas_estimate).await
    }

    async fn gas_price(&self) -> Result<u128> {
        self.respond(self.gas_price).await
    }

    async fn logs(&self, _query: &LogQuery) -> Result<Vec<LogEntry>> {
        let logs = self.receipt.lock().unwrap().as_ref().map(|r| r.logs.clone()).unwrap_or_default();
        self.respond(logs).await
    }

    async fn header_by_number(&self, number: Option<u64>) -> Result<BlockHeader> {
        let header = BlockHeader {
            number: number.unwrap_or(self.block_number),
            hash: Default::default(),
            parent_hash: Default::default(),
            timestamp: 0,
            gas_limit: 30_000_000,
            gas_used: 0,
            base_fee_per_gas: None,
        };
        self.respond(header).await
    }

    async fn call(&self, _to: Address, _data: Bytes, _block: Option<u64>) -> Result<Bytes> {
        self.respond(self.call_output.clone()).await
    }

    async fn send_raw(&self, raw: Bytes) -> Result<TxHash> {
        let hash = keccak256(&raw);
        self.respond(()).await?;
        if let Some(message) = &self.send_failure {
            return Err(AppError::provider(&self.name, message));
        }
        self.sent.lock().unwrap().push(raw);
        Ok(hash)
    }

    async fn block_number(&self) -> Result<u64> {
        self.respond(self.block_number).await
    }

    async fn raw_request(
        &self,
        method: &str,
        _params: serde_json::Value,
    ) -> Result<serde_json::Value> {
        self.respond(serde_json::json!({ "method": method })).await
    }
}

/// Client over `nodes` with a fixed 10 Gwei gas price and no explorer.
pub fn client_with(nodes: Vec<Arc<MockNode>>, fetcher: StaticAbiFetcher) -> EthereumClient {
    let nodes = nodes.into_iter().map(|n| n as Arc<dyn Node>).collect();
    EthereumClient::new(ChainConfig::for_chain(Chain::Ethereum), nodes, Arc::new(fetcher))
        .unwrap()
        .with_gas_oracle(GasPriceOracle::fixed(10.0))
}

/// Client from environment variables, for network tests.
pub fn create_test_client() -> Option<EthereumClient> {
    let config = Config::from_env().ok()?;
    EthereumClient::from_config(&config).ok()
}

/// Skip test if the client cannot be created (missing env vars).
#[macro_export]
macro_rules! skip_if_no_client {
    () => {
        match common::create_test_client() {
            Some(client) => client,
            None => {
                eprintln!("Skipping test: ETHEREUM_RPC_NODES not set");
                return;
            }
        }
    };
}
