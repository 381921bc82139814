//! Transaction, receipt and status types.

use alloy::{
    consensus::{
        Eip658Value, SignableTransaction, Signed, Transaction as ConsensusTx, TxEnvelope,
        TxLegacy, TxReceipt,
    },
    eips::eip2718::Encodable2718,
    network::TransactionResponse,
    primitives::{Address, Bytes, Signature, TxHash, TxKind, B256, U256},
    rpc::types::{Header, Log, Transaction, TransactionReceipt},
};
use serde::{Deserialize, Serialize};

/// A transaction ready to be signed. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub nonce: u64,
    /// Destination; `None` creates a contract.
    pub to: Option<Address>,
    pub value: U256,
    pub gas_limit: u64,
    /// Gas price in wei.
    pub gas_price: u128,
    pub data: Bytes,
}

impl UnsignedTransaction {
    /// Legacy consensus form, optionally bound to a chain id (EIP-155).
    pub fn to_legacy(&self, chain_id: Option<u64>) -> TxLegacy {
        TxLegacy {
            chain_id,
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            to: match self.to {
                Some(addr) => TxKind::Call(addr),
                None => TxKind::Create,
            },
            value: self.value,
            input: self.data.clone(),
        }
    }

    /// Maximum fee this transaction can burn (gas limit × gas price).
    pub fn max_fee(&self) -> U256 {
        U256::from(self.gas_limit) * U256::from(self.gas_price)
    }
}

/// An [`UnsignedTransaction`] plus its signature. Only produced by a signer.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedTransaction {
    inner: Signed<TxLegacy>,
}

impl SignedTransaction {
    /// Attach a signature produced elsewhere (e.g. by a hardware device).
    pub fn from_parts(
        unsigned: &UnsignedTransaction,
        chain_id: Option<u64>,
        signature: Signature,
    ) -> Self {
        Self { inner: unsigned.to_legacy(chain_id).into_signed(signature) }
    }

    pub(crate) fn from_signed(inner: Signed<TxLegacy>) -> Self {
        Self { inner }
    }

    /// Canonical transaction hash.
    pub fn hash(&self) -> TxHash {
        *self.inner.hash()
    }

    pub fn signature(&self) -> &Signature {
        self.inner.signature()
    }

    /// Chain id bound into the signature, if any.
    pub fn chain_id(&self) -> Option<u64> {
        self.inner.tx().chain_id
    }

    /// The transaction fields without the signature.
    pub fn unsigned(&self) -> UnsignedTransaction {
        let tx = self.inner.tx();
        UnsignedTransaction {
            nonce: tx.nonce,
            to: tx.to.to().copied(),
            value: tx.value,
            gas_limit: tx.gas_limit,
            gas_price: tx.gas_price,
            data: tx.input.clone(),
        }
    }

    /// Wire encoding accepted by `eth_sendRawTransaction`.
    pub fn encoded(&self) -> Bytes {
        TxEnvelope::Legacy(self.inner.clone()).encoded_2718().into()
    }
}

/// A transaction as reported by a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainTransaction {
    pub hash: TxHash,
    pub from: Address,
    pub to: Option<Address>,
    pub nonce: u64,
    pub value: U256,
    pub gas_limit: u64,
    pub gas_price: u128,
    pub input: Bytes,
    /// `None` while the transaction is not mined.
    pub block_number: Option<u64>,
}

impl ChainTransaction {
    pub fn is_pending(&self) -> bool {
        self.block_number.is_none()
    }
}

impl From<&Transaction> for ChainTransaction {
    fn from(tx: &Transaction) -> Self {
        let gas_price = tx
            .effective_gas_price
            .or_else(|| ConsensusTx::gas_price(tx))
            .unwrap_or_else(|| ConsensusTx::max_fee_per_gas(tx));

        Self {
            hash: TransactionResponse::tx_hash(tx),
            from: TransactionResponse::from(tx),
            to: ConsensusTx::to(tx),
            nonce: ConsensusTx::nonce(tx),
            value: ConsensusTx::value(tx),
            gas_limit: ConsensusTx::gas_limit(tx),
            gas_price,
            input: ConsensusTx::input(tx).clone(),
            block_number: tx.block_number,
        }
    }
}

/// One emitted log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

impl From<&Log> for LogEntry {
    fn from(log: &Log) -> Self {
        Self {
            address: log.address(),
            topics: log.topics().to_vec(),
            data: log.data().data.clone(),
        }
    }
}

/// Execution outcome as stored in a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    Success,
    Failure,
    /// Pre-Byzantium receipts carry a state root instead of a status.
    PostState(B256),
}

/// Mined outcome of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub status: ReceiptStatus,
    pub gas_used: u64,
    pub logs: Vec<LogEntry>,
    pub block_number: Option<u64>,
}

impl From<&TransactionReceipt> for Receipt {
    fn from(receipt: &TransactionReceipt) -> Self {
        let status = match receipt.inner.status_or_post_state() {
            Eip658Value::Eip658(true) => ReceiptStatus::Success,
            Eip658Value::Eip658(false) => ReceiptStatus::Failure,
            Eip658Value::PostState(root) => ReceiptStatus::PostState(root),
        };

        Self {
            status,
            gas_used: receipt.gas_used,
            logs: receipt.inner.logs().iter().map(LogEntry::from).collect(),
            block_number: receipt.block_number,
        }
    }
}

/// Block header fields the library exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub number: u64,
    pub hash: B256,
    pub parent_hash: B256,
    pub timestamp: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub base_fee_per_gas: Option<u64>,
}

impl From<&Header> for BlockHeader {
    fn from(header: &Header) -> Self {
        Self {
            number: header.number,
            hash: header.hash,
            parent_hash: header.parent_hash,
            timestamp: header.timestamp,
            gas_limit: header.gas_limit,
            gas_used: header.gas_used,
            base_fee_per_gas: header.base_fee_per_gas,
        }
    }
}

/// Lifecycle status of a transaction hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Error,
    NotFound,
    Pending,
    Reverted,
    Done,
    Lost,
}

impl TxStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TxStatus::Error => "error",
            TxStatus::NotFound => "notfound",
            TxStatus::Pending => "pending",
            TxStatus::Reverted => "reverted",
            TxStatus::Done => "done",
            TxStatus::Lost => "lost",
        }
    }

    /// Whether polling can stop at this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, TxStatus::Reverted | TxStatus::Done | TxStatus::Lost)
    }
}

impl std::fmt::Display for TxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a hash together with the reads it was derived from.
///
/// `done` and `reverted` always carry a receipt; `pending` and `notfound`
/// never do. The constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxInfo {
    status: TxStatus,
    transaction: Option<ChainTransaction>,
    receipt: Option<Receipt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl TxInfo {
    /// The lookup itself failed; `message` says why.
    pub fn error(message: impl Into<String>) -> Self {
        Self { status: TxStatus::Error, transaction: None, receipt: None, error: Some(message.into()) }
    }

    pub fn not_found() -> Self {
        Self { status: TxStatus::NotFound, transaction: None, receipt: None, error: None }
    }

    pub fn lost() -> Self {
        Self { status: TxStatus::Lost, transaction: None, receipt: None, error: None }
    }

    pub fn pending(transaction: ChainTransaction) -> Self {
        Self { status: TxStatus::Pending, transaction: Some(transaction), receipt: None, error: None }
    }

    /// A mined transaction; the status follows from the receipt.
    pub fn mined(transaction: ChainTransaction, receipt: Receipt) -> Self {
        let status = match receipt.status {
            ReceiptStatus::Success | ReceiptStatus::PostState(_) => TxStatus::Done,
            ReceiptStatus::Failure => TxStatus::Reverted,
        };
        Self { status, transaction: Some(transaction), receipt: Some(receipt), error: None }
    }

    pub fn status(&self) -> TxStatus {
        self.status
    }

    pub fn transaction(&self) -> Option<&ChainTransaction> {
        self.transaction.as_ref()
    }

    pub fn receipt(&self) -> Option<&Receipt> {
        self.receipt.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Fee paid in wei (gas used × gas price), once mined.
    pub fn gas_cost(&self) -> Option<U256> {
        let tx = self.transaction.as_ref()?;
        let receipt = self.receipt.as_ref()?;
        Some(U256::from(receipt.gas_used) * U256::from(tx.gas_price))
    }
}
