//! Ethereum interaction module.
//!
//! Contains the node abstraction, the redundant client, signing,
//! broadcasting, and contract bindings.

pub mod broadcaster;
pub mod chain;
pub mod client;
pub mod constants;
pub mod contracts;
pub mod explorer;
pub mod gas;
pub mod node;
pub mod signer;

pub use broadcaster::{BroadcastOutcome, Broadcaster};
pub use chain::{Chain, ChainConfig, ExplorerKind, GasPriceStrategy};
pub use client::EthereumClient;
pub use explorer::{AbiFetcher, ExplorerClient, StaticAbiFetcher};
pub use gas::{GasPriceFeed, GasPriceOracle, GasStationFeed};
pub use node::{HttpProvider, LogQuery, Node, NonceKind, RpcNode};
pub use signer::{LocalKeySigner, TxSigner};
