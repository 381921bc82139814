//! ethkit
//!
//! A redundant multi-node client library for Ethereum-compatible chains.
//! Every read races all configured nodes and takes the first answer; every
//! broadcast goes to all of them.
//!
//! # Features
//!
//! - **Redundant reads**: balances, nonces, code, logs, headers, contract calls
//! - **Sending**: compose, sign and broadcast ETH, ERC20 and contract calls
//! - **Monitoring**: follow a hash until it is mined, reverted or lost
//! - **Analysis**: decode a transaction's method, parameters and logs by ABI
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ethkit::{Config, DefaultAddressBook, EthereumClient, TxAnalyzer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let client = Arc::new(EthereumClient::from_config(&config)?);
//!     let analyzer = TxAnalyzer::new(client, Arc::new(DefaultAddressBook::new()));
//!     let result = analyzer.analyze("0x...".parse()?).await;
//!     println!("{}", serde_json::to_string_pretty(&result)?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod ethereum;
pub mod services;
pub mod types;

pub use config::{Config, NodeEntry};
pub use error::{AggregateError, AppError, Result};
pub use ethereum::constants::*;
pub use ethereum::{
    AbiFetcher, BroadcastOutcome, Broadcaster, Chain, ChainConfig, EthereumClient, GasPriceOracle,
    LocalKeySigner, Node, RpcNode, TxSigner,
};
pub use services::{
    Account, AddressBook, ComposeRequest, DefaultAddressBook, SendResult, TxAnalyzer, TxComposer,
    TxMonitor,
};
pub use types::{AnalysisResult, TxInfo, TxStatus};
