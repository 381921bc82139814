//! Business logic services module.
//!
//! Everything here is built on a caller-owned [`EthereumClient`](crate::ethereum::EthereumClient)
//! handle; nothing is global.

pub mod account;
pub mod address_book;
pub mod analyzer;
pub mod composer;
pub mod monitor;

pub use account::{Account, SendResult};
pub use address_book::{AddressBook, DefaultAddressBook, UNKNOWN_NAME};
pub use analyzer::TxAnalyzer;
pub use composer::{ComposeRequest, Payload, TxComposer};
pub use monitor::{MonitorConfig, TxInfoReader, TxMonitor};
