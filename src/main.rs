//! ethkit
//!
//! Analyzes one transaction hash against the configured nodes and prints the
//! result as JSON.

use std::sync::Arc;

use alloy::primitives::TxHash;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ethkit::{AppError, Config, DefaultAddressBook, EthereumClient, TxAnalyzer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let hash: TxHash = std::env::args()
        .nth(1)
        .ok_or_else(|| AppError::Validation("usage: ethkit <tx-hash>".into()))?
        .parse()
        .map_err(|e| AppError::Parse(format!("transaction hash: {}", e)))?;

    tracing::info!(chain = %config.chain, nodes = config.rpc_nodes.len(), "Starting ethkit");

    let client = Arc::new(EthereumClient::from_config(&config)?);
    let analyzer = TxAnalyzer::new(client, Arc::new(DefaultAddressBook::new()));

    let result = analyzer.analyze(hash).await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
