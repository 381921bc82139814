//! Transaction monitoring.
//!
//! Each watched hash gets its own polling task. A poll classifies the hash
//! with [`TxInfoReader::tx_info`]; `error`, `notfound` and `pending` keep the
//! task polling, `done` and `reverted` end it. A hash no node has ever
//! reported, for longer than `lost_after`, ends as `lost`.

use std::{collections::HashMap, sync::Arc, time::Duration};

use alloy::primitives::TxHash;
use async_trait::async_trait;
use tokio::{
    sync::oneshot,
    task::JoinSet,
    time::{interval_at, Instant, MissedTickBehavior},
};

use crate::{
    ethereum::{
        constants::{MONITOR_LOST_AFTER, MONITOR_POLL_INTERVAL},
        EthereumClient,
    },
    types::{TxInfo, TxStatus},
};

/// Source of transaction status snapshots.
#[async_trait]
pub trait TxInfoReader: Send + Sync {
    async fn tx_info(&self, hash: TxHash) -> TxInfo;
}

#[async_trait]
impl TxInfoReader for EthereumClient {
    async fn tx_info(&self, hash: TxHash) -> TxInfo {
        self.tx_info_from_hash(hash).await
    }
}

/// Polling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    pub poll_interval: Duration,
    pub lost_after: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self { poll_interval: MONITOR_POLL_INTERVAL, lost_after: MONITOR_LOST_AFTER }
    }
}

/// Waits for transactions to reach a terminal status.
#[derive(Clone)]
pub struct TxMonitor {
    reader: Arc<dyn TxInfoReader>,
    config: MonitorConfig,
}

impl TxMonitor {
    pub fn new(reader: Arc<dyn TxInfoReader>) -> Self {
        Self { reader, config: MonitorConfig::default() }
    }

    pub fn for_client(client: Arc<EthereumClient>) -> Self {
        Self::new(client)
    }

    pub fn with_config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> MonitorConfig {
        self.config
    }

    /// Start watching `hash`. The receiver yields the terminal status.
    ///
    /// Dropping the receiver abandons the wait; the task still runs to
    /// completion and its result is discarded.
    pub fn watch(&self, hash: TxHash) -> oneshot::Receiver<TxInfo> {
        let (tx, rx) = oneshot::channel();
        let reader = self.reader.clone();
        let config = self.config;

        tokio::spawn(async move {
            let info = poll_until_final(reader, hash, config).await;
            let _ = tx.send(info);
        });

        rx
    }

    /// Block until `hash` reaches a terminal status.
    pub async fn wait(&self, hash: TxHash) -> TxInfo {
        match self.watch(hash).await {
            Ok(info) => info,
            Err(_) => {
                tracing::error!(hash = %hash, "Monitor task ended without a result");
                TxInfo::error("monitor task ended without a result")
            }
        }
    }

    /// Wait for every hash; the result is keyed by the requested hash.
    pub async fn wait_for_many(&self, hashes: &[TxHash]) -> HashMap<TxHash, TxInfo> {
        let mut set = JoinSet::new();
        for &hash in hashes {
            let reader = self.reader.clone();
            let config = self.config;
            set.spawn(async move { (hash, poll_until_final(reader, hash, config).await) });
        }

        let mut results = HashMap::with_capacity(hashes.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((hash, info)) => {
                    results.insert(hash, info);
                }
                Err(e) => tracing::error!(error = %e, "Monitor task failed"),
            }
        }
        results
    }
}

async fn poll_until_final(
    reader: Arc<dyn TxInfoReader>,
    hash: TxHash,
    config: MonitorConfig,
) -> TxInfo {
    let start = Instant::now();
    let mut ticker = interval_at(start + config.poll_interval, config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut seen_on_node = false;

    loop {
        ticker.tick().await;
        let info = reader.tx_info(hash).await;

        match info.status() {
            TxStatus::Error => continue,
            TxStatus::NotFound => {
                if !seen_on_node && start.elapsed() > config.lost_after {
                    tracing::warn!(hash = %hash, "Transaction lost");
                    return TxInfo::lost();
                }
            }
            TxStatus::Pending => seen_on_node = true,
            TxStatus::Done | TxStatus::Reverted | TxStatus::Lost => {
                tracing::info!(hash = %hash, status = %info.status(), "Transaction finalized");
                return info;
            }
        }
    }
}
