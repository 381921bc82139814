//! Fan-out transaction submission.
//!
//! A signed transaction is sent to every broadcast node at once and the call
//! returns only after each node has answered or timed out.

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use alloy::primitives::{hex, keccak256, Bytes, TxHash};
use serde::Serialize;
use tokio::{task::JoinSet, time::timeout};

use super::{
    constants::NODE_CALL_TIMEOUT,
    node::{Node, RpcNode},
};
use crate::{
    config::Config,
    error::{AppError, Result},
    types::SignedTransaction,
};

/// What happened when a transaction was sent to every node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BroadcastOutcome {
    /// keccak256 of the submitted bytes, whatever the nodes answered.
    pub hash: TxHash,
    /// At least one node accepted the transaction.
    pub broadcasted: bool,
    /// Rejections keyed by node name.
    pub errors: BTreeMap<String, String>,
}

/// Sends raw transactions to a fixed set of nodes.
#[derive(Clone)]
pub struct Broadcaster {
    nodes: Vec<Arc<dyn Node>>,
    call_timeout: Duration,
}

impl Broadcaster {
    pub fn new(nodes: Vec<Arc<dyn Node>>) -> Self {
        Self { nodes, call_timeout: NODE_CALL_TIMEOUT }
    }

    /// Broadcaster over the configured broadcast nodes.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(RpcNode::connect_all(&config.broadcast_nodes)?))
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn node_names(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.name().to_string()).collect()
    }

    pub async fn broadcast(&self, tx: &SignedTransaction) -> BroadcastOutcome {
        self.broadcast_raw(tx.encoded()).await
    }

    /// Broadcast a `0x`-prefixed hex encoded signed transaction.
    ///
    /// Malformed hex is rejected before any node is contacted.
    pub async fn broadcast_hex(&self, data: &str) -> Result<BroadcastOutcome> {
        let raw = hex::decode(data.trim())
            .map_err(|e| AppError::Encode(format!("invalid raw transaction hex: {}", e)))?;
        if raw.is_empty() {
            return Err(AppError::Encode("empty raw transaction".into()));
        }
        Ok(self.broadcast_raw(raw.into()).await)
    }

    pub async fn broadcast_raw(&self, raw: Bytes) -> BroadcastOutcome {
        let hash = keccak256(&raw);
        let mut set = JoinSet::new();

        for node in &self.nodes {
            let node = node.clone();
            let raw = raw.clone();
            let limit = self.call_timeout;

            set.spawn(async move {
                let name = node.name().to_string();
                let result = match timeout(limit, node.send_raw(raw)).await {
                    Ok(result) => result.map(|_| ()),
                    Err(_) => Err(AppError::provider(&name, format!("timed out after {:?}", limit))),
                };
                (name, result)
            });
        }

        let mut errors = BTreeMap::new();
        let mut accepted = 0usize;

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((_, Ok(()))) => accepted += 1,
                Ok((name, Err(e))) => {
                    tracing::warn!(node = %name, tx = %hash, error = %e, "Broadcast rejected");
                    errors.insert(name, e.into_node_message());
                }
                Err(e) => tracing::error!(tx = %hash, error = %e, "Broadcast task failed"),
            }
        }

        let broadcasted = !self.nodes.is_empty() && accepted >= 1;
        tracing::info!(tx = %hash, accepted, rejected = errors.len(), broadcasted, "Broadcast finished");

        BroadcastOutcome { hash, broadcasted, errors }
    }
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("nodes", &self.node_names())
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_nodes_is_not_broadcasted() {
        let outcome = Broadcaster::new(vec![]).broadcast_raw(Bytes::from(vec![0xc0])).await;
        assert!(!outcome.broadcasted);
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.hash, keccak256([0xc0]));
    }

    #[tokio::test]
    async fn test_invalid_hex_rejected_before_io() {
        let err = Broadcaster::new(vec![]).broadcast_hex("0xnot-hex").await.unwrap_err();
        assert!(matches!(err, AppError::Encode(_)));

        let err = Broadcaster::new(vec![]).broadcast_hex("0x").await.unwrap_err();
        assert!(matches!(err, AppError::Encode(_)));
    }

    #[tokio::test]
    async fn test_hex_hash_matches_raw_bytes() {
        let outcome = Broadcaster::new(vec![]).broadcast_hex("0xf86c0a").await.unwrap();
        assert_eq!(outcome.hash, keccak256([0xf8, 0x6c, 0x0a]));
    }
}
