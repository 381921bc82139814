//! Transaction signing.
//!
//! [`TxSigner`] is the seam for every key custody model. The library ships
//! [`LocalKeySigner`]; hardware wallets implement the trait externally and
//! build their result with [`SignedTransaction::from_parts`].

use alloy::{
    consensus::SignableTransaction,
    primitives::Address,
    signers::{local::PrivateKeySigner, SignerSync},
};
use async_trait::async_trait;

use crate::{
    error::{AppError, Result},
    types::{SignedTransaction, UnsignedTransaction},
};

/// Something able to sign legacy transactions for one address.
///
/// Implementations may block for a long time (a device waiting for user
/// confirmation); callers do not bound `sign` with a timeout.
#[async_trait]
pub trait TxSigner: Send + Sync {
    fn address(&self) -> Address;

    async fn sign(&self, tx: UnsignedTransaction) -> Result<SignedTransaction>;
}

/// Signer holding a secp256k1 key in memory.
#[derive(Clone)]
pub struct LocalKeySigner {
    key: PrivateKeySigner,
    /// Chain id bound into signatures (EIP-155); `None` signs unprotected.
    replay_protection: Option<u64>,
}

impl LocalKeySigner {
    /// Create a signer from a private key string.
    pub fn from_private_key(private_key: &str, replay_protection: Option<u64>) -> Result<Self> {
        // Remove 0x prefix if present
        let key = private_key.strip_prefix("0x").unwrap_or(private_key);

        let key: PrivateKeySigner = key.parse().map_err(
            |e: alloy::signers::local::LocalSignerError| AppError::Signer(e.to_string()),
        )?;

        tracing::info!(address = %key.address(), chain_id = ?replay_protection, "Local signer initialized");

        Ok(Self { key, replay_protection })
    }

    pub fn from_key(key: PrivateKeySigner, replay_protection: Option<u64>) -> Self {
        Self { key, replay_protection }
    }

    pub fn replay_protection(&self) -> Option<u64> {
        self.replay_protection
    }

    /// Sign without going through the async trait.
    pub fn sign_sync(&self, tx: &UnsignedTransaction) -> Result<SignedTransaction> {
        let legacy = tx.to_legacy(self.replay_protection);
        let signature = self.key.sign_hash_sync(&legacy.signature_hash())?;
        Ok(SignedTransaction::from_signed(legacy.into_signed(signature)))
    }
}

#[async_trait]
impl TxSigner for LocalKeySigner {
    fn address(&self) -> Address {
        self.key.address()
    }

    async fn sign(&self, tx: UnsignedTransaction) -> Result<SignedTransaction> {
        self.sign_sync(&tx)
    }
}

impl std::fmt::Debug for LocalKeySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalKeySigner")
            .field("address", &self.key.address())
            .field("replay_protection", &self.replay_protection)
            .finish()
    }
}
