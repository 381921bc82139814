//! Transaction composition.
//!
//! Fills in whatever a [`ComposeRequest`] leaves open (nonce, gas price,
//! gas limit, calldata) from the chain and produces an immutable
//! [`UnsignedTransaction`].

use std::sync::Arc;

use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, Bytes, U256},
};

use crate::{
    error::{AppError, Result},
    ethereum::{constants::TRANSFER_GAS_LIMIT, contracts, EthereumClient},
    types::{gwei_to_wei_u128, UnsignedTransaction},
};

/// Calldata of a transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Plain value transfer.
    Empty,
    /// Pre-encoded calldata.
    Raw(Bytes),
    /// `method(args)` encoded against the destination's verified ABI.
    Call { method: String, args: Vec<DynSolValue> },
}

/// What to send. `None` fields are resolved by [`TxComposer::compose`].
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeRequest {
    /// Destination; `None` deploys a contract.
    pub to: Option<Address>,
    pub value: U256,
    pub nonce: Option<u64>,
    pub gas_price_gwei: Option<f64>,
    pub gas_limit: Option<u64>,
    pub payload: Payload,
}

impl ComposeRequest {
    /// Value transfer to `to`.
    pub fn transfer(to: Address, value: U256) -> Self {
        Self {
            to: Some(to),
            value,
            nonce: None,
            gas_price_gwei: None,
            gas_limit: None,
            payload: Payload::Empty,
        }
    }

    /// Contract call encoded from the contract's ABI.
    pub fn call(to: Address, method: impl Into<String>, args: Vec<DynSolValue>) -> Self {
        Self {
            payload: Payload::Call { method: method.into(), args },
            ..Self::transfer(to, U256::ZERO)
        }
    }

    /// Call with pre-encoded calldata.
    pub fn raw(to: Address, data: Bytes) -> Self {
        Self { payload: Payload::Raw(data), ..Self::transfer(to, U256::ZERO) }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn with_gas_price(mut self, gwei: f64) -> Self {
        self.gas_price_gwei = Some(gwei);
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    /// Reject requests that cannot be composed, before any I/O.
    pub fn validate(&self) -> Result<()> {
        if let Some(price) = self.gas_price_gwei {
            if !price.is_finite() || price < 0.0 {
                return Err(AppError::Validation(format!(
                    "gas price must be a non-negative number, got {}",
                    price
                )));
            }
        }
        if matches!(self.payload, Payload::Call { .. }) && self.to.is_none() {
            return Err(AppError::Validation("a contract call needs a destination".into()));
        }
        Ok(())
    }
}

/// Builds unsigned transactions.
#[derive(Clone)]
pub struct TxComposer {
    client: Arc<EthereumClient>,
}

impl TxComposer {
    pub fn new(client: Arc<EthereumClient>) -> Self {
        Self { client }
    }

    /// ABI-encode `method(args)` for `contract` using its verified ABI.
    pub async fn pack_data(
        &self,
        contract: Address,
        method: &str,
        args: &[DynSolValue],
    ) -> Result<Bytes> {
        let abi = self.client.abi(contract).await?;
        contracts::encode_call(&abi, method, args)
    }

    /// Resolve every open field of `request` for a transaction sent by `from`.
    pub async fn compose(&self, from: Address, request: ComposeRequest) -> Result<UnsignedTransaction> {
        request.validate()?;

        let ComposeRequest { to, value, nonce, gas_price_gwei, gas_limit, payload } = request;

        let plain_transfer = matches!(payload, Payload::Empty) && to.is_some();
        let data = match payload {
            Payload::Empty => Bytes::new(),
            Payload::Raw(data) => data,
            Payload::Call { method, args } => {
                let contract =
                    to.ok_or_else(|| AppError::Validation("a contract call needs a destination".into()))?;
                self.pack_data(contract, &method, &args).await?
            }
        };

        let nonce = match nonce {
            Some(nonce) => nonce,
            None => self.client.get_mined_nonce(from).await?,
        };

        let price_gwei = match gas_price_gwei {
            Some(price) => price,
            None => self.client.recommended_gas_price().await?,
        };

        let gas_limit = match gas_limit {
            Some(limit) => limit,
            None if plain_transfer => TRANSFER_GAS_LIMIT,
            None => {
                self.client.estimate_gas(from, to, price_gwei, value, data.clone()).await?
            }
        };

        let tx = UnsignedTransaction {
            nonce,
            to,
            value,
            gas_limit,
            gas_price: gwei_to_wei_u128(price_gwei)?,
            data,
        };

        tracing::debug!(
            from = %from,
            nonce = tx.nonce,
            gas_limit = tx.gas_limit,
            gas_price = tx.gas_price,
            "Transaction composed"
        );

        Ok(tx)
    }
}
