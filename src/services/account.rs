//! Account operations: sending value, tokens, and contract calls.

use std::sync::Arc;

use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, Bytes, U256},
};
use serde::Serialize;

use super::composer::{ComposeRequest, TxComposer};
use crate::{
    error::{AppError, Result},
    ethereum::{
        constants::TRANSFER_GAS_LIMIT, contracts::erc20, BroadcastOutcome, Broadcaster,
        EthereumClient, TxSigner,
    },
    types::{eth_to_wei, float_to_fixed_point, gwei_to_wei, SignedTransaction, UnsignedTransaction},
};

/// A signed transaction and what the broadcast nodes made of it.
#[derive(Debug, Clone)]
pub struct SendResult {
    pub transaction: SignedTransaction,
    pub outcome: BroadcastOutcome,
}

#[derive(Serialize)]
struct SendSummary<'a> {
    hash: String,
    broadcasted: bool,
    errors: &'a std::collections::BTreeMap<String, String>,
}

impl SendResult {
    /// Short JSON summary for logs and CLIs.
    pub fn summary(&self) -> serde_json::Value {
        serde_json::to_value(SendSummary {
            hash: self.outcome.hash.to_string(),
            broadcasted: self.outcome.broadcasted,
            errors: &self.outcome.errors,
        })
        .unwrap_or(serde_json::Value::Null)
    }
}

/// One sending address with the handles it needs.
#[derive(Clone)]
pub struct Account {
    signer: Arc<dyn TxSigner>,
    client: Arc<EthereumClient>,
    broadcaster: Arc<Broadcaster>,
    composer: TxComposer,
}

impl Account {
    pub fn new(
        signer: Arc<dyn TxSigner>,
        client: Arc<EthereumClient>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        let composer = TxComposer::new(client.clone());
        Self { signer, client, broadcaster, composer }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn composer(&self) -> &TxComposer {
        &self.composer
    }

    pub async fn mined_nonce(&self) -> Result<u64> {
        self.client.get_mined_nonce(self.address()).await
    }

    pub async fn pending_nonce(&self) -> Result<u64> {
        self.client.get_pending_nonce(self.address()).await
    }

    /// Nonces of transactions sent but not yet mined.
    pub async fn pending_nonces(&self) -> Result<Vec<u64>> {
        let mined = self.mined_nonce().await?;
        let pending = self.pending_nonce().await?;
        Ok((mined..pending).collect())
    }

    async fn sign_and_broadcast(&self, tx: UnsignedTransaction) -> Result<SendResult> {
        let transaction = self.signer.sign(tx).await?;
        let outcome = self.broadcaster.broadcast(&transaction).await;
        Ok(SendResult { transaction, outcome })
    }

    // ========================================================================
    // Native transfers
    // ========================================================================

    /// Send `amount_eth` at the mined nonce and recommended price.
    pub async fn send_eth(&self, amount_eth: f64, to: Address) -> Result<SendResult> {
        let amount = eth_to_wei(amount_eth)?;
        let nonce = self.mined_nonce().await?;
        let price = self.client.recommended_gas_price().await?;
        self.send_eth_with_nonce_and_price(nonce, price, amount, to).await
    }

    /// Send exactly `amount` wei with an explicit nonce and price.
    pub async fn send_eth_with_nonce_and_price(
        &self,
        nonce: u64,
        price_gwei: f64,
        amount: U256,
        to: Address,
    ) -> Result<SendResult> {
        let request = ComposeRequest::transfer(to, amount)
            .with_nonce(nonce)
            .with_gas_price(price_gwei)
            .with_gas_limit(TRANSFER_GAS_LIMIT);
        let tx = self.composer.compose(self.address(), request).await?;

        tracing::info!(to = %to, amount = %amount, nonce, "Sending ETH");
        self.sign_and_broadcast(tx).await
    }

    /// Send the whole balance minus the transfer fee.
    pub async fn send_all_eth(&self, to: Address) -> Result<SendResult> {
        let price = self.client.recommended_gas_price().await?;
        self.send_all_eth_with_price(price, to).await
    }

    pub async fn send_all_eth_with_price(&self, price_gwei: f64, to: Address) -> Result<SendResult> {
        let nonce = self.mined_nonce().await?;
        let balance = self.client.get_balance(self.address()).await?;
        let fee = U256::from(TRANSFER_GAS_LIMIT) * gwei_to_wei(price_gwei)?;

        let amount = balance.checked_sub(fee).filter(|a| !a.is_zero()).ok_or_else(|| {
            AppError::Validation(format!(
                "not enough to do a tx with gas price: {} gwei",
                price_gwei
            ))
        })?;

        self.send_eth_with_nonce_and_price(nonce, price_gwei, amount, to).await
    }

    /// One transfer per address at consecutive nonces.
    ///
    /// Each transfer has its own result; a failed one does not stop the rest.
    pub async fn send_eth_to_many(
        &self,
        amounts: &[f64],
        addresses: &[Address],
    ) -> Result<Vec<Result<SendResult>>> {
        check_lengths(amounts, addresses)?;
        let price = self.client.recommended_gas_price().await?;
        self.send_eth_to_many_with_price(price, amounts, addresses).await
    }

    pub async fn send_eth_to_many_with_price(
        &self,
        price_gwei: f64,
        amounts: &[f64],
        addresses: &[Address],
    ) -> Result<Vec<Result<SendResult>>> {
        check_lengths(amounts, addresses)?;
        let wei = amounts.iter().map(|a| eth_to_wei(*a)).collect::<Result<Vec<_>>>()?;
        let nonce = self.mined_nonce().await?;

        let mut results = Vec::with_capacity(addresses.len());
        for (i, (amount, to)) in wei.into_iter().zip(addresses).enumerate() {
            let result =
                self.send_eth_with_nonce_and_price(nonce + i as u64, price_gwei, amount, *to).await;
            if let Err(e) = &result {
                tracing::warn!(to = %to, error = %e, "Transfer failed");
            }
            results.push(result);
        }
        Ok(results)
    }

    // ========================================================================
    // Tokens and contracts
    // ========================================================================

    /// Transfer `amount` tokens, scaled by the token's on-chain decimals.
    pub async fn send_erc20(&self, token: Address, amount: f64, to: Address) -> Result<SendResult> {
        let decimals = self.client.erc20_decimals(token, None).await?;
        let amount = float_to_fixed_point(amount, decimals)?;

        let nonce = self.mined_nonce().await?;
        let price = self.client.recommended_gas_price().await?;
        let request = ComposeRequest::raw(token, erc20::transfer_calldata(to, amount))
            .with_nonce(nonce)
            .with_gas_price(price);
        let tx = self.composer.compose(self.address(), request).await?;

        tracing::info!(token = %token, to = %to, amount = %amount, "Sending ERC20");
        self.sign_and_broadcast(tx).await
    }

    /// ABI-encode `method(args)` for `contract`.
    pub async fn pack_data(
        &self,
        contract: Address,
        method: &str,
        args: &[DynSolValue],
    ) -> Result<Bytes> {
        self.composer.pack_data(contract, method, args).await
    }

    pub async fn call_contract(
        &self,
        value_eth: f64,
        contract: Address,
        method: &str,
        args: Vec<DynSolValue>,
    ) -> Result<SendResult> {
        let price = self.client.recommended_gas_price().await?;
        self.call_contract_with_price(price, value_eth, contract, method, args).await
    }

    pub async fn call_contract_with_price(
        &self,
        price_gwei: f64,
        value_eth: f64,
        contract: Address,
        method: &str,
        args: Vec<DynSolValue>,
    ) -> Result<SendResult> {
        let nonce = self.mined_nonce().await?;
        self.call_contract_with_nonce_and_price(nonce, price_gwei, value_eth, contract, method, args)
            .await
    }

    pub async fn call_contract_with_nonce_and_price(
        &self,
        nonce: u64,
        price_gwei: f64,
        value_eth: f64,
        contract: Address,
        method: &str,
        args: Vec<DynSolValue>,
    ) -> Result<SendResult> {
        let value = eth_to_wei(value_eth)?;
        let request = ComposeRequest::call(contract, method, args)
            .with_value(value)
            .with_nonce(nonce)
            .with_gas_price(price_gwei);
        let tx = self.composer.compose(self.address(), request).await?;

        tracing::info!(contract = %contract, method, nonce, "Calling contract");
        self.sign_and_broadcast(tx).await
    }
}

fn check_lengths(amounts: &[f64], addresses: &[Address]) -> Result<()> {
    if amounts.len() != addresses.len() {
        return Err(AppError::Validation(format!(
            "amounts and addresses must have the same length ({} vs {})",
            amounts.len(),
            addresses.len()
        )));
    }
    Ok(())
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account").field("address", &self.address()).finish()
    }
}
