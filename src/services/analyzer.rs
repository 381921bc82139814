//! Transaction analysis.
//!
//! Turns a mined transaction into an [`AnalysisResult`]: basic fields, the
//! called method and its parameters, every receipt log, and the call wrapped
//! by a multisig `submitTransaction`. Decode failures are appended to the
//! result's error text; whatever was decoded before them is kept.

use std::sync::Arc;

use alloy::{
    dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier},
    hex,
    json_abi::{EventParam, Function, JsonAbi, Param},
    primitives::{Address, TxHash, B256, U256},
};

use super::address_book::AddressBook;
use crate::{
    error::{AppError, Result},
    ethereum::{
        constants::{GWEI_DECIMALS, NATIVE_DECIMALS},
        contracts, EthereumClient,
    },
    types::{
        format_units, AddressInfo, AnalysisResult, ChainTransaction, LogEntry, LogResult,
        ParamResult, TopicResult, TxInfo, TxStatus, TxType, WrappedCall,
    },
};

/// Method name of the multisig submit pattern.
const SUBMIT_TRANSACTION: &str = "submitTransaction";

/// Parameter names of the multisig submit pattern, in order.
const SUBMIT_TRANSACTION_PARAMS: [&str; 3] = ["destination", "value", "data"];

/// Decodes transactions into human-readable form.
#[derive(Clone)]
pub struct TxAnalyzer {
    client: Arc<EthereumClient>,
    address_book: Arc<dyn AddressBook>,
}

impl TxAnalyzer {
    pub fn new(client: Arc<EthereumClient>, address_book: Arc<dyn AddressBook>) -> Self {
        Self { client, address_book }
    }

    /// Read `hash` from the nodes and analyze it.
    ///
    /// Only `done` and `reverted` transactions are decoded; any other status
    /// yields a result carrying just the hash and status.
    pub async fn analyze(&self, hash: TxHash) -> AnalysisResult {
        let info = self.client.tx_info_from_hash(hash).await;
        let destination = info.transaction().and_then(|tx| tx.to);

        let mut result = match (info.status(), destination) {
            (TxStatus::Done | TxStatus::Reverted, Some(to)) => self.analyze_destination(&info, to).await,
            _ => self.analyze_offline(&info, None, false).await,
        };
        result.hash = hash;
        if let Some(message) = info.error_message() {
            result.append_error(format!("cannot get transaction {}: {}", hash, message));
        }
        result
    }

    async fn analyze_destination(&self, info: &TxInfo, to: Address) -> AnalysisResult {
        let is_contract = match self.client.is_contract(to).await {
            Ok(is_contract) => is_contract,
            Err(e) => {
                tracing::warn!(address = %to, error = %e, "Destination code lookup failed");
                let mut result = self.analyze_offline(info, None, false).await;
                result.tx_type = None;
                result.append_error(format!("cannot check the type of {}: {}", to, e));
                return result;
            }
        };

        if !is_contract {
            return self.analyze_offline(info, None, false).await;
        }

        match self.client.abi(to).await {
            Ok(abi) => self.analyze_offline(info, Some(&abi), true).await,
            Err(e) => {
                tracing::warn!(address = %to, error = %e, "ABI fetch failed");
                let mut result = self.analyze_offline(info, None, true).await;
                result.append_error(format!("cannot get ABI of {}: {}", to, e));
                result
            }
        }
    }

    /// Analyze an already-read transaction against `abi`.
    ///
    /// For a contract call without an ABI only the basic fields are filled.
    /// The ABI of a wrapped call's destination is still fetched from the
    /// client's explorer.
    pub async fn analyze_offline(
        &self,
        info: &TxInfo,
        abi: Option<&JsonAbi>,
        is_contract: bool,
    ) -> AnalysisResult {
        let hash = info.transaction().map(|tx| tx.hash).unwrap_or_default();
        let mut result = AnalysisResult::new(hash, info.status());

        if !matches!(info.status(), TxStatus::Done | TxStatus::Reverted) {
            return result;
        }
        let Some(tx) = info.transaction() else {
            return result;
        };

        self.fill_basic(&mut result, tx);

        let Some(to) = tx.to else {
            result.tx_type = Some(TxType::Normal);
            result.append_error("contract creation, nothing to decode");
            return result;
        };

        if !is_contract {
            result.tx_type = Some(TxType::Normal);
            return result;
        }

        result.tx_type = Some(TxType::ContractCall);
        result.contract = Some(self.address_info(to));

        let Some(abi) = abi else {
            return result;
        };

        let call = self.decode_call(&mut result, abi, &tx.input);

        if let Some(receipt) = info.receipt() {
            for log in &receipt.logs {
                self.decode_log(&mut result, abi, log);
            }
        }

        if let Some((destination, data)) = call.and_then(|(f, values)| wrapped_target(f, &values)) {
            self.decode_wrapped(&mut result, destination, &data).await;
        }

        result
    }

    fn fill_basic(&self, result: &mut AnalysisResult, tx: &ChainTransaction) {
        result.from = Some(self.address_info(tx.from));
        result.to = tx.to.map(|to| self.address_info(to));
        result.value = Some(format_units(tx.value, NATIVE_DECIMALS));
        result.nonce = Some(tx.nonce);
        result.gas_price = Some(format_units(U256::from(tx.gas_price), GWEI_DECIMALS));
        result.gas_limit = Some(tx.gas_limit);
    }

    fn address_info(&self, address: Address) -> AddressInfo {
        AddressInfo { address, name: self.address_book.get_name(&address) }
    }

    /// Decode the top-level call; returns the method and raw values for the
    /// wrapped-call check.
    fn decode_call<'a>(
        &self,
        result: &mut AnalysisResult,
        abi: &'a JsonAbi,
        input: &[u8],
    ) -> Option<(&'a Function, Vec<DynSolValue>)> {
        let function = match contracts::find_by_selector(abi, input) {
            Ok(function) => function,
            Err(e) => {
                result.append_error(e.to_string());
                return None;
            }
        };
        result.method = Some(function.name.clone());

        match function.abi_decode_input(&input[4..]) {
            Ok(values) => {
                result.params = self.render_params(&function.inputs, &values);
                Some((function, values))
            }
            Err(e) => {
                result.append_error(format!("cannot unpack params of {}: {}", function.name, e));
                None
            }
        }
    }

    async fn decode_wrapped(&self, result: &mut AnalysisResult, destination: Address, data: &[u8]) {
        if data.is_empty() {
            return;
        }

        let abi = match self.client.abi(destination).await {
            Ok(abi) => abi,
            Err(e) => {
                result.append_error(format!("cannot get ABI of wrapped contract {}: {}", destination, e));
                return;
            }
        };

        let function = match contracts::find_by_selector(&abi, data) {
            Ok(function) => function,
            Err(e) => {
                result.append_error(format!("wrapped call: {}", e));
                return;
            }
        };

        match function.abi_decode_input(&data[4..]) {
            Ok(values) => {
                result.wrapped_call = Some(WrappedCall {
                    contract: self.address_info(destination),
                    method: function.name.clone(),
                    params: self.render_params(&function.inputs, &values),
                });
            }
            Err(e) => result.append_error(format!(
                "cannot unpack params of wrapped {}: {}",
                function.name, e
            )),
        }
    }

    fn decode_log(&self, result: &mut AnalysisResult, abi: &JsonAbi, log: &LogEntry) {
        let Some(topic0) = log.topics.first() else {
            result.append_error(format!("log of {} has no topics", log.address));
            return;
        };
        let Some(event) = abi.events().find(|e| !e.anonymous && e.selector() == *topic0) else {
            result.append_error(format!("Cannot find event of topic {}", hex::encode_prefixed(topic0)));
            return;
        };

        let mut indexed = log.topics.iter().skip(1);
        let mut topics = Vec::new();
        let mut body: Vec<(String, &EventParam)> = Vec::new();

        for (i, input) in event.inputs.iter().enumerate() {
            let name = param_name(&input.name, i);
            if !input.indexed {
                body.push((name, input));
                continue;
            }
            match indexed.next() {
                Some(topic) => topics.push(TopicResult { name, value: self.render_topic(input, topic) }),
                None => result.append_error(format!("{}: missing topic for {}", event.name, name)),
            }
        }

        let data = match self.decode_log_data(&body, &log.data) {
            Ok(data) => data,
            Err(e) => {
                result.append_error(format!("{}: {}", event.name, e));
                Vec::new()
            }
        };

        result.logs.push(LogResult { name: event.name.clone(), topics, data });
    }

    fn decode_log_data(&self, body: &[(String, &EventParam)], data: &[u8]) -> Result<Vec<ParamResult>> {
        if body.is_empty() {
            return Ok(Vec::new());
        }

        let types = body
            .iter()
            .map(|(_, param)| param.resolve())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::Decode(format!("bad event parameter type: {}", e)))?;

        let values = match DynSolType::Tuple(types)
            .abi_decode_params(data)
            .map_err(|e| AppError::Decode(format!("cannot unpack log data: {}", e)))?
        {
            DynSolValue::Tuple(values) => values,
            other => vec![other],
        };

        Ok(body
            .iter()
            .zip(values.iter())
            .map(|((name, param), value)| ParamResult {
                name: name.clone(),
                kind: param.selector_type().into_owned(),
                value: self.render_value(value),
            })
            .collect())
    }

    /// Indexed values of a one-word type are stored in the topic itself;
    /// everything else is stored as its hash.
    fn render_topic(&self, input: &EventParam, topic: &B256) -> String {
        match input.resolve() {
            Ok(ty) if is_word(&ty) => match ty.abi_decode(topic.as_slice()) {
                Ok(value) => self.render_value(&value),
                Err(_) => hex::encode_prefixed(topic),
            },
            _ => hex::encode_prefixed(topic),
        }
    }

    fn render_params(&self, inputs: &[Param], values: &[DynSolValue]) -> Vec<ParamResult> {
        inputs
            .iter()
            .zip(values.iter())
            .enumerate()
            .map(|(i, (param, value))| ParamResult {
                name: param_name(&param.name, i),
                kind: param.selector_type().into_owned(),
                value: self.render_value(value),
            })
            .collect()
    }

    /// Human-readable rendering of one decoded value.
    pub fn render_value(&self, value: &DynSolValue) -> String {
        match value {
            DynSolValue::Bool(b) => b.to_string(),
            DynSolValue::Int(i, _) => format!("{} (0x{:x})", i, i.into_raw()),
            DynSolValue::Uint(u, _) => format!("{} (0x{:x})", u, u),
            DynSolValue::Address(address) => format!(
                "{} - ({})",
                address.to_checksum(None),
                self.address_book.get_name(address)
            ),
            DynSolValue::FixedBytes(word, size) => hex::encode_prefixed(&word[..(*size).min(32)]),
            DynSolValue::Function(function) => hex::encode_prefixed(function.as_slice()),
            DynSolValue::Bytes(bytes) => hex::encode_prefixed(bytes),
            DynSolValue::String(s) => s.clone(),
            DynSolValue::Array(items) => format!("[{}] (slice)", self.render_list(items)),
            DynSolValue::FixedArray(items) => format!("[{}] (array)", self.render_list(items)),
            DynSolValue::Tuple(items) => format!("({})", self.render_list(items)),
            #[allow(unreachable_patterns)]
            other => format!("{:?}", other),
        }
    }

    fn render_list(&self, items: &[DynSolValue]) -> String {
        items.iter().map(|item| self.render_value(item)).collect::<Vec<_>>().join(", ")
    }
}

impl std::fmt::Debug for TxAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxAnalyzer").field("client", &self.client).finish_non_exhaustive()
    }
}

/// Destination and calldata of a multisig `submitTransaction`.
///
/// Matches on the method and parameter names only.
fn wrapped_target(function: &Function, values: &[DynSolValue]) -> Option<(Address, Vec<u8>)> {
    if function.name != SUBMIT_TRANSACTION {
        return None;
    }
    let names = function.inputs.iter().map(|p| p.name.as_str());
    if !names.eq(SUBMIT_TRANSACTION_PARAMS) {
        return None;
    }
    match (values.first(), values.get(2)) {
        (Some(DynSolValue::Address(destination)), Some(DynSolValue::Bytes(data))) => {
            Some((*destination, data.clone()))
        }
        _ => None,
    }
}

fn param_name(name: &str, index: usize) -> String {
    if name.trim().is_empty() {
        format!("arg{}", index)
    } else {
        name.to_string()
    }
}

fn is_word(ty: &DynSolType) -> bool {
    matches!(
        ty,
        DynSolType::Address
            | DynSolType::Bool
            | DynSolType::Int(_)
            | DynSolType::Uint(_)
            | DynSolType::FixedBytes(_)
            | DynSolType::Function
    )
}
