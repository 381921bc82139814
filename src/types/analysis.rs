//! Result of decoding a transaction against its contract ABI.

use alloy::primitives::{Address, TxHash};
use serde::{Deserialize, Serialize};

use super::TxStatus;

/// Whether the destination is a plain account or a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxType {
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "contract call")]
    ContractCall,
}

impl TxType {
    pub fn as_str(self) -> &'static str {
        match self {
            TxType::Normal => "normal",
            TxType::ContractCall => "contract call",
        }
    }
}

/// An address with its human-readable label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInfo {
    pub address: Address,
    pub name: String,
}

/// One decoded parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamResult {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

/// One decoded indexed topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicResult {
    pub name: String,
    pub value: String,
}

/// One decoded event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogResult {
    pub name: String,
    pub topics: Vec<TopicResult>,
    pub data: Vec<ParamResult>,
}

/// A call embedded in a multisig `submitTransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedCall {
    pub contract: AddressInfo,
    pub method: String,
    pub params: Vec<ParamResult>,
}

/// Human-readable analysis of one transaction.
///
/// Decode failures never abort an analysis; they are collected in `error`
/// and whatever was decoded so far is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub hash: TxHash,
    pub status: TxStatus,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub tx_type: Option<TxType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<AddressInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<AddressInfo>,
    /// Value in ETH.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    /// Gas price in Gwei.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<u64>,
    /// The called contract, for contract calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract: Option<AddressInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<LogResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrapped_call: Option<WrappedCall>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl AnalysisResult {
    /// An empty result carrying only hash and status.
    pub fn new(hash: TxHash, status: TxStatus) -> Self {
        Self {
            hash,
            status,
            tx_type: None,
            from: None,
            to: None,
            value: None,
            nonce: None,
            gas_price: None,
            gas_limit: None,
            contract: None,
            method: None,
            params: Vec::new(),
            logs: Vec::new(),
            wrapped_call: None,
            error: String::new(),
        }
    }

    /// Record a non-fatal decode problem.
    pub fn append_error(&mut self, msg: impl AsRef<str>) {
        if !self.error.is_empty() {
            self.error.push_str("; ");
        }
        self.error.push_str(msg.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_error_joins_messages() {
        let mut result = AnalysisResult::new(TxHash::ZERO, TxStatus::Done);
        result.append_error("method not found");
        result.append_error("event not found");
        assert_eq!(result.error, "method not found; event not found");
    }

    #[test]
    fn test_tx_type_serialization() {
        assert_eq!(serde_json::to_string(&TxType::ContractCall).unwrap(), "\"contract call\"");
        assert_eq!(TxType::Normal.as_str(), "normal");
    }

    #[test]
    fn test_empty_fields_are_skipped() {
        let result = AnalysisResult::new(TxHash::ZERO, TxStatus::Pending);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "pending");
        assert!(json.get("params").is_none());
        assert!(json.get("error").is_none());
        assert!(json.get("type").is_none());
    }

    #[test]
    fn test_param_kind_serializes_as_type() {
        let param = ParamResult {
            name: "to".into(),
            kind: "address".into(),
            value: "0x0000000000000000000000000000000000000000 - (unknown)".into(),
        };
        let json = serde_json::to_value(&param).unwrap();
        assert_eq!(json["type"], "address");
    }
}
