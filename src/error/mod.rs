//! Error types and handling module.
//!
//! Defines all library error types and conversions.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Failures collected from every node during one redundant call.
///
/// Keys are node names, values the error each node reported. An empty map
/// means no node was configured at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateError {
    /// Per-node failure messages.
    pub errors: BTreeMap<String, String>,
}

impl AggregateError {
    /// Create an aggregate from per-node failures.
    pub fn new(errors: BTreeMap<String, String>) -> Self {
        Self { errors }
    }

    /// Number of nodes that failed.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// True when no node contributed an error (no nodes configured).
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return write!(f, "no nodes configured");
        }
        write!(f, "all {} nodes failed: ", self.errors.len())?;
        let mut first = true;
        for (name, err) in &self.errors {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "[{}] {}", name, err)?;
            first = false;
        }
        Ok(())
    }
}

/// Library-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A single node failed a call.
    #[error("Node {name} error: {message}")]
    Provider { name: String, message: String },

    /// Every node failed the same logical call.
    #[error("Redundant call {operation} failed, {errors}")]
    Aggregate { operation: &'static str, errors: AggregateError },

    /// Payload or wire encoding failed.
    #[error("Encode error: {0}")]
    Encode(String),

    /// Selector or parameter unpacking failed.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Signing failed (device unreachable, user rejected, bad signature).
    #[error("Signer error: {0}")]
    Signer(String),

    /// Invalid input rejected before any I/O.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transport errors.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Block explorer (ABI fetch) failure.
    #[error("Explorer error: {0}")]
    Explorer(String),

    /// Gas price feed failure.
    #[error("Gas price oracle error: {0}")]
    GasOracle(String),

    /// Numeric overflow during conversion.
    #[error("Numeric overflow: {0}")]
    NumericOverflow(String),
}

impl AppError {
    /// Wrap a failure with the name of the node that produced it.
    pub fn provider(name: impl Into<String>, err: impl fmt::Display) -> Self {
        AppError::Provider { name: name.into(), message: err.to_string() }
    }

    /// Message recorded for a node in an aggregate: the bare node message
    /// for provider errors, the full display otherwise.
    pub fn into_node_message(self) -> String {
        match self {
            AppError::Provider { message, .. } => message,
            other => other.to_string(),
        }
    }

    /// The aggregate carried by this error, if it is one.
    pub fn aggregate(&self) -> Option<&AggregateError> {
        match self {
            AppError::Aggregate { errors, .. } => Some(errors),
            _ => None,
        }
    }
}

impl From<alloy::transports::TransportError> for AppError {
    fn from(err: alloy::transports::TransportError) -> Self {
        AppError::Transport(err.to_string())
    }
}

impl From<alloy::signers::Error> for AppError {
    fn from(err: alloy::signers::Error) -> Self {
        AppError::Signer(err.to_string())
    }
}

impl From<alloy::signers::local::LocalSignerError> for AppError {
    fn from(err: alloy::signers::local::LocalSignerError) -> Self {
        AppError::Signer(err.to_string())
    }
}

impl From<alloy::hex::FromHexError> for AppError {
    fn from(err: alloy::hex::FromHexError) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(err: std::num::ParseIntError) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Transport(err.to_string())
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;
