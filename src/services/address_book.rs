//! Human-readable names for addresses shown in analysis output.

use std::collections::HashMap;

use alloy::primitives::Address;

use crate::error::{AppError, Result};

/// Name reported for addresses nobody registered.
pub const UNKNOWN_NAME: &str = "unknown";

/// Resolves an address to a display name.
pub trait AddressBook: Send + Sync {
    /// Display name of `address`, [`UNKNOWN_NAME`] when it has none.
    fn get_name(&self, address: &Address) -> String;
}

/// In-memory address book.
#[derive(Debug, Clone, Default)]
pub struct DefaultAddressBook {
    names: HashMap<Address, String>,
}

impl DefaultAddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load names from a JSON object mapping addresses to names.
    ///
    /// ```json
    /// { "0xdAC17F958D2ee523a2206206994597C13D831ec7": "USDT" }
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: HashMap<String, String> = serde_json::from_str(json)
            .map_err(|e| AppError::Parse(format!("address book: {}", e)))?;

        let mut book = Self::new();
        for (address, name) in raw {
            let address: Address = address
                .parse()
                .map_err(|e| AppError::Parse(format!("address book entry {}: {}", address, e)))?;
            book.register(address, name);
        }
        Ok(book)
    }

    pub fn with(mut self, address: Address, name: impl Into<String>) -> Self {
        self.register(address, name);
        self
    }

    /// Register or rename `address`.
    pub fn register(&mut self, address: Address, name: impl Into<String>) {
        self.names.insert(address, name.into());
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl AddressBook for DefaultAddressBook {
    fn get_name(&self, address: &Address) -> String {
        self.names.get(address).cloned().unwrap_or_else(|| UNKNOWN_NAME.to_string())
    }
}
