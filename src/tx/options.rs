//! Transaction parameters as sent to the node

use crate::error::{TxError, TxResult};

use ethers::types::{Address, Bytes, U256};
use ethers::utils::serialize;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key under which the gas limit is sent
pub const GAS_KEY: &str = "gas";

/// Transaction parameters (`from`, `to`, `value`, `data`, `gas`, ...).
///
/// Keys and value encodings follow the node's JSON-RPC conventions, so the
/// mapping is passed through as the single parameter of `eth_sendTransaction`
/// and `eth_estimateGas`. The same type doubles as the overrides applied at
/// send time; an empty mapping means "no overrides".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxOptions(Map<String, Value>);

impl TxOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(self, from: Address) -> Self {
        self.set("from", serialize(&from))
    }

    pub fn to(self, to: Address) -> Self {
        self.set("to", serialize(&to))
    }

    pub fn value(self, value: U256) -> Self {
        self.set("value", serialize(&value))
    }

    pub fn data(self, data: impl Into<Bytes>) -> Self {
        self.set("data", serialize(&data.into()))
    }

    pub fn gas(self, gas: U256) -> Self {
        self.set(GAS_KEY, serialize(&gas))
    }

    pub fn gas_price(self, gas_price: U256) -> Self {
        self.set("gasPrice", serialize(&gas_price))
    }

    pub fn nonce(self, nonce: U256) -> Self {
        self.set("nonce", serialize(&nonce))
    }

    /// Set an arbitrary key, replacing any previous value
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Gas limit carried by these options, if any
    pub fn gas_limit(&self) -> TxResult<Option<U256>> {
        self.get(GAS_KEY).map(|v| parse_quantity(GAS_KEY, v)).transpose()
    }

    /// Combine with `overrides`; keys present in both take the override's value
    pub fn merged(&self, overrides: &TxOptions) -> TxOptions {
        let mut merged = self.0.clone();
        for (key, value) in &overrides.0 {
            merged.insert(key.clone(), value.clone());
        }
        TxOptions(merged)
    }
}

/// Parse a numeric quantity given as a hex string, a decimal string or a number
fn parse_quantity(key: &str, value: &Value) -> TxResult<U256> {
    let invalid = |message: String| TxError::InvalidOption {
        key: key.to_string(),
        message,
    };

    match value {
        Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| invalid(format!("{} is not an unsigned integer", n))),
        Value::String(s) => match s.strip_prefix("0x") {
            Some(hex) => U256::from_str_radix(hex, 16).map_err(|e| invalid(e.to_string())),
            None => U256::from_dec_str(s).map_err(|e| invalid(e.to_string())),
        },
        other => Err(invalid(format!("unsupported quantity {}", other))),
    }
}
