//! Balance lookup and unit conversion
//!
//! Balances arrive from JSON-RPC endpoints in the chain's smallest unit
//! (wei, lamports). Each lookup is tied to the [`AccountId`] and address it
//! was issued for, so a late response can be matched against the current
//! session state instead of being applied blindly.

pub mod provider;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::account::AccountId;
use crate::crypto::keys::ChainKind;
use crate::error::{Error, Result};

pub use provider::{BalanceProvider, JsonRpcBalanceProvider};

/// Native balance of one address, in base units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    chain: ChainKind,
    base_units: u128,
}

impl Balance {
    /// Create a balance from base units (wei or lamports)
    pub fn new(chain: ChainKind, base_units: u128) -> Self {
        Self { chain, base_units }
    }

    /// Get the chain
    pub fn chain(&self) -> ChainKind {
        self.chain
    }

    /// Amount in the smallest unit
    pub fn base_units(&self) -> u128 {
        self.base_units
    }

    /// Exact decimal amount in whole coins, without trailing zeros
    pub fn whole_units(&self) -> String {
        let scale = 10u128.pow(self.chain.decimals());
        let whole = self.base_units / scale;
        let fraction = self.base_units % scale;

        if fraction == 0 {
            return whole.to_string();
        }

        let digits = format!("{:0width$}", fraction, width = self.chain.decimals() as usize);
        format!("{}.{}", whole, digits.trim_end_matches('0'))
    }

    /// Decode the `result` member of a balance JSON-RPC response.
    ///
    /// Ethereum returns a `0x` hex quantity; Solana returns
    /// `{"context": {...}, "value": <lamports>}`.
    pub fn from_rpc_result(chain: ChainKind, result: &Value) -> Result<Self> {
        let base_units = match chain {
            ChainKind::Ethereum => {
                let quantity = result.as_str().ok_or_else(|| {
                    Error::Provider(format!("Expected hex quantity, got {}", result))
                })?;
                parse_hex_quantity(quantity)?
            }
            ChainKind::Solana => {
                let lamports = result
                    .get("value")
                    .and_then(Value::as_u64)
                    .ok_or_else(|| {
                        Error::Provider(format!("Expected lamport value, got {}", result))
                    })?;
                u128::from(lamports)
            }
        };

        Ok(Self::new(chain, base_units))
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.whole_units(), self.chain.symbol())
    }
}

/// Parse a JSON-RPC hex quantity such as `0x3782dace9d900000`
pub fn parse_hex_quantity(quantity: &str) -> Result<u128> {
    let digits = quantity
        .strip_prefix("0x")
        .or_else(|| quantity.strip_prefix("0X"))
        .ok_or_else(|| Error::Provider(format!("Quantity is missing 0x prefix: {}", quantity)))?;

    if digits.is_empty() {
        return Err(Error::Provider(format!("Empty quantity: {}", quantity)));
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::Provider(format!("Invalid quantity: {}", quantity)));
    }

    u128::from_str_radix(digits, 16)
        .map_err(|e| Error::Provider(format!("Invalid quantity {}: {}", quantity, e)))
}

/// JSON-RPC request body for a balance lookup
pub fn balance_request_body(chain: ChainKind, address: &str) -> Value {
    match chain {
        ChainKind::Ethereum => json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_getBalance",
            "params": [address, "latest"],
        }),
        ChainKind::Solana => json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getBalance",
            "params": [address],
        }),
    }
}

/// A pending lookup: which account it is for and the address it asked about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceRequest {
    /// Account the lookup belongs to
    pub account: AccountId,
    /// Address the lookup was issued for
    pub address: String,
}

/// What happened when a lookup result was applied to a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceUpdate {
    /// A new balance was recorded
    Updated,
    /// The lookup failed; the last known balance is unchanged
    Failed,
    /// The account no longer matches the request and the result was dropped
    Stale,
}

/// Last known balance of an account and the most recent lookup error
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceStatus {
    last_known: Option<Balance>,
    last_error: Option<String>,
}

impl BalanceStatus {
    /// Most recent successful lookup, if any
    pub fn last_known(&self) -> Option<&Balance> {
        self.last_known.as_ref()
    }

    /// Error from the most recent lookup, cleared by the next success
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether no lookup has succeeded yet
    pub fn is_unchecked(&self) -> bool {
        self.last_known.is_none()
    }

    /// Text for a balance cell: the known balance, or a prompt to check.
    /// A failed lookup never turns into "0".
    pub fn label(&self) -> String {
        match &self.last_known {
            Some(balance) => balance.to_string(),
            None => "Check Balance".to_string(),
        }
    }

    pub(crate) fn record(&mut self, outcome: &Result<Balance>) -> BalanceUpdate {
        match outcome {
            Ok(balance) => {
                self.last_known = Some(*balance);
                self.last_error = None;
                BalanceUpdate::Updated
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                BalanceUpdate::Failed
            }
        }
    }
}
