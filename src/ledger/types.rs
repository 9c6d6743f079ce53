//! Ledger Wire Types
//!
//! Types exchanged with the remote ledger service. The ledger's detail
//! documents are not contractually stable, so anything schema-dependent
//! stays as `serde_json::Value` until the resolver extracts what it needs.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ledger-assigned opaque account identifier.
///
/// The primary key for all mutation and queuing purposes. Accounts are
/// discovered via lookup, never created or destroyed by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A ledger account discovered through identity lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Ledger-assigned account id (the `uuid` field on the wire).
    pub account_id: AccountId,
    /// Display name, when the ledger reports one.
    pub username: Option<String>,
}

/// A signed-amount adjustment submitted to the ledger.
///
/// Positive amount = credit, negative = debit. Submissions are distinct
/// ledger-side events; idempotency is not guaranteed.
#[derive(Debug, Clone)]
pub struct MutationRequest {
    pub account_id: AccountId,
    pub amount: i64,
    pub description: String,
}

/// Receipt for an accepted mutation.
///
/// A simulated receipt is indistinguishable from a live one except for the
/// `simulated` flag, so coordination logic exercises identically in both
/// modes.
#[derive(Debug, Clone, Serialize)]
pub struct MutationReceipt {
    pub account_id: AccountId,
    pub amount: i64,
    pub description: String,
    pub simulated: bool,
    /// Millisecond timestamp recorded when the receipt was produced.
    pub created_at: i64,
}

/// One entry of an account's transaction history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationEvent {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(rename = "transaction_value", default)]
    pub amount: i64,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Coerce a JSON value into a canonical integer balance.
///
/// Accepts integers and floats with a zero fractional part; everything else
/// (strings, bools, containers) is not a balance.
pub fn integer_from(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    if let Some(f) = value.as_f64()
        && f.fract() == 0.0
        && f >= i64::MIN as f64
        && f <= i64::MAX as f64
    {
        return Some(f as i64);
    }
    None
}

/// Parse an `Account` out of a lookup response document.
///
/// The lookup endpoint answers with an empty body on a miss, so a document
/// without a `uuid` string is a miss, not an error.
pub fn account_from_value(value: &Value) -> Option<Account> {
    let uuid = value.get("uuid")?.as_str()?;
    let username = value
        .get("username")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    Some(Account {
        account_id: AccountId::new(uuid),
        username,
    })
}
