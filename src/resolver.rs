//! Balance Resolver
//!
//! The ledger's detail schema is not stable across deployments, so the
//! canonical balance is extracted through a layered fallback: an ordered
//! list of known field paths, then a generic scan for balance-like numeric
//! fields, then the dedicated balance endpoints. The matched source is
//! logged and carried on the snapshot for diagnostics.
//!
//! A resolver miss is `Unresolvable`, never a fabricated zero. Callers must
//! treat the two differently.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::ledger::types::integer_from;
use crate::ledger::{AccountId, LedgerApi, LedgerError};

/// Field-name tokens that mark a value as balance-like during the generic
/// scan (matched case-insensitively, as substrings).
const BALANCE_TOKENS: [&str; 4] = ["balance", "tokens", "credits", "points"];

#[derive(Debug, Error, Clone)]
pub enum ResolveError {
    /// No known field path, no balance-like numeric field, and no balance
    /// endpoint produced a number. Distinct from a genuine zero balance.
    #[error("no numeric balance found for account {0}")]
    Unresolvable(AccountId),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// A resolved balance plus where it came from.
///
/// Never cached; true only at time of fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceSnapshot {
    pub amount: i64,
    /// Matched field path or endpoint name, for diagnostics.
    pub source: String,
}

pub struct BalanceResolver {
    ledger: Arc<dyn LedgerApi>,
    /// Ordered dotted field paths, tried before the generic scan. This list
    /// is deployment configuration, not a contract.
    paths: Vec<String>,
}

impl BalanceResolver {
    pub fn new(ledger: Arc<dyn LedgerApi>, paths: Vec<String>) -> Self {
        Self { ledger, paths }
    }

    /// Resolve the canonical balance for an account.
    ///
    /// Ordered, short-circuiting on the first numeric hit:
    /// 1. known field paths in the detail document
    /// 2. generic scan for balance-like numeric fields
    /// 3. dedicated balance endpoints
    pub async fn resolve(&self, account_id: &AccountId) -> Result<BalanceSnapshot, ResolveError> {
        let details = self.ledger.fetch_details(account_id).await?;

        for path in &self.paths {
            if let Some(amount) = probe_path(&details, path).and_then(integer_from) {
                debug!(account_id = %account_id, path = %path, amount, "balance matched known field path");
                return Ok(BalanceSnapshot {
                    amount,
                    source: path.clone(),
                });
            }
        }

        if let Some((amount, path)) = scan_balance_like(&details) {
            debug!(account_id = %account_id, path = %path, amount, "balance matched generic scan");
            return Ok(BalanceSnapshot {
                amount,
                source: path,
            });
        }

        if let Some(amount) = self.ledger.fetch_balance(account_id).await? {
            debug!(account_id = %account_id, amount, "balance matched dedicated endpoint");
            return Ok(BalanceSnapshot {
                amount,
                source: "balance-endpoint".to_string(),
            });
        }

        Err(ResolveError::Unresolvable(account_id.clone()))
    }
}

/// Walk a dotted path (`stats.wallet.balance`) through a JSON document.
pub fn probe_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = doc;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Generic last-resort scan: depth-first, most-recently-pushed first, for
/// any balance-like field holding a numeric value. Traversal order is
/// deterministic so results are reproducible.
fn scan_balance_like(doc: &Value) -> Option<(i64, String)> {
    let mut stack: Vec<(String, &Value)> = vec![(String::new(), doc)];

    while let Some((prefix, value)) = stack.pop() {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    let path = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{prefix}.{key}")
                    };
                    if is_balance_like(key)
                        && let Some(amount) = integer_from(child)
                    {
                        return Some((amount, path));
                    }
                    stack.push((path, child));
                }
            }
            Value::Array(items) => {
                for (index, child) in items.iter().enumerate() {
                    stack.push((format!("{prefix}[{index}]"), child));
                }
            }
            _ => {}
        }
    }

    None
}

fn is_balance_like(name: &str) -> bool {
    let lower = name.to_lowercase();
    BALANCE_TOKENS.iter().any(|token| lower.contains(token))
}
