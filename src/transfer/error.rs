//! Transfer Error Types

use thiserror::Error;

use crate::ledger::{AccountId, LedgerError};
use crate::queue::QueueError;
use crate::resolver::ResolveError;

/// Transfer error taxonomy.
///
/// Precondition failures are resolved locally before any mutation and carry
/// no remote side effects. `RollbackFailed` is the one fatal variant: the
/// sender has been debited and could not be restored.
#[derive(Error, Debug, Clone)]
pub enum TransferError {
    // === Precondition failures (no mutation performed) ===
    #[error("transfer amount must be a positive integer")]
    InvalidAmount,

    #[error("sender and recipient cannot be the same account")]
    SelfTransfer,

    #[error("insufficient balance: have {available}, need {requested}")]
    InsufficientBalance { available: i64, requested: i64 },

    #[error("no numeric balance found for account {0}")]
    Unresolvable(AccountId),

    // === Remote failures ===
    #[error("ledger rate limit hit, retry in ~{retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("debit failed, no funds moved: {0}")]
    DebitFailed(String),

    #[error("credit failed, debit was compensated: {0}")]
    CreditRolledBack(String),

    /// Fatal inconsistency: debit applied, credit failed, compensation also
    /// failed. Requires manual reconciliation; never retried automatically.
    #[error(
        "rollback failed: account {sender} is short {amount} tokens \
         (credit: {credit_error}; rollback: {rollback_error})"
    )]
    RollbackFailed {
        sender: AccountId,
        amount: i64,
        credit_error: String,
        rollback_error: String,
    },

    #[error("ledger error: {0}")]
    Ledger(String),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl TransferError {
    /// Stable error code for the chat layer's responses.
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::InvalidAmount => "INVALID_AMOUNT",
            TransferError::SelfTransfer => "SELF_TRANSFER",
            TransferError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            TransferError::Unresolvable(_) => "UNRESOLVABLE",
            TransferError::RateLimited { .. } => "RATE_LIMITED",
            TransferError::DebitFailed(_) => "DEBIT_FAILED",
            TransferError::CreditRolledBack(_) => "CREDIT_ROLLED_BACK",
            TransferError::RollbackFailed { .. } => "ROLLBACK_FAILED",
            TransferError::Ledger(_) => "LEDGER_ERROR",
            TransferError::Queue(_) => "QUEUE_ERROR",
        }
    }

    /// True only for the fatal ledger-inconsistency outcome.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TransferError::RollbackFailed { .. })
    }
}

impl From<LedgerError> for TransferError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::RateLimited { retry_after_secs } => {
                TransferError::RateLimited { retry_after_secs }
            }
            other => TransferError::Ledger(other.to_string()),
        }
    }
}

impl From<ResolveError> for TransferError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::Unresolvable(account_id) => TransferError::Unresolvable(account_id),
            ResolveError::Ledger(inner) => inner.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(TransferError::InvalidAmount.code(), "INVALID_AMOUNT");
        assert_eq!(
            TransferError::InsufficientBalance {
                available: 10,
                requested: 30
            }
            .code(),
            "INSUFFICIENT_BALANCE"
        );
        assert_eq!(
            TransferError::RollbackFailed {
                sender: AccountId::new("a"),
                amount: 30,
                credit_error: "timeout".into(),
                rollback_error: "timeout".into(),
            }
            .code(),
            "ROLLBACK_FAILED"
        );
    }

    #[test]
    fn test_only_rollback_failed_is_fatal() {
        let fatal = TransferError::RollbackFailed {
            sender: AccountId::new("a"),
            amount: 30,
            credit_error: "x".into(),
            rollback_error: "y".into(),
        };
        assert!(fatal.is_fatal());
        assert!(!TransferError::InvalidAmount.is_fatal());
        assert!(!TransferError::CreditRolledBack("x".into()).is_fatal());
    }

    #[test]
    fn test_ledger_error_mapping() {
        let rate = TransferError::from(LedgerError::RateLimited {
            retry_after_secs: 5,
        });
        assert!(matches!(
            rate,
            TransferError::RateLimited {
                retry_after_secs: 5
            }
        ));

        let remote = TransferError::from(LedgerError::Remote("boom".into()));
        assert!(matches!(remote, TransferError::Ledger(_)));
    }

    #[test]
    fn test_resolve_error_mapping() {
        let unresolvable =
            TransferError::from(ResolveError::Unresolvable(AccountId::new("ghost")));
        assert!(matches!(unresolvable, TransferError::Unresolvable(_)));
    }
}
