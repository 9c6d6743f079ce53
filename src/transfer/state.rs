//! Transfer FSM State Definitions

use std::fmt;

/// Per-transfer state machine, in-memory only. A record exists for the
/// duration of one transfer call and is discarded afterwards; all durable
/// state lives in the remote ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferState {
    /// Request validated and recorded, no mutation submitted.
    Init,

    /// Debit submitted to the sender's queue.
    Debiting,

    /// Debit confirmed. Funds are in-flight: must reach COMPLETE,
    /// ROLLED_BACK, or ROLLBACK_FAILED.
    Debited,

    /// Credit submitted to the recipient's queue.
    Crediting,

    /// Terminal: debit and credit both applied.
    Complete,

    /// Terminal: debit failed, no funds moved.
    FailedNoChange,

    /// Compensating credit submitted to the sender's queue.
    RollingBack,

    /// Terminal: credit failed, compensation restored the sender.
    RolledBack,

    /// Terminal: credit failed AND compensation failed. The sender is short
    /// the debited amount; manual reconciliation required.
    RollbackFailed,
}

impl TransferState {
    /// Check if this is a terminal state (no more transitions possible).
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferState::Complete
                | TransferState::FailedNoChange
                | TransferState::RolledBack
                | TransferState::RollbackFailed
        )
    }

    /// Check if funds are in-flight (sender debited, outcome not settled).
    #[inline]
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            TransferState::Debited | TransferState::Crediting | TransferState::RollingBack
        )
    }

    /// Get human-readable state name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferState::Init => "INIT",
            TransferState::Debiting => "DEBITING",
            TransferState::Debited => "DEBITED",
            TransferState::Crediting => "CREDITING",
            TransferState::Complete => "COMPLETE",
            TransferState::FailedNoChange => "FAILED_NO_CHANGE",
            TransferState::RollingBack => "ROLLING_BACK",
            TransferState::RolledBack => "ROLLED_BACK",
            TransferState::RollbackFailed => "ROLLBACK_FAILED",
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(TransferState::Complete.is_terminal());
        assert!(TransferState::FailedNoChange.is_terminal());
        assert!(TransferState::RolledBack.is_terminal());
        assert!(TransferState::RollbackFailed.is_terminal());

        assert!(!TransferState::Init.is_terminal());
        assert!(!TransferState::Debiting.is_terminal());
        assert!(!TransferState::Debited.is_terminal());
        assert!(!TransferState::Crediting.is_terminal());
        assert!(!TransferState::RollingBack.is_terminal());
    }

    #[test]
    fn test_in_flight_states() {
        assert!(TransferState::Debited.is_in_flight());
        assert!(TransferState::Crediting.is_in_flight());
        assert!(TransferState::RollingBack.is_in_flight());

        assert!(!TransferState::Init.is_in_flight());
        assert!(!TransferState::Debiting.is_in_flight());
        assert!(!TransferState::Complete.is_in_flight());
        assert!(!TransferState::FailedNoChange.is_in_flight());
        assert!(!TransferState::RolledBack.is_in_flight());
        assert!(!TransferState::RollbackFailed.is_in_flight());
    }

    #[test]
    fn test_display() {
        assert_eq!(TransferState::Init.to_string(), "INIT");
        assert_eq!(TransferState::Complete.to_string(), "COMPLETE");
        assert_eq!(TransferState::RollbackFailed.to_string(), "ROLLBACK_FAILED");
    }
}
