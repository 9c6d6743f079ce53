//! Transfer Core Types

use std::fmt;

use crate::ledger::AccountId;

use super::state::TransferState;

/// A peer-to-peer transfer request, already resolved to ledger account ids.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub sender: AccountId,
    pub recipient: AccountId,
    /// Whole tokens. Must be a positive integer.
    pub amount: i64,
    /// Caller-supplied note, threaded into the mutation descriptions.
    pub note: Option<String>,
}

impl TransferRequest {
    pub fn new(sender: AccountId, recipient: AccountId, amount: i64) -> Self {
        Self {
            sender,
            recipient,
            amount,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Ephemeral record of one transfer attempt. Lives only for the duration of
/// the call; never persisted.
#[derive(Debug, Clone)]
pub struct TransferRecord {
    pub sender: AccountId,
    pub recipient: AccountId,
    pub amount: i64,
    pub note: Option<String>,
    pub state: TransferState,
    /// Millisecond timestamp of record creation.
    pub created_at: i64,
}

impl TransferRecord {
    pub fn new(request: &TransferRequest) -> Self {
        Self {
            sender: request.sender.clone(),
            recipient: request.recipient.clone(),
            amount: request.amount,
            note: request.note.clone(),
            state: TransferState::Init,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

impl fmt::Display for TransferRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transfer {} -> {} amount={} state={}",
            self.sender, self.recipient, self.amount, self.state
        )
    }
}

/// Result of a completed transfer.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub state: TransferState,
    /// Sender's balance re-resolved after completion, for display. `None`
    /// when the informational re-resolve failed; that never fails the
    /// transfer itself.
    pub new_sender_balance: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_starts_in_init() {
        let request = TransferRequest::new(AccountId::new("a"), AccountId::new("b"), 30)
            .with_note("for the dragon hunt");
        let record = TransferRecord::new(&request);

        assert_eq!(record.state, TransferState::Init);
        assert_eq!(record.amount, 30);
        assert_eq!(record.note.as_deref(), Some("for the dragon hunt"));
        assert!(record.created_at > 0);
    }

    #[test]
    fn test_record_display() {
        let request = TransferRequest::new(AccountId::new("a"), AccountId::new("b"), 5);
        let record = TransferRecord::new(&request);
        assert_eq!(record.to_string(), "Transfer a -> b amount=5 state=INIT");
    }
}
