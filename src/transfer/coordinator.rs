//! Transfer Coordinator
//!
//! Drives the peer-to-peer transfer protocol: debit the sender, credit the
//! recipient, compensate the sender when the credit fails. The ledger has
//! no multi-account transaction primitive, so the transfer is two
//! independent single-account mutations ordered by the account queues.
//! Debit-first biases failures toward conservative, recoverable states
//! rather than inflationary ones.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::ledger::{AccountId, LedgerApi, LedgerError, MutationReceipt, MutationRequest};
use crate::queue::{AccountQueues, QueueError};
use crate::resolver::BalanceResolver;

use super::error::TransferError;
use super::state::TransferState;
use super::types::{TransferOutcome, TransferRecord, TransferRequest};

#[derive(Clone)]
pub struct TransferCoordinator {
    ledger: Arc<dyn LedgerApi>,
    resolver: Arc<BalanceResolver>,
    queues: AccountQueues,
}

impl TransferCoordinator {
    pub fn new(
        ledger: Arc<dyn LedgerApi>,
        resolver: Arc<BalanceResolver>,
        queues: AccountQueues,
    ) -> Self {
        Self {
            ledger,
            resolver,
            queues,
        }
    }

    /// Execute one transfer to a terminal state.
    ///
    /// Amount and self-transfer preconditions are rejected here, before any
    /// remote call. The protocol body runs in its own task: once the debit
    /// has started, a caller dropping this future cannot abandon the
    /// transfer mid-flight.
    pub async fn transfer(
        &self,
        request: TransferRequest,
    ) -> Result<TransferOutcome, TransferError> {
        if request.amount <= 0 {
            return Err(TransferError::InvalidAmount);
        }
        if request.sender == request.recipient {
            return Err(TransferError::SelfTransfer);
        }

        let this = self.clone();
        match tokio::spawn(async move { this.run_protocol(request).await }).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "transfer task did not complete");
                Err(TransferError::Queue(QueueError::Canceled))
            }
        }
    }

    async fn run_protocol(
        &self,
        request: TransferRequest,
    ) -> Result<TransferOutcome, TransferError> {
        let mut record = TransferRecord::new(&request);

        // Remaining preconditions, all before any mutation: both balances
        // resolvable, sender covered.
        let sender_before = self.resolver.resolve(&record.sender).await?;
        self.resolver.resolve(&record.recipient).await?;

        if sender_before.amount < record.amount {
            return Err(TransferError::InsufficientBalance {
                available: sender_before.amount,
                requested: record.amount,
            });
        }

        // Step 1: debit the sender. A failure here means no funds moved.
        transition(&mut record, TransferState::Debiting);
        match self
            .submit(&record.sender, -record.amount, debit_description(&record))
            .await
        {
            Ok(Ok(receipt)) => {
                debug!(transfer = %record, simulated = receipt.simulated, "debit applied");
                transition(&mut record, TransferState::Debited);
            }
            Ok(Err(e)) => {
                transition(&mut record, TransferState::FailedNoChange);
                return Err(match e {
                    LedgerError::RateLimited { retry_after_secs } => {
                        TransferError::RateLimited { retry_after_secs }
                    }
                    other => TransferError::DebitFailed(other.to_string()),
                });
            }
            Err(e) => {
                transition(&mut record, TransferState::FailedNoChange);
                return Err(e.into());
            }
        }

        // Step 2: credit the recipient. From here on the debit is applied
        // and every failure path must settle the sender's funds.
        transition(&mut record, TransferState::Crediting);
        let credit_error = match self
            .submit(
                &record.recipient,
                record.amount,
                credit_description(&record),
            )
            .await
        {
            Ok(Ok(receipt)) => {
                debug!(transfer = %record, simulated = receipt.simulated, "credit applied");
                None
            }
            Ok(Err(e)) => Some(e.to_string()),
            Err(e) => Some(e.to_string()),
        };

        let Some(credit_error) = credit_error else {
            transition(&mut record, TransferState::Complete);
            info!(transfer = %record, "transfer complete");

            // Informational only: a failed re-resolve never fails the
            // transfer.
            let new_sender_balance = match self.resolver.resolve(&record.sender).await {
                Ok(snapshot) => Some(snapshot.amount),
                Err(e) => {
                    warn!(sender = %record.sender, error = %e, "post-transfer balance re-resolve failed");
                    None
                }
            };

            return Ok(TransferOutcome {
                state: record.state,
                new_sender_balance,
            });
        };

        // Step 3: compensate. Exactly one attempt; mutation submission is
        // not known to be idempotent, so a retried rollback is not safe.
        warn!(transfer = %record, error = %credit_error, "credit failed, compensating sender");
        transition(&mut record, TransferState::RollingBack);
        match self
            .submit(&record.sender, record.amount, rollback_description(&record))
            .await
        {
            Ok(Ok(_)) => {
                transition(&mut record, TransferState::RolledBack);
                warn!(transfer = %record, "sender compensated, transfer rolled back");
                Err(TransferError::CreditRolledBack(credit_error))
            }
            Ok(Err(e)) => self.rollback_failed(&mut record, credit_error, e.to_string()),
            Err(e) => self.rollback_failed(&mut record, credit_error, e.to_string()),
        }
    }

    fn rollback_failed(
        &self,
        record: &mut TransferRecord,
        credit_error: String,
        rollback_error: String,
    ) -> Result<TransferOutcome, TransferError> {
        transition(record, TransferState::RollbackFailed);
        error!(
            transfer = %record,
            credit_error = %credit_error,
            rollback_error = %rollback_error,
            "ROLLBACK FAILED: sender debited and not restored, manual reconciliation required"
        );
        Err(TransferError::RollbackFailed {
            sender: record.sender.clone(),
            amount: record.amount,
            credit_error,
            rollback_error,
        })
    }

    /// Submit one mutation through the account's FIFO queue.
    ///
    /// The outer error is queue delivery, the inner is the ledger's answer.
    /// Exactly one ledger attempt per call; mutations are never retried.
    async fn submit(
        &self,
        account_id: &AccountId,
        amount: i64,
        description: String,
    ) -> Result<Result<MutationReceipt, LedgerError>, QueueError> {
        let ledger = Arc::clone(&self.ledger);
        let request = MutationRequest {
            account_id: account_id.clone(),
            amount,
            description,
        };
        self.queues
            .run(account_id, async move { ledger.mutate(&request).await })
            .await
    }
}

fn transition(record: &mut TransferRecord, next: TransferState) {
    debug!(transfer = %record, next = %next, "transfer state transition");
    record.state = next;
}

fn debit_description(record: &TransferRecord) -> String {
    match &record.note {
        Some(note) => format!("transfer to {}: {}", record.recipient, note),
        None => format!("transfer to {}", record.recipient),
    }
}

fn credit_description(record: &TransferRecord) -> String {
    match &record.note {
        Some(note) => format!("transfer from {}: {}", record.sender, note),
        None => format!("transfer from {}", record.sender),
    }
}

fn rollback_description(record: &TransferRecord) -> String {
    format!(
        "rollback: refund of failed transfer to {}",
        record.recipient
    )
}
