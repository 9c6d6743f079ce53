//! Token Service Facade
//!
//! The surface exposed to the surrounding chat-command layer, keyed by
//! linked identity (the chat platform's user id) rather than ledger account
//! id. Command handlers call this; everything below works in account ids.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::config::AppConfig;
use crate::ledger::{Account, HttpLedgerClient, LedgerApi, LedgerError, MutationEvent};
use crate::queue::AccountQueues;
use crate::resolver::{BalanceResolver, BalanceSnapshot, ResolveError};
use crate::transfer::{TransferCoordinator, TransferError, TransferOutcome, TransferRequest};

#[derive(Debug, Error, Clone)]
pub enum ServiceError {
    /// The identity has no linked ledger account. A plain rejection, not a
    /// remote failure.
    #[error("no linked ledger account for {0}")]
    UnknownIdentity(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

pub struct TokenService {
    ledger: Arc<dyn LedgerApi>,
    resolver: Arc<BalanceResolver>,
    coordinator: TransferCoordinator,
}

impl TokenService {
    pub fn new(ledger: Arc<dyn LedgerApi>, balance_paths: Vec<String>) -> Self {
        let resolver = Arc::new(BalanceResolver::new(Arc::clone(&ledger), balance_paths));
        let queues = AccountQueues::new();
        let coordinator =
            TransferCoordinator::new(Arc::clone(&ledger), Arc::clone(&resolver), queues);

        Self {
            ledger,
            resolver,
            coordinator,
        }
    }

    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let client = HttpLedgerClient::new(&config.ledger)?;
        Ok(Self::new(
            Arc::new(client),
            config.ledger.balance_paths.clone(),
        ))
    }

    /// Resolve the canonical balance for a linked identity.
    pub async fn resolve_balance(
        &self,
        linked_identity: &str,
    ) -> Result<BalanceSnapshot, ServiceError> {
        let account = self.lookup(linked_identity).await?;
        Ok(self.resolver.resolve(&account.account_id).await?)
    }

    /// Transfer tokens between two linked identities.
    ///
    /// Amount and identity preconditions are checked before any remote
    /// call; the coordinator re-checks at the account-id level.
    pub async fn transfer(
        &self,
        sender_identity: &str,
        recipient_identity: &str,
        amount: i64,
        note: Option<String>,
    ) -> Result<TransferOutcome, ServiceError> {
        if amount <= 0 {
            return Err(TransferError::InvalidAmount.into());
        }
        if sender_identity == recipient_identity {
            return Err(TransferError::SelfTransfer.into());
        }

        let sender = self.lookup(sender_identity).await?;
        let recipient = self.lookup(recipient_identity).await?;

        let mut request = TransferRequest::new(sender.account_id, recipient.account_id, amount);
        if let Some(note) = note {
            request = request.with_note(note);
        }

        Ok(self.coordinator.transfer(request).await?)
    }

    /// Fetch recent transaction history for a linked identity. The limit is
    /// clamped, not rejected, by the ledger client.
    pub async fn fetch_history(
        &self,
        linked_identity: &str,
        limit: u32,
    ) -> Result<Vec<MutationEvent>, ServiceError> {
        let account = self.lookup(linked_identity).await?;
        Ok(self.ledger.fetch_history(&account.account_id, limit, 1).await?)
    }

    async fn lookup(&self, linked_identity: &str) -> Result<Account, ServiceError> {
        match self.ledger.find_account(linked_identity).await? {
            Some(account) => {
                debug!(identity = linked_identity, account_id = %account.account_id, "identity resolved");
                Ok(account)
            }
            None => Err(ServiceError::UnknownIdentity(linked_identity.to_string())),
        }
    }

    /// Account-id level access for callers that already hold one.
    pub fn resolver(&self) -> &BalanceResolver {
        &self.resolver
    }

    pub fn coordinator(&self) -> &TransferCoordinator {
        &self.coordinator
    }
}
