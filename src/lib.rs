//! tokenbridge - Account Mutation Coordinator
//!
//! Coordinates mutations to player token balances held by a remote ledger
//! service. Serializes all mutating operations per account, performs
//! peer-to-peer transfers as a debit/credit sequence with best-effort
//! compensation, and resolves a canonical balance from a ledger schema
//! whose field layout is not contractually fixed.
//!
//! # Modules
//!
//! - [`ledger`] - Typed HTTP client over the remote ledger service
//! - [`resolver`] - Layered balance extraction from untyped detail documents
//! - [`queue`] - Per-account FIFO job chains
//! - [`transfer`] - Debit/credit/compensate transfer protocol
//! - [`service`] - Facade for the chat-command layer (identity-keyed)
//! - [`config`] - YAML configuration
//! - [`logging`] - Tracing setup

pub mod config;
pub mod ledger;
pub mod logging;
pub mod queue;
pub mod resolver;
pub mod service;
pub mod transfer;

// Convenient re-exports at crate root
pub use config::{AppConfig, LedgerConfig};
pub use ledger::{
    Account, AccountId, HttpLedgerClient, LedgerApi, LedgerError, MutationEvent, MutationReceipt,
    MutationRequest,
};
pub use queue::{AccountQueues, QueueError};
pub use resolver::{BalanceResolver, BalanceSnapshot, ResolveError};
pub use service::{ServiceError, TokenService};
pub use transfer::{
    TransferCoordinator, TransferError, TransferOutcome, TransferRequest, TransferState,
};
