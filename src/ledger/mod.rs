//! Remote Ledger Service Client
//!
//! The ledger service is the system of record for token balances. This
//! module owns the typed HTTP wrapper around it: player lookup, detail and
//! history fetch, balance endpoints, and mutation submission (with a
//! simulation mode that skips the network but exercises identical
//! coordination logic).
//!
//! Everything above this module talks to the [`LedgerApi`] trait, never to
//! reqwest directly.

pub mod client;
pub mod error;
pub mod types;

pub use client::{HttpLedgerClient, LedgerApi, MAX_HISTORY_PAGE, clamp_history_limit};
pub use error::{DEFAULT_COOLDOWN_SECS, LedgerError};
pub use types::{Account, AccountId, MutationEvent, MutationReceipt, MutationRequest};
