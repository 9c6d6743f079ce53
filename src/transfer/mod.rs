//! Peer-to-Peer Transfer Protocol
//!
//! Implements a transfer as a two-step debit/credit sequence with
//! best-effort compensation, on top of the per-account queues and the
//! ledger client.
//!
//! # State Machine
//!
//! ```text
//! INIT → DEBITING → DEBITED → CREDITING → COMPLETE
//!            ↓                     ↓
//!    FAILED_NO_CHANGE       ROLLING_BACK → ROLLED_BACK
//!                                  ↓
//!                           ROLLBACK_FAILED
//! ```
//!
//! # Safety Invariants
//!
//! 1. **Preconditions before mutations**: invalid amount, self-transfer,
//!    unresolvable accounts, and insufficient balance all reject with no
//!    remote mutation performed.
//! 2. **Debit first**: a failed second step leaves deducted funds to
//!    restore, never funds created from nothing.
//! 3. **One attempt per mutation**: debits, credits, and the compensation
//!    are each submitted at most once; retries could double-apply.
//! 4. **Rollback failure is loud**: `ROLLBACK_FAILED` is a distinct fatal
//!    outcome, logged at error severity, never swallowed.

pub mod coordinator;
pub mod error;
pub mod state;
pub mod types;

pub use coordinator::TransferCoordinator;
pub use error::TransferError;
pub use state::TransferState;
pub use types::{TransferOutcome, TransferRecord, TransferRequest};
