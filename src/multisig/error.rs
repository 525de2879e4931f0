//! Wallet error taxonomy

use crate::crypto::Address;
use thiserror::Error;

/// Errors returned by registry and ledger operations.
///
/// Every error aborts the operation that produced it; no state is changed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("Caller {0} is not an owner")]
    NotOwner(Address),
    #[error("Caller {0} is not the wallet itself")]
    NotSelfAuthorized(Address),
    #[error("Transaction not found: {0}")]
    UnknownTransaction(u64),
    #[error("Owner not found: {0}")]
    UnknownOwner(Address),
    #[error("Transaction {0} already executed")]
    AlreadyExecuted(u64),
    #[error("Transaction {index} already confirmed by {owner}")]
    AlreadyConfirmed { index: u64, owner: Address },
    #[error("Transaction {index} not confirmed by {owner}")]
    NotConfirmed { index: u64, owner: Address },
    #[error("Duplicate owner: {0}")]
    DuplicateOwner(Address),
    #[error("Invalid address: null identity")]
    InvalidAddress,
    #[error("Quorum invariant violated: quorum {quorum}, owners {owners}, max {max}")]
    QuorumInvariantViolated {
        quorum: u32,
        owners: usize,
        max: usize,
    },
    #[error("Insufficient confirmations: have {have}, need {need}")]
    InsufficientConfirmations { have: u32, need: u32 },
    #[error("Execution of transaction {index} failed: {reason}")]
    ExecutionFailed { index: u64, reason: String },
    #[error("Inconsistent wallet state: {0}")]
    InconsistentState(String),
}

/// Broad category of a [`WalletError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller lacks standing
    Authorization,
    /// Referenced entity absent
    Lookup,
    /// Operation invalid for the current lifecycle state
    StateConflict,
    /// Would corrupt registry invariants
    InvariantViolation,
    /// Quorum not met, or the external call failed
    Execution,
}

impl WalletError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            WalletError::NotOwner(_) | WalletError::NotSelfAuthorized(_) => ErrorKind::Authorization,
            WalletError::UnknownTransaction(_) | WalletError::UnknownOwner(_) => ErrorKind::Lookup,
            WalletError::AlreadyExecuted(_)
            | WalletError::AlreadyConfirmed { .. }
            | WalletError::NotConfirmed { .. } => ErrorKind::StateConflict,
            WalletError::DuplicateOwner(_)
            | WalletError::InvalidAddress
            | WalletError::QuorumInvariantViolated { .. }
            | WalletError::InconsistentState(_) => ErrorKind::InvariantViolation,
            WalletError::InsufficientConfirmations { .. } | WalletError::ExecutionFailed { .. } => {
                ErrorKind::Execution
            }
        }
    }
}
