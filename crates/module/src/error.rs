//! Auction module error types.

use thiserror::Error;

use crate::ledger::LedgerError;

/// Errors that can occur in the auction module.
///
/// Every error is returned before any state is touched; a rejected call
/// leaves the auction exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuctionError {
    #[error("Phase violation: {0}")]
    PhaseViolation(String),

    #[error("Bid already committed")]
    DuplicateBid,

    #[error("Reveal does not match commitment")]
    InvalidCommitment,

    #[error("Range violation: {0}")]
    RangeViolation(String),

    #[error("Tokens already claimed")]
    AlreadyClaimed,

    #[error("No allocation to claim")]
    NoAllocation,

    #[error("No commitment for bidder")]
    NoCommitment,

    #[error("Bid already revealed")]
    AlreadyRevealed,

    #[error("Auction not found: {0}")]
    AuctionNotFound(u64),

    #[error("Invalid auction parameters: {0}")]
    InvalidParams(#[from] crate::config::ParamsError),

    #[error("Settlement failed: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Journal write failed: {0}")]
    Journal(#[from] crate::journal::JournalError),
}

impl AuctionError {
    pub(crate) fn phase(msg: impl Into<String>) -> Self {
        AuctionError::PhaseViolation(msg.into())
    }

    pub(crate) fn range(msg: impl Into<String>) -> Self {
        AuctionError::RangeViolation(msg.into())
    }
}
