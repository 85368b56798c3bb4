//! Pure auction algorithms, free of state and I/O.
//!
//! This crate contains:
//! 1. Commitment opening checks for revealed bids
//! 2. Uniform clearing-price discovery over revealed bids
//! 3. Pro-rata rationing of the marginal price level
//!
//! Everything here is deterministic: the same revealed bids in the same
//! commit order always produce the same clearing price and allocations.

pub mod clearing;
pub mod commitment;

pub use clearing::{compute_clearing, BidAllocation, ClearingOutcome, RevealedBid};
pub use commitment::verify_commitment_opening;
