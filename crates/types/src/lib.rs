//! Core type definitions for sealed-bid uniform-price auctions.
//!
//! This crate provides the shared data structures used across the auction system,
//! including commitment hashes, auction configuration, bid records, and the
//! clearing result.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

pub mod events;

pub use events::AuctionEvent;

// =========================
// COMMITMENTS
// =========================

/// Generic address type (32 bytes)
pub type Address = [u8; 32];

/// Secret blinding value chosen by the bidder at commit time.
pub type Salt = [u8; 32];

/// Domain tag prefixed to every bid commitment preimage.
pub const COMMITMENT_DOMAIN: &[u8] = b"SEALED_BID_V1:";

/// Hash commitment to a sealed bid (32 bytes)
#[serde_as]
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct CommitmentHash(#[serde_as(as = "[_; 32]")] pub [u8; 32]);

impl CommitmentHash {
    /// The "no bid yet" sentinel.
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl Default for CommitmentHash {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Compute the commitment binding a bidder to a (price, quantity) pair.
///
/// `SHA-256(domain || bidder || price_le || quantity_le || salt)`
pub fn compute_bid_commitment(
    bidder: &Address,
    price: u64,
    quantity: u64,
    salt: &Salt,
) -> CommitmentHash {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(COMMITMENT_DOMAIN);
    hasher.update(bidder);
    hasher.update(price.to_le_bytes());
    hasher.update(quantity.to_le_bytes());
    hasher.update(salt);
    CommitmentHash(hasher.finalize().into())
}

// =========================
// AUCTION TYPES
// =========================

/// Auction lifecycle phase.
///
/// Ordering follows the lifecycle, so `a < b` means `a` precedes `b`.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub enum AuctionPhase {
    /// Configuration accepted, commit window not yet opened
    Setup,
    /// Accepting sealed commitments
    Commit,
    /// At least one bid has been revealed
    Reveal,
    /// Clearing price computed, claims open
    Finalized,
}

impl AuctionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionPhase::Setup => "setup",
            AuctionPhase::Commit => "commit",
            AuctionPhase::Reveal => "reveal",
            AuctionPhase::Finalized => "finalized",
        }
    }
}

/// Immutable auction configuration, fixed at creation.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct AuctionConfig {
    pub auction_id: u64,
    pub organizer: Address,

    // Supply and price bounds
    pub total_supply: u64,
    pub min_price: u64,
    pub max_price: u64,

    /// Fixed-point scale of the quantity unit; payments are divided by it.
    pub quantity_scale: u64,

    // Timing
    pub created_at: u64,
    pub commit_deadline: u64,
    pub reveal_deadline: u64,
    pub claim_deadline: u64,

    /// Opaque reference to the organizer's decryption key
    pub organizer_key_ref: Vec<u8>,
}

/// A bidder's record. One per bidder identity per auction.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Bid {
    pub bidder: Address,
    pub commitment: CommitmentHash,
    /// Encrypted bid content, never decoded by the engine
    pub encrypted_payload: Vec<u8>,
    /// Global arrival order of the commitment (0-based)
    pub commit_index: u64,
    pub committed_at: u64,

    pub revealed: bool,
    pub price: u64,
    pub quantity: u64,

    pub allocation: u64,
    pub claimed: bool,
}

impl Bid {
    /// Create a freshly committed, unrevealed bid.
    pub fn committed(
        bidder: Address,
        commitment: CommitmentHash,
        encrypted_payload: Vec<u8>,
        commit_index: u64,
        committed_at: u64,
    ) -> Self {
        Self {
            bidder,
            commitment,
            encrypted_payload,
            commit_index,
            committed_at,
            revealed: false,
            price: 0,
            quantity: 0,
            allocation: 0,
            claimed: false,
        }
    }
}

/// Outcome of finalization. Written once.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct ClearingResult {
    pub clearing_price: u64,
    pub total_allocated_quantity: u64,
    pub finalized_at: u64,
}
