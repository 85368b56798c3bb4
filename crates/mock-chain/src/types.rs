//! RPC-compatible types for the mock chain.
//!
//! These types are JSON-serializable versions of the core auction types,
//! with addresses and byte strings hex encoded.

use auction_module::{AuctionState, Window};
use auction_types::{AuctionEvent, Bid};
use serde::{Deserialize, Serialize};

/// Block info response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockInfo {
    pub height: u64,
    pub timestamp: u64,
}

/// Parameters for creating an auction.
///
/// Unset durations and scale fall back to the engine defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuctionParams {
    pub sender: String,
    pub total_supply: u64,
    pub min_price: u64,
    pub max_price: u64,
    pub commit_duration_secs: Option<u64>,
    pub reveal_duration_secs: Option<u64>,
    pub claim_duration_secs: Option<u64>,
    pub quantity_scale: Option<u64>,
    /// Hex-encoded reference to the organizer's decryption key
    pub organizer_key_ref: Option<String>,
}

/// Parameters for committing a sealed bid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitBidParams {
    pub sender: String,
    pub auction_id: u64,
    /// Hex-encoded commitment hash (32 bytes)
    pub commitment: String,
    /// Hex-encoded encrypted bid payload
    pub encrypted_payload: String,
}

/// Parameters for revealing a bid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealBidParams {
    pub sender: String,
    pub auction_id: u64,
    pub price: u64,
    pub quantity: u64,
    /// Hex-encoded salt (32 bytes)
    pub salt: String,
}

/// Finalization result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizeRpc {
    pub clearing_price: u64,
    pub total_allocated_quantity: u64,
    pub oversubscribed: bool,
    pub winners: usize,
}

/// Claim receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimReceiptRpc {
    pub allocation: u64,
    pub payment: u64,
}

/// Account balances on the in-memory ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceRpc {
    pub address: String,
    pub payment: u64,
    pub asset: u64,
}

/// Auction overview for RPC responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionInfoRpc {
    pub auction_id: u64,
    pub organizer: String,
    pub phase: String,
    pub window: String,
    pub total_supply: u64,
    pub min_price: u64,
    pub max_price: u64,
    pub quantity_scale: u64,
    pub created_at: u64,
    pub commit_deadline: u64,
    pub reveal_deadline: u64,
    pub claim_deadline: u64,
    pub num_bids: usize,
    pub clearing_price: Option<u64>,
    pub total_allocated_quantity: Option<u64>,
    pub reserve: u64,
}

impl AuctionInfoRpc {
    pub fn from_state(state: &AuctionState, now: u64, reserve: u64) -> Self {
        let c = state.config();
        let result = state.result();
        Self {
            auction_id: c.auction_id,
            organizer: hex::encode(c.organizer),
            phase: state.phase().as_str().to_string(),
            window: window_name(state.clock().window_at(now)).to_string(),
            total_supply: c.total_supply,
            min_price: c.min_price,
            max_price: c.max_price,
            quantity_scale: c.quantity_scale,
            created_at: c.created_at,
            commit_deadline: c.commit_deadline,
            reveal_deadline: c.reveal_deadline,
            claim_deadline: c.claim_deadline,
            num_bids: state.num_bids(),
            clearing_price: result.map(|r| r.clearing_price),
            total_allocated_quantity: result.map(|r| r.total_allocated_quantity),
            reserve,
        }
    }
}

fn window_name(window: Window) -> &'static str {
    match window {
        Window::Commit => "commit",
        Window::Reveal => "reveal",
        Window::AwaitingFinalize => "awaiting_finalize",
        Window::Claim => "claim",
        Window::Closed => "closed",
    }
}

/// Bid record for RPC responses.
///
/// Price and quantity stay hidden until the bid is revealed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidRpc {
    pub bidder: String,
    pub commitment: String,
    pub encrypted_payload: String,
    pub commit_index: u64,
    pub committed_at: u64,
    pub revealed: bool,
    pub price: Option<u64>,
    pub quantity: Option<u64>,
    pub allocation: u64,
    pub claimed: bool,
}

impl From<&Bid> for BidRpc {
    fn from(b: &Bid) -> Self {
        Self {
            bidder: hex::encode(b.bidder),
            commitment: hex::encode(b.commitment.0),
            encrypted_payload: hex::encode(&b.encrypted_payload),
            commit_index: b.commit_index,
            committed_at: b.committed_at,
            revealed: b.revealed,
            price: b.revealed.then_some(b.price),
            quantity: b.revealed.then_some(b.quantity),
            allocation: b.allocation,
            claimed: b.claimed,
        }
    }
}

/// Event log entry for RPC responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventRpc {
    BidCommitted {
        bidder: String,
        commitment: String,
        encrypted_payload: String,
        timestamp: u64,
    },
    BidRevealed {
        bidder: String,
        price: u64,
        quantity: u64,
    },
    AuctionFinalized {
        clearing_price: u64,
        total_allocated_quantity: u64,
        oversubscribed: bool,
        timestamp: u64,
        allocations: Vec<(String, u64)>,
    },
    TokensClaimed {
        bidder: String,
        allocation: u64,
        payment: u64,
    },
}

impl From<&AuctionEvent> for EventRpc {
    fn from(e: &AuctionEvent) -> Self {
        match e {
            AuctionEvent::BidCommitted {
                bidder,
                commitment,
                encrypted_payload,
                timestamp,
            } => EventRpc::BidCommitted {
                bidder: hex::encode(bidder),
                commitment: hex::encode(commitment.0),
                encrypted_payload: hex::encode(encrypted_payload),
                timestamp: *timestamp,
            },
            AuctionEvent::BidRevealed {
                bidder,
                price,
                quantity,
            } => EventRpc::BidRevealed {
                bidder: hex::encode(bidder),
                price: *price,
                quantity: *quantity,
            },
            AuctionEvent::AuctionFinalized {
                clearing_price,
                total_allocated_quantity,
                oversubscribed,
                timestamp,
                allocations,
            } => EventRpc::AuctionFinalized {
                clearing_price: *clearing_price,
                total_allocated_quantity: *total_allocated_quantity,
                oversubscribed: *oversubscribed,
                timestamp: *timestamp,
                allocations: allocations
                    .iter()
                    .map(|(bidder, qty)| (hex::encode(bidder), *qty))
                    .collect(),
            },
            AuctionEvent::TokensClaimed {
                bidder,
                allocation,
                payment,
            } => EventRpc::TokensClaimed {
                bidder: hex::encode(bidder),
                allocation: *allocation,
                payment: *payment,
            },
        }
    }
}
