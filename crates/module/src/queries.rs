//! Query handlers for the auction module.
//!
//! These functions provide read-only access to auction state.

use crate::phase::Window;
use crate::state::AuctionState;
use auction_types::{Address, AuctionConfig, AuctionEvent, AuctionPhase, Bid, ClearingResult};
use serde::{Deserialize, Serialize};

/// Query request types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum AuctionQuery {
    /// Get the stored phase.
    CurrentPhase,

    /// Get a bidder's record.
    GetBid { bidder: Address },

    /// Get the clearing price, if finalized.
    ClearingPrice,

    /// Get the commit deadline.
    CommitDeadline,

    /// Get the reveal deadline.
    RevealDeadline,

    /// Get the claim deadline.
    ClaimDeadline,

    /// Get the auction configuration.
    GetConfig,

    /// Get the clearing result.
    GetResult,

    /// Get all bids in commit order.
    ListBids,

    /// Get events from a cursor onward.
    Events { from: usize },

    /// Get allocations not yet claimed.
    UnclaimedAllocations,
}

/// Query response types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum AuctionQueryResponse {
    Phase(AuctionPhase),
    Bid(Option<Bid>),
    ClearingPrice(Option<u64>),
    Deadline(u64),
    Config(AuctionConfig),
    Result(Option<ClearingResult>),
    Bids(Vec<Bid>),
    Events(Vec<AuctionEvent>),
    Allocations(Vec<(Address, u64)>),
}

/// Handle a query.
pub fn handle_query(state: &AuctionState, query: AuctionQuery) -> AuctionQueryResponse {
    match query {
        AuctionQuery::CurrentPhase => AuctionQueryResponse::Phase(state.phase()),

        AuctionQuery::GetBid { bidder } => {
            AuctionQueryResponse::Bid(state.get_bid(&bidder).cloned())
        }

        AuctionQuery::ClearingPrice => {
            AuctionQueryResponse::ClearingPrice(state.result().map(|r| r.clearing_price))
        }

        AuctionQuery::CommitDeadline => {
            AuctionQueryResponse::Deadline(state.clock().commit_deadline())
        }

        AuctionQuery::RevealDeadline => {
            AuctionQueryResponse::Deadline(state.clock().reveal_deadline())
        }

        AuctionQuery::ClaimDeadline => {
            AuctionQueryResponse::Deadline(state.clock().claim_deadline())
        }

        AuctionQuery::GetConfig => AuctionQueryResponse::Config(state.config().clone()),

        AuctionQuery::GetResult => AuctionQueryResponse::Result(state.result().copied()),

        AuctionQuery::ListBids => AuctionQueryResponse::Bids(
            state
                .bids_in_commit_order()
                .into_iter()
                .cloned()
                .collect(),
        ),

        AuctionQuery::Events { from } => {
            AuctionQueryResponse::Events(state.events_from(from).to_vec())
        }

        AuctionQuery::UnclaimedAllocations => {
            AuctionQueryResponse::Allocations(state.unclaimed_allocations())
        }
    }
}

/// Summary of an auction for listing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuctionSummary {
    pub auction_id: u64,
    pub organizer: Address,
    pub phase: AuctionPhase,
    pub window: Window,
    pub total_supply: u64,
    pub commit_deadline: u64,
    pub reveal_deadline: u64,
    pub claim_deadline: u64,
    pub num_bids: usize,
    pub clearing_price: Option<u64>,
}

impl AuctionSummary {
    /// Create summary from auction state at `now`.
    pub fn from_state(state: &AuctionState, now: u64) -> Self {
        let config = state.config();
        Self {
            auction_id: config.auction_id,
            organizer: config.organizer,
            phase: state.phase(),
            window: state.clock().window_at(now),
            total_supply: config.total_supply,
            commit_deadline: config.commit_deadline,
            reveal_deadline: config.reveal_deadline,
            claim_deadline: config.claim_deadline,
            num_bids: state.num_bids(),
            clearing_price: state.result().map(|r| r.clearing_price),
        }
    }
}
