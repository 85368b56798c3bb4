//! Single-writer wrapper around one auction instance.

use auction_types::{Address, AuctionEvent, AuctionPhase, Bid, CommitmentHash, Salt};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::call::{dispatch_call, AuctionCall};
use crate::handlers::{CallContext, HandlerResult};
use crate::journal::Journal;
use crate::ledger::SettlementLedger;
use crate::queries::{handle_query, AuctionQuery, AuctionQueryResponse, AuctionSummary};
use crate::state::AuctionState;

/// One auction instance.
///
/// All calls are serialized through a single lock held for the whole call,
/// so operations on the same auction are totally ordered and never interleave.
pub struct Auction {
    auction_id: u64,
    state: Mutex<AuctionState>,
    ledger: Arc<dyn SettlementLedger>,
    journal: Arc<dyn Journal>,
}

impl Auction {
    pub fn new(
        state: AuctionState,
        ledger: Arc<dyn SettlementLedger>,
        journal: Arc<dyn Journal>,
    ) -> Self {
        Self {
            auction_id: state.auction_id(),
            state: Mutex::new(state),
            ledger,
            journal,
        }
    }

    pub fn id(&self) -> u64 {
        self.auction_id
    }

    /// Execute a call.
    pub fn execute(&self, ctx: &CallContext, call: AuctionCall) -> HandlerResult<AuctionEvent> {
        let name = call.name();
        let mut state = self.state.lock();

        match dispatch_call(&mut state, ctx, call, &*self.ledger, &*self.journal) {
            Ok(event) => {
                log_event(self.auction_id, &event);
                Ok(event)
            }
            Err(e) => {
                warn!(
                    auction_id = self.auction_id,
                    call = name,
                    sender = %short_hex(&ctx.sender),
                    error = %e,
                    "Call rejected"
                );
                Err(e)
            }
        }
    }

    pub fn commit_bid(
        &self,
        ctx: &CallContext,
        commitment: CommitmentHash,
        encrypted_payload: Vec<u8>,
    ) -> HandlerResult<AuctionEvent> {
        self.execute(
            ctx,
            AuctionCall::CommitBid {
                commitment,
                encrypted_payload,
            },
        )
    }

    pub fn reveal_bid(
        &self,
        ctx: &CallContext,
        price: u64,
        quantity: u64,
        salt: Salt,
    ) -> HandlerResult<AuctionEvent> {
        self.execute(
            ctx,
            AuctionCall::RevealBid {
                price,
                quantity,
                salt,
            },
        )
    }

    pub fn finalize(&self, ctx: &CallContext) -> HandlerResult<AuctionEvent> {
        self.execute(ctx, AuctionCall::Finalize)
    }

    pub fn claim_tokens(&self, ctx: &CallContext) -> HandlerResult<AuctionEvent> {
        self.execute(ctx, AuctionCall::ClaimTokens)
    }

    /// Answer a read-only query.
    pub fn query(&self, query: AuctionQuery) -> AuctionQueryResponse {
        handle_query(&self.state.lock(), query)
    }

    pub fn current_phase(&self) -> AuctionPhase {
        self.state.lock().phase()
    }

    pub fn bid(&self, bidder: &Address) -> Option<Bid> {
        self.state.lock().get_bid(bidder).cloned()
    }

    pub fn clearing_price(&self) -> Option<u64> {
        self.state.lock().result().map(|r| r.clearing_price)
    }

    pub fn commit_deadline(&self) -> u64 {
        self.state.lock().clock().commit_deadline()
    }

    pub fn reveal_deadline(&self) -> u64 {
        self.state.lock().clock().reveal_deadline()
    }

    pub fn claim_deadline(&self) -> u64 {
        self.state.lock().clock().claim_deadline()
    }

    pub fn summary(&self, now: u64) -> AuctionSummary {
        AuctionSummary::from_state(&self.state.lock(), now)
    }

    /// Run a closure against a consistent view of the state.
    pub fn with_state<R>(&self, f: impl FnOnce(&AuctionState) -> R) -> R {
        f(&self.state.lock())
    }

    /// Apply a journaled event without re-running checks or side effects.
    pub(crate) fn replay(&self, event: AuctionEvent) {
        debug!(auction_id = self.auction_id, event = event.name(), "Replaying event");
        self.state.lock().apply(event);
    }
}

fn log_event(auction_id: u64, event: &AuctionEvent) {
    match event {
        AuctionEvent::BidCommitted {
            bidder,
            encrypted_payload,
            ..
        } => info!(
            auction_id,
            bidder = %short_hex(bidder),
            payload_len = encrypted_payload.len(),
            "Bid committed"
        ),
        AuctionEvent::BidRevealed {
            bidder,
            price,
            quantity,
        } => info!(
            auction_id,
            bidder = %short_hex(bidder),
            price,
            quantity,
            "Bid revealed"
        ),
        AuctionEvent::AuctionFinalized {
            clearing_price,
            total_allocated_quantity,
            oversubscribed,
            allocations,
            ..
        } => info!(
            auction_id,
            clearing_price,
            total_allocated_quantity,
            oversubscribed,
            winners = allocations.len(),
            "Auction finalized"
        ),
        AuctionEvent::TokensClaimed {
            bidder,
            allocation,
            payment,
        } => info!(
            auction_id,
            bidder = %short_hex(bidder),
            allocation,
            payment,
            "Tokens claimed"
        ),
    }
}

/// First four bytes of an address, hex encoded, for log lines.
fn short_hex(address: &Address) -> String {
    address[..4].iter().map(|b| format!("{:02x}", b)).collect()
}
