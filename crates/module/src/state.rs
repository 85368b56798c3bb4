//! Per-auction state.
//!
//! One `AuctionState` holds everything a single auction instance owns: its
//! configuration, phase clock, bid records, clearing result and event log.
//! All mutation goes through [`AuctionState::apply`], which is shared by live
//! operations and journal replay.

use auction_clearing::RevealedBid;
use auction_types::{Address, AuctionConfig, AuctionEvent, AuctionPhase, Bid, ClearingResult};
use std::collections::HashMap;

use crate::phase::PhaseClock;

/// State of one auction instance.
#[derive(Debug, Clone)]
pub struct AuctionState {
    /// Immutable configuration
    config: AuctionConfig,

    /// Stored phase and deadlines
    clock: PhaseClock,

    /// Bid records keyed by bidder
    bids: HashMap<Address, Bid>,

    /// Bidders in commit order
    commit_order: Vec<Address>,

    /// Written once by finalize
    result: Option<ClearingResult>,

    /// Every accepted event, in order
    events: Vec<AuctionEvent>,
}

impl AuctionState {
    /// Create the state for a new auction. The commit window is open.
    pub fn new(config: AuctionConfig) -> Self {
        let clock = PhaseClock::new(&config);
        Self {
            config,
            clock,
            bids: HashMap::new(),
            commit_order: Vec::new(),
            result: None,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &AuctionConfig {
        &self.config
    }

    pub fn auction_id(&self) -> u64 {
        self.config.auction_id
    }

    pub fn clock(&self) -> &PhaseClock {
        &self.clock
    }

    pub fn phase(&self) -> AuctionPhase {
        self.clock.phase()
    }

    pub fn result(&self) -> Option<&ClearingResult> {
        self.result.as_ref()
    }

    /// Get a bidder's record.
    pub fn get_bid(&self, bidder: &Address) -> Option<&Bid> {
        self.bids.get(bidder)
    }

    /// Whether the bidder holds a non-zero commitment.
    pub fn has_commitment(&self, bidder: &Address) -> bool {
        self.bids
            .get(bidder)
            .map(|bid| !bid.commitment.is_zero())
            .unwrap_or(false)
    }

    /// Number of committed bids.
    pub fn num_bids(&self) -> usize {
        self.commit_order.len()
    }

    /// All bids in commit order.
    pub fn bids_in_commit_order(&self) -> Vec<&Bid> {
        self.commit_order
            .iter()
            .filter_map(|bidder| self.bids.get(bidder))
            .collect()
    }

    /// Revealed bids in the shape the clearing algorithm consumes.
    pub fn revealed_bids(&self) -> Vec<RevealedBid> {
        self.bids_in_commit_order()
            .into_iter()
            .filter(|bid| bid.revealed)
            .map(|bid| RevealedBid {
                bidder: bid.bidder,
                price: bid.price,
                quantity: bid.quantity,
                commit_index: bid.commit_index,
            })
            .collect()
    }

    /// Allocations that have not been claimed yet.
    pub fn unclaimed_allocations(&self) -> Vec<(Address, u64)> {
        self.bids_in_commit_order()
            .into_iter()
            .filter(|bid| bid.allocation > 0 && !bid.claimed)
            .map(|bid| (bid.bidder, bid.allocation))
            .collect()
    }

    /// Events from position `from` onward.
    pub fn events_from(&self, from: usize) -> &[AuctionEvent] {
        self.events.get(from..).unwrap_or(&[])
    }

    pub fn num_events(&self) -> usize {
        self.events.len()
    }

    /// Apply an accepted event.
    ///
    /// Callers validate first; this never fails and never rejects.
    pub(crate) fn apply(&mut self, event: AuctionEvent) {
        match &event {
            AuctionEvent::BidCommitted {
                bidder,
                commitment,
                encrypted_payload,
                timestamp,
            } => {
                let commit_index = self.commit_order.len() as u64;
                self.bids.insert(
                    *bidder,
                    Bid::committed(
                        *bidder,
                        *commitment,
                        encrypted_payload.clone(),
                        commit_index,
                        *timestamp,
                    ),
                );
                self.commit_order.push(*bidder);
            }

            AuctionEvent::BidRevealed {
                bidder,
                price,
                quantity,
            } => {
                if let Some(bid) = self.bids.get_mut(bidder) {
                    bid.revealed = true;
                    bid.price = *price;
                    bid.quantity = *quantity;
                }
                self.clock.advance(AuctionPhase::Reveal);
            }

            AuctionEvent::AuctionFinalized {
                clearing_price,
                total_allocated_quantity,
                timestamp,
                allocations,
                ..
            } => {
                for (bidder, allocation) in allocations {
                    if let Some(bid) = self.bids.get_mut(bidder) {
                        bid.allocation = *allocation;
                    }
                }
                self.result = Some(ClearingResult {
                    clearing_price: *clearing_price,
                    total_allocated_quantity: *total_allocated_quantity,
                    finalized_at: *timestamp,
                });
                self.clock.advance(AuctionPhase::Finalized);
            }

            AuctionEvent::TokensClaimed { bidder, .. } => {
                if let Some(bid) = self.bids.get_mut(bidder) {
                    bid.claimed = true;
                }
            }
        }
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuctionParams;
    use auction_types::CommitmentHash;

    fn state() -> AuctionState {
        let config = AuctionParams::default()
            .into_config(1, [9u8; 32], 0)
            .unwrap();
        AuctionState::new(config)
    }

    fn committed(bidder: Address) -> AuctionEvent {
        AuctionEvent::BidCommitted {
            bidder,
            commitment: CommitmentHash([bidder[0]; 32]),
            encrypted_payload: vec![1],
            timestamp: 10,
        }
    }

    #[test]
    fn test_commit_order_is_recorded() {
        let mut state = state();
        state.apply(committed([3u8; 32]));
        state.apply(committed([1u8; 32]));

        assert_eq!(state.num_bids(), 2);
        assert_eq!(state.get_bid(&[3u8; 32]).unwrap().commit_index, 0);
        assert_eq!(state.get_bid(&[1u8; 32]).unwrap().commit_index, 1);
        assert!(state.has_commitment(&[1u8; 32]));
        assert!(!state.has_commitment(&[2u8; 32]));
    }

    #[test]
    fn test_only_revealed_bids_reach_clearing() {
        let mut state = state();
        state.apply(committed([1u8; 32]));
        state.apply(committed([2u8; 32]));
        state.apply(AuctionEvent::BidRevealed {
            bidder: [2u8; 32],
            price: 50,
            quantity: 5,
        });

        let revealed = state.revealed_bids();
        assert_eq!(revealed.len(), 1);
        assert_eq!(revealed[0].bidder, [2u8; 32]);
        assert_eq!(revealed[0].commit_index, 1);
        assert_eq!(state.phase(), AuctionPhase::Reveal);
    }

    #[test]
    fn test_events_from_cursor() {
        let mut state = state();
        state.apply(committed([1u8; 32]));
        state.apply(committed([2u8; 32]));

        assert_eq!(state.events_from(0).len(), 2);
        assert_eq!(state.events_from(1).len(), 1);
        assert!(state.events_from(5).is_empty());
    }
}
