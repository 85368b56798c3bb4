//! Notifications emitted by successful auction operations.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{Address, CommitmentHash};

/// Event emitted after a state-changing operation is accepted.
///
/// Events form an ordered log per auction. External components (for example
/// the organizer's decryption service) consume `BidCommitted` from this log.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum AuctionEvent {
    BidCommitted {
        bidder: Address,
        commitment: CommitmentHash,
        encrypted_payload: Vec<u8>,
        timestamp: u64,
    },

    BidRevealed {
        bidder: Address,
        price: u64,
        quantity: u64,
    },

    AuctionFinalized {
        clearing_price: u64,
        total_allocated_quantity: u64,
        /// Demand at or above the clearing price exceeded supply
        oversubscribed: bool,
        timestamp: u64,
        /// Non-zero allocations, in clearing order
        allocations: Vec<(Address, u64)>,
    },

    TokensClaimed {
        bidder: Address,
        allocation: u64,
        payment: u64,
    },
}

impl AuctionEvent {
    /// Short name used in logs and RPC responses.
    pub fn name(&self) -> &'static str {
        match self {
            AuctionEvent::BidCommitted { .. } => "BidCommitted",
            AuctionEvent::BidRevealed { .. } => "BidRevealed",
            AuctionEvent::AuctionFinalized { .. } => "AuctionFinalized",
            AuctionEvent::TokensClaimed { .. } => "TokensClaimed",
        }
    }

    /// The bidder this event concerns, if any.
    pub fn bidder(&self) -> Option<&Address> {
        match self {
            AuctionEvent::BidCommitted { bidder, .. }
            | AuctionEvent::BidRevealed { bidder, .. }
            | AuctionEvent::TokensClaimed { bidder, .. } => Some(bidder),
            AuctionEvent::AuctionFinalized { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let event = AuctionEvent::BidRevealed {
            bidder: [1u8; 32],
            price: 90,
            quantity: 10,
        };
        assert_eq!(event.name(), "BidRevealed");
        assert_eq!(event.bidder(), Some(&[1u8; 32]));

        let event = AuctionEvent::AuctionFinalized {
            clearing_price: 90,
            total_allocated_quantity: 10,
            oversubscribed: false,
            timestamp: 0,
            allocations: vec![],
        };
        assert!(event.bidder().is_none());
    }
}
