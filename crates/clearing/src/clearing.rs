//! Uniform clearing-price determination.
//!
//! Every filled bid pays the same price:
//! - Bids are ranked by price (highest first), ties broken by commit order
//! - The clearing price is the price at which cumulative demand first covers supply
//! - Bids strictly above that price are filled in full
//! - Bids at that price share what is left pro rata, rounded down
//! - Bids below it receive nothing
//!
//! If demand never covers supply, the lowest revealed price clears and every
//! bid is filled in full.

use std::cmp::Reverse;

use auction_types::Address;

/// A revealed bid as seen by the clearing algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealedBid {
    pub bidder: Address,
    pub price: u64,
    pub quantity: u64,
    /// Arrival order of the original commitment; lower wins ties
    pub commit_index: u64,
}

/// Allocation computed for one revealed bid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidAllocation {
    pub bidder: Address,
    pub price: u64,
    pub quantity: u64,
    pub allocation: u64,
}

/// Result of clearing a set of revealed bids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearingOutcome {
    /// Price paid per unit by every filled bid
    pub clearing_price: u64,
    /// Sum of all allocations, never above supply
    pub total_allocated: u64,
    /// Whether demand reached supply (and the margin was rationed)
    pub oversubscribed: bool,
    /// One entry per input bid, in clearing order
    pub allocations: Vec<BidAllocation>,
}

impl ClearingOutcome {
    /// Look up the allocation for a bidder.
    pub fn allocation_of(&self, bidder: &Address) -> Option<u64> {
        self.allocations
            .iter()
            .find(|a| &a.bidder == bidder)
            .map(|a| a.allocation)
    }
}

/// Sort bids into clearing order: price descending, then commit order.
pub fn sort_for_clearing(bids: &[RevealedBid]) -> Vec<RevealedBid> {
    let mut sorted = bids.to_vec();
    sorted.sort_by_key(|b| (Reverse(b.price), b.commit_index));
    sorted
}

/// Find the price at which cumulative demand first reaches `total_supply`.
///
/// `sorted` must already be in clearing order. Returns `None` when demand
/// never reaches supply.
pub fn find_marginal_price(sorted: &[RevealedBid], total_supply: u64) -> Option<u64> {
    let supply = u128::from(total_supply);
    let mut cumulative: u128 = 0;
    for bid in sorted {
        cumulative += u128::from(bid.quantity);
        if cumulative >= supply {
            return Some(bid.price);
        }
    }
    None
}

/// Compute the clearing price and per-bid allocations.
///
/// Returns `None` if there are no bids to clear.
pub fn compute_clearing(bids: &[RevealedBid], total_supply: u64) -> Option<ClearingOutcome> {
    let sorted = sort_for_clearing(bids);
    let lowest_price = sorted.last()?.price;

    let Some(clearing_price) = find_marginal_price(&sorted, total_supply) else {
        // Under-subscribed: everyone is filled at the lowest revealed price.
        let allocations: Vec<BidAllocation> = sorted
            .iter()
            .map(|b| BidAllocation {
                bidder: b.bidder,
                price: b.price,
                quantity: b.quantity,
                allocation: b.quantity,
            })
            .collect();
        let total_allocated = allocations.iter().map(|a| a.allocation).sum();
        return Some(ClearingOutcome {
            clearing_price: lowest_price,
            total_allocated,
            oversubscribed: false,
            allocations,
        });
    };

    let above_margin: u128 = sorted
        .iter()
        .filter(|b| b.price > clearing_price)
        .map(|b| u128::from(b.quantity))
        .sum();
    let margin_total: u128 = sorted
        .iter()
        .filter(|b| b.price == clearing_price)
        .map(|b| u128::from(b.quantity))
        .sum();

    // Demand strictly above the margin is below supply, otherwise the margin
    // would have been found at a higher price.
    let remaining = u128::from(total_supply) - above_margin;

    let allocations: Vec<BidAllocation> = sorted
        .iter()
        .map(|b| {
            let allocation = if b.price > clearing_price {
                b.quantity
            } else if b.price == clearing_price {
                // remaining <= margin_total, so this never exceeds b.quantity
                (u128::from(b.quantity) * remaining / margin_total) as u64
            } else {
                0
            };
            BidAllocation {
                bidder: b.bidder,
                price: b.price,
                quantity: b.quantity,
                allocation,
            }
        })
        .collect();

    let total_allocated = allocations.iter().map(|a| a.allocation).sum();

    Some(ClearingOutcome {
        clearing_price,
        total_allocated,
        oversubscribed: true,
        allocations,
    })
}
