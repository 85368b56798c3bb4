//! Call handlers for the auction module.
//!
//! Each handler checks one operation against the current state and, if it is
//! admissible, returns the event describing its effect. Handlers never
//! mutate; [`crate::call::dispatch_call`] journals and applies the event.

use crate::error::AuctionError;
use crate::ledger::Settlement;
use crate::state::AuctionState;
use auction_clearing::{compute_clearing, verify_commitment_opening};
use auction_types::{Address, AuctionEvent, CommitmentHash, Salt};

/// Context provided by the host for each call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    /// Authenticated caller
    pub sender: Address,
    /// Clock reading taken at call time
    pub timestamp: u64,
}

/// Result type for handlers.
pub type HandlerResult<T> = Result<T, AuctionError>;

/// A checked claim: the ledger instruction plus the event to record once it succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimPlan {
    pub settlement: Settlement,
    pub event: AuctionEvent,
}

/// Handle CommitBid.
pub fn handle_commit_bid(
    state: &AuctionState,
    ctx: &CallContext,
    commitment: CommitmentHash,
    encrypted_payload: Vec<u8>,
) -> HandlerResult<AuctionEvent> {
    state.clock().check_commit(ctx.timestamp)?;

    if encrypted_payload.is_empty() {
        return Err(AuctionError::range("encrypted payload empty"));
    }
    if commitment.is_zero() {
        return Err(AuctionError::range("commitment hash is zero"));
    }
    if state.has_commitment(&ctx.sender) {
        return Err(AuctionError::DuplicateBid);
    }

    Ok(AuctionEvent::BidCommitted {
        bidder: ctx.sender,
        commitment,
        encrypted_payload,
        timestamp: ctx.timestamp,
    })
}

/// Handle RevealBid.
pub fn handle_reveal_bid(
    state: &AuctionState,
    ctx: &CallContext,
    price: u64,
    quantity: u64,
    salt: Salt,
) -> HandlerResult<AuctionEvent> {
    state.clock().check_reveal(ctx.timestamp)?;

    let bid = state
        .get_bid(&ctx.sender)
        .filter(|bid| !bid.commitment.is_zero())
        .ok_or(AuctionError::NoCommitment)?;

    if bid.revealed {
        return Err(AuctionError::AlreadyRevealed);
    }

    // One uniform failure for any wrong field
    if !verify_commitment_opening(&bid.commitment, &ctx.sender, price, quantity, &salt) {
        return Err(AuctionError::InvalidCommitment);
    }

    let config = state.config();
    if price < config.min_price || price > config.max_price {
        return Err(AuctionError::range(format!(
            "price {} outside [{}, {}]",
            price, config.min_price, config.max_price
        )));
    }
    if quantity == 0 || quantity > config.total_supply {
        return Err(AuctionError::range(format!(
            "quantity {} outside (0, {}]",
            quantity, config.total_supply
        )));
    }

    Ok(AuctionEvent::BidRevealed {
        bidder: ctx.sender,
        price,
        quantity,
    })
}

/// Handle Finalize.
///
/// Clears every revealed bid at a single price and records the allocations.
pub fn handle_finalize(state: &AuctionState, ctx: &CallContext) -> HandlerResult<AuctionEvent> {
    state.clock().check_finalize(ctx.timestamp)?;

    let revealed = state.revealed_bids();
    let outcome = compute_clearing(&revealed, state.config().total_supply)
        .ok_or_else(|| AuctionError::phase("no bids revealed"))?;

    let allocations = outcome
        .allocations
        .iter()
        .filter(|a| a.allocation > 0)
        .map(|a| (a.bidder, a.allocation))
        .collect();

    Ok(AuctionEvent::AuctionFinalized {
        clearing_price: outcome.clearing_price,
        total_allocated_quantity: outcome.total_allocated,
        oversubscribed: outcome.oversubscribed,
        timestamp: ctx.timestamp,
        allocations,
    })
}

/// Handle ClaimTokens.
///
/// Returns the settlement the external ledger must execute before the claim
/// is recorded.
pub fn handle_claim_tokens(state: &AuctionState, ctx: &CallContext) -> HandlerResult<ClaimPlan> {
    state.clock().check_claim()?;

    let result = state
        .result()
        .ok_or_else(|| AuctionError::phase("auction not finalized"))?;

    let bid = state
        .get_bid(&ctx.sender)
        .ok_or(AuctionError::NoCommitment)?;

    if bid.claimed {
        return Err(AuctionError::AlreadyClaimed);
    }
    if bid.allocation == 0 {
        return Err(AuctionError::NoAllocation);
    }

    let payment = compute_payment(
        bid.allocation,
        result.clearing_price,
        state.config().quantity_scale,
    )?;

    Ok(ClaimPlan {
        settlement: Settlement {
            auction_id: state.auction_id(),
            bidder: ctx.sender,
            organizer: state.config().organizer,
            payment,
            quantity: bid.allocation,
        },
        event: AuctionEvent::TokensClaimed {
            bidder: ctx.sender,
            allocation: bid.allocation,
            payment,
        },
    })
}

/// Payment owed for an allocation: `floor(allocation * price / quantity_scale)`.
pub fn compute_payment(allocation: u64, clearing_price: u64, quantity_scale: u64) -> HandlerResult<u64> {
    if quantity_scale == 0 {
        return Err(AuctionError::range("quantity scale is zero"));
    }
    let payment =
        u128::from(allocation) * u128::from(clearing_price) / u128::from(quantity_scale);
    u64::try_from(payment).map_err(|_| AuctionError::range("payment overflows u64"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuctionParams;
    use auction_types::{compute_bid_commitment, AuctionPhase};

    const ORGANIZER: Address = [9u8; 32];

    fn test_context(sender: Address, timestamp: u64) -> CallContext {
        CallContext { sender, timestamp }
    }

    // Commit window [0, 100), reveal [100, 200)
    fn setup_state() -> AuctionState {
        let params = AuctionParams {
            total_supply: 1000,
            min_price: 85,
            max_price: 100,
            commit_duration_secs: 100,
            reveal_duration_secs: 100,
            claim_duration_secs: 100,
            ..Default::default()
        };
        AuctionState::new(params.into_config(1, ORGANIZER, 0).unwrap())
    }

    fn commit(state: &mut AuctionState, bidder: Address, price: u64, quantity: u64, salt: Salt) {
        let commitment = compute_bid_commitment(&bidder, price, quantity, &salt);
        let event =
            handle_commit_bid(state, &test_context(bidder, 10), commitment, vec![0xAB]).unwrap();
        state.apply(event);
    }

    #[test]
    fn test_commit_bid_success() {
        let mut state = setup_state();
        commit(&mut state, [1u8; 32], 90, 10, [42u8; 32]);

        let bid = state.get_bid(&[1u8; 32]).unwrap();
        assert!(!bid.revealed);
        assert_eq!(bid.encrypted_payload, vec![0xAB]);
        assert_eq!(state.phase(), AuctionPhase::Commit);
    }

    #[test]
    fn test_commit_after_deadline() {
        let state = setup_state();
        let result = handle_commit_bid(
            &state,
            &test_context([1u8; 32], 100),
            CommitmentHash([1u8; 32]),
            vec![1],
        );
        assert!(matches!(result, Err(AuctionError::PhaseViolation(_))));
        assert_eq!(state.phase(), AuctionPhase::Commit);
    }

    #[test]
    fn test_commit_empty_payload() {
        let state = setup_state();
        let result = handle_commit_bid(
            &state,
            &test_context([1u8; 32], 10),
            CommitmentHash([1u8; 32]),
            vec![],
        );
        assert!(matches!(result, Err(AuctionError::RangeViolation(_))));
    }

    #[test]
    fn test_commit_zero_hash() {
        let state = setup_state();
        let result = handle_commit_bid(
            &state,
            &test_context([1u8; 32], 10),
            CommitmentHash::ZERO,
            vec![1],
        );
        assert!(matches!(result, Err(AuctionError::RangeViolation(_))));
    }

    #[test]
    fn test_duplicate_commit() {
        let mut state = setup_state();
        commit(&mut state, [1u8; 32], 90, 10, [42u8; 32]);

        let result = handle_commit_bid(
            &state,
            &test_context([1u8; 32], 20),
            CommitmentHash([5u8; 32]),
            vec![1],
        );
        assert_eq!(result, Err(AuctionError::DuplicateBid));
    }

    #[test]
    fn test_reveal_wrong_salt() {
        let mut state = setup_state();
        commit(&mut state, [1u8; 32], 90, 10, [42u8; 32]);

        let result = handle_reveal_bid(&state, &test_context([1u8; 32], 150), 90, 10, [99u8; 32]);
        assert_eq!(result, Err(AuctionError::InvalidCommitment));
        assert!(!state.get_bid(&[1u8; 32]).unwrap().revealed);
    }

    #[test]
    fn test_reveal_before_commit_deadline() {
        let mut state = setup_state();
        commit(&mut state, [1u8; 32], 90, 10, [42u8; 32]);

        let result = handle_reveal_bid(&state, &test_context([1u8; 32], 99), 90, 10, [42u8; 32]);
        assert!(matches!(result, Err(AuctionError::PhaseViolation(_))));
    }

    #[test]
    fn test_reveal_without_commitment() {
        let state = setup_state();
        let result = handle_reveal_bid(&state, &test_context([1u8; 32], 150), 90, 10, [42u8; 32]);
        assert_eq!(result, Err(AuctionError::NoCommitment));
    }

    #[test]
    fn test_reveal_out_of_range_price() {
        let mut state = setup_state();
        commit(&mut state, [1u8; 32], 101, 10, [42u8; 32]);
        commit(&mut state, [2u8; 32], 84, 10, [42u8; 32]);

        let high = handle_reveal_bid(&state, &test_context([1u8; 32], 150), 101, 10, [42u8; 32]);
        let low = handle_reveal_bid(&state, &test_context([2u8; 32], 150), 84, 10, [42u8; 32]);
        assert!(matches!(high, Err(AuctionError::RangeViolation(_))));
        assert!(matches!(low, Err(AuctionError::RangeViolation(_))));
    }

    #[test]
    fn test_reveal_out_of_range_quantity() {
        let mut state = setup_state();
        commit(&mut state, [1u8; 32], 90, 0, [42u8; 32]);
        commit(&mut state, [2u8; 32], 90, 1001, [42u8; 32]);

        let zero = handle_reveal_bid(&state, &test_context([1u8; 32], 150), 90, 0, [42u8; 32]);
        let over = handle_reveal_bid(&state, &test_context([2u8; 32], 150), 90, 1001, [42u8; 32]);
        assert!(matches!(zero, Err(AuctionError::RangeViolation(_))));
        assert!(matches!(over, Err(AuctionError::RangeViolation(_))));
    }

    #[test]
    fn test_reveal_twice() {
        let mut state = setup_state();
        commit(&mut state, [1u8; 32], 90, 10, [42u8; 32]);

        let ctx = test_context([1u8; 32], 150);
        let event = handle_reveal_bid(&state, &ctx, 90, 10, [42u8; 32]).unwrap();
        state.apply(event);
        assert_eq!(state.phase(), AuctionPhase::Reveal);

        let again = handle_reveal_bid(&state, &ctx, 90, 10, [42u8; 32]);
        assert_eq!(again, Err(AuctionError::AlreadyRevealed));
    }

    #[test]
    fn test_finalize_without_reveals() {
        let mut state = setup_state();
        commit(&mut state, [1u8; 32], 90, 10, [42u8; 32]);

        let result = handle_finalize(&state, &test_context([9u8; 32], 500));
        assert!(matches!(result, Err(AuctionError::PhaseViolation(_))));
    }

    #[test]
    fn test_claim_before_finalize() {
        let mut state = setup_state();
        commit(&mut state, [1u8; 32], 90, 10, [42u8; 32]);

        let result = handle_claim_tokens(&state, &test_context([1u8; 32], 150));
        assert!(matches!(result, Err(AuctionError::PhaseViolation(_))));
    }

    #[test]
    fn test_claim_plan_after_finalize() {
        let mut state = setup_state();
        commit(&mut state, [1u8; 32], 95, 10, [1u8; 32]);
        commit(&mut state, [2u8; 32], 90, 20, [2u8; 32]);
        commit(&mut state, [3u8; 32], 90, 20, [3u8; 32]);

        for (id, price, qty) in [(1u8, 95, 10), (2, 90, 20)] {
            let event =
                handle_reveal_bid(&state, &test_context([id; 32], 150), price, qty, [id; 32])
                    .unwrap();
            state.apply(event);
        }

        let event = handle_finalize(&state, &test_context(ORGANIZER, 200)).unwrap();
        state.apply(event);
        assert_eq!(state.result().unwrap().clearing_price, 90);

        let plan = handle_claim_tokens(&state, &test_context([1u8; 32], 250)).unwrap();
        assert_eq!(plan.settlement.payment, 900);
        assert_eq!(plan.settlement.quantity, 10);
        assert_eq!(plan.settlement.organizer, ORGANIZER);

        // Committed but never revealed
        let unrevealed = handle_claim_tokens(&state, &test_context([3u8; 32], 250));
        assert_eq!(unrevealed, Err(AuctionError::NoAllocation));

        let stranger = handle_claim_tokens(&state, &test_context([7u8; 32], 250));
        assert_eq!(stranger, Err(AuctionError::NoCommitment));
    }

    #[test]
    fn test_compute_payment_scales() {
        assert_eq!(compute_payment(1000, 90, 1).unwrap(), 90_000);
        // 2.5 units at scale 1e6, price 40 per unit
        assert_eq!(compute_payment(2_500_000, 40, 1_000_000).unwrap(), 100);
        assert!(matches!(
            compute_payment(u64::MAX, u64::MAX, 1),
            Err(AuctionError::RangeViolation(_))
        ));
    }
}
