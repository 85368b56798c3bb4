//! Call message types for the auction module.

use auction_types::{AuctionEvent, CommitmentHash, Salt};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::handlers::{self, CallContext, HandlerResult};
use crate::journal::{Journal, JournalEntry};
use crate::ledger::SettlementLedger;
use crate::state::AuctionState;

/// Call messages for one auction instance.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum AuctionCall {
    /// Submit a sealed commitment with its encrypted payload.
    CommitBid {
        commitment: CommitmentHash,
        encrypted_payload: Vec<u8>,
    },

    /// Disclose the committed price and quantity.
    RevealBid {
        price: u64,
        quantity: u64,
        salt: Salt,
    },

    /// Compute the clearing price and allocations (anyone).
    Finalize,

    /// Pay for and receive an allocation.
    ClaimTokens,
}

impl AuctionCall {
    pub fn name(&self) -> &'static str {
        match self {
            AuctionCall::CommitBid { .. } => "commit_bid",
            AuctionCall::RevealBid { .. } => "reveal_bid",
            AuctionCall::Finalize => "finalize",
            AuctionCall::ClaimTokens => "claim_tokens",
        }
    }
}

/// Run one call to completion or reject it with no effect.
///
/// Order of effects:
/// 1. handler checks the call against current state
/// 2. for claims, the external ledger settles both legs
/// 3. the resulting event is appended to the journal
/// 4. the event is applied to `state`
pub fn dispatch_call(
    state: &mut AuctionState,
    ctx: &CallContext,
    call: AuctionCall,
    ledger: &dyn SettlementLedger,
    journal: &dyn Journal,
) -> HandlerResult<AuctionEvent> {
    let event = match call {
        AuctionCall::CommitBid {
            commitment,
            encrypted_payload,
        } => handlers::handle_commit_bid(state, ctx, commitment, encrypted_payload)?,

        AuctionCall::RevealBid {
            price,
            quantity,
            salt,
        } => handlers::handle_reveal_bid(state, ctx, price, quantity, salt)?,

        AuctionCall::Finalize => handlers::handle_finalize(state, ctx)?,

        AuctionCall::ClaimTokens => {
            let plan = handlers::handle_claim_tokens(state, ctx)?;
            ledger.settle(&plan.settlement)?;
            plan.event
        }
    };

    journal.append(&JournalEntry::Applied {
        auction_id: state.auction_id(),
        event: event.clone(),
    })?;

    state.apply(event.clone());
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuctionParams;
    use crate::error::AuctionError;
    use crate::journal::{JournalError, MemoryJournal, NoopJournal};
    use crate::ledger::InMemoryLedger;
    use auction_types::compute_bid_commitment;

    struct FailingJournal;

    impl Journal for FailingJournal {
        fn append(&self, _entry: &JournalEntry) -> Result<(), JournalError> {
            Err(JournalError::Write("disk full".into()))
        }
    }

    fn setup_state() -> AuctionState {
        let params = AuctionParams {
            total_supply: 100,
            min_price: 1,
            max_price: 1000,
            commit_duration_secs: 100,
            reveal_duration_secs: 100,
            claim_duration_secs: 100,
            ..Default::default()
        };
        AuctionState::new(params.into_config(1, [9u8; 32], 0).unwrap())
    }

    fn commit_call(bidder: &[u8; 32]) -> AuctionCall {
        AuctionCall::CommitBid {
            commitment: compute_bid_commitment(bidder, 10, 5, &[1u8; 32]),
            encrypted_payload: vec![7],
        }
    }

    #[test]
    fn test_dispatch_journals_then_applies() {
        let mut state = setup_state();
        let ledger = InMemoryLedger::new();
        let journal = MemoryJournal::new();
        let ctx = CallContext {
            sender: [1u8; 32],
            timestamp: 5,
        };

        let event = dispatch_call(&mut state, &ctx, commit_call(&[1u8; 32]), &ledger, &journal)
            .unwrap();

        assert_eq!(event.name(), "BidCommitted");
        assert_eq!(journal.len(), 1);
        assert!(state.has_commitment(&[1u8; 32]));
        assert_eq!(state.num_events(), 1);
    }

    #[test]
    fn test_journal_failure_leaves_state_untouched() {
        let mut state = setup_state();
        let ledger = InMemoryLedger::new();
        let ctx = CallContext {
            sender: [1u8; 32],
            timestamp: 5,
        };

        let result = dispatch_call(
            &mut state,
            &ctx,
            commit_call(&[1u8; 32]),
            &ledger,
            &FailingJournal,
        );

        assert!(matches!(result, Err(AuctionError::Journal(_))));
        assert!(!state.has_commitment(&[1u8; 32]));
        assert_eq!(state.num_events(), 0);
    }

    #[test]
    fn test_rejected_call_is_not_journaled() {
        let mut state = setup_state();
        let ledger = InMemoryLedger::new();
        let journal = MemoryJournal::new();
        let ctx = CallContext {
            sender: [1u8; 32],
            timestamp: 5,
        };

        let result = dispatch_call(&mut state, &ctx, AuctionCall::Finalize, &ledger, &journal);
        assert!(matches!(result, Err(AuctionError::PhaseViolation(_))));
        assert!(journal.is_empty());

        let result = dispatch_call(&mut state, &ctx, AuctionCall::ClaimTokens, &ledger, &NoopJournal);
        assert!(matches!(result, Err(AuctionError::PhaseViolation(_))));
    }

    #[test]
    fn test_call_borsh_encoding() {
        let call = AuctionCall::RevealBid {
            price: 10,
            quantity: 5,
            salt: [1u8; 32],
        };
        let bytes = borsh::to_vec(&call).unwrap();
        let decoded: AuctionCall = borsh::from_slice(&bytes).unwrap();
        assert_eq!(call, decoded);
        assert_eq!(decoded.name(), "reveal_bid");
    }
}
