//! End-to-end integration tests for the sealed-bid auction.
//!
//! These tests exercise the full auction lifecycle:
//! 1. Auction creation through the registry
//! 2. Sealing and committing bids
//! 3. Revealing against stored commitments
//! 4. Uniform-price clearing with pro-rata rationing
//! 5. Claim settlement through the ledger

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use auction_client::{create_sealed_bid, SealedBid};
use auction_module::{
    AuctionCall, AuctionError, AuctionParams, AuctionRegistry, CallContext, InMemoryLedger,
    Journal, JournalEntry, JournalError, MemoryJournal, NoopJournal,
};
use auction_types::{compute_bid_commitment, Address, AuctionEvent, AuctionPhase, Salt};

use rand::rngs::OsRng;

const ORGANIZER: Address = [0xEEu8; 32];

// Commit [0, 1000), reveal [1000, 2000), claim until 3000
const COMMIT_AT: u64 = 10;
const REVEAL_AT: u64 = 1_500;
const FINALIZE_AT: u64 = 2_000;
const CLAIM_AT: u64 = 2_100;

struct Harness {
    registry: AuctionRegistry,
    ledger: Arc<InMemoryLedger>,
    auction_id: u64,
}

impl Harness {
    fn new(total_supply: u64, min_price: u64, max_price: u64) -> Self {
        Self::with_journal(total_supply, min_price, max_price, Arc::new(NoopJournal))
    }

    fn with_journal(
        total_supply: u64,
        min_price: u64,
        max_price: u64,
        journal: Arc<dyn Journal>,
    ) -> Self {
        let ledger = Arc::new(InMemoryLedger::new());
        let registry = AuctionRegistry::new(ledger.clone(), journal);
        let params = AuctionParams {
            total_supply,
            min_price,
            max_price,
            commit_duration_secs: 1_000,
            reveal_duration_secs: 1_000,
            claim_duration_secs: 1_000,
            ..Default::default()
        };
        let auction_id = registry
            .create_auction(&ctx(ORGANIZER, 0), params)
            .unwrap();
        ledger.fund_reserve(auction_id, total_supply);

        Self {
            registry,
            ledger,
            auction_id,
        }
    }

    fn commit(&self, bidder: Address, price: u64, quantity: u64) -> SealedBid {
        let sealed = create_sealed_bid(&bidder, price, quantity, vec![0xC1, 0xFE], &mut OsRng)
            .unwrap();
        self.execute(
            bidder,
            COMMIT_AT,
            AuctionCall::CommitBid {
                commitment: sealed.commitment,
                encrypted_payload: sealed.encrypted_payload.clone(),
            },
        )
        .unwrap();
        sealed
    }

    fn reveal(&self, bidder: Address, sealed: &SealedBid) -> Result<AuctionEvent, AuctionError> {
        self.execute(
            bidder,
            REVEAL_AT,
            AuctionCall::RevealBid {
                price: sealed.price,
                quantity: sealed.quantity,
                salt: sealed.salt,
            },
        )
    }

    /// Commit every bid, then reveal every bid.
    ///
    /// The first reveal closes the commit window, so all commits land first.
    fn commit_then_reveal_all(&self, bids: &[(Address, u64, u64)]) {
        let sealed: Vec<(Address, SealedBid)> = bids
            .iter()
            .map(|&(who, price, quantity)| (who, self.commit(who, price, quantity)))
            .collect();
        for (who, bid) in &sealed {
            self.reveal(*who, bid).unwrap();
        }
    }

    fn finalize(&self) -> Result<AuctionEvent, AuctionError> {
        self.execute(ORGANIZER, FINALIZE_AT, AuctionCall::Finalize)
    }

    fn claim(&self, bidder: Address) -> Result<AuctionEvent, AuctionError> {
        self.execute(bidder, CLAIM_AT, AuctionCall::ClaimTokens)
    }

    fn execute(
        &self,
        sender: Address,
        timestamp: u64,
        call: AuctionCall,
    ) -> Result<AuctionEvent, AuctionError> {
        self.registry
            .execute(self.auction_id, &ctx(sender, timestamp), call)
    }

    fn allocation(&self, bidder: &Address) -> u64 {
        self.registry
            .get(self.auction_id)
            .unwrap()
            .bid(bidder)
            .map(|b| b.allocation)
            .unwrap_or(0)
    }
}

fn ctx(sender: Address, timestamp: u64) -> CallContext {
    CallContext { sender, timestamp }
}

fn bidder(n: u8) -> Address {
    [n; 32]
}

fn salt_from(n: u64) -> Salt {
    let mut salt = [0u8; 32];
    salt[..8].copy_from_slice(&n.to_le_bytes());
    salt
}

/// Test under-subscribed clearing: everyone is filled at the lowest revealed price.
#[test]
fn test_scenario_a_undersubscribed() {
    let h = Harness::new(100_000, 85, 100);
    let (a, b) = (bidder(1), bidder(2));

    h.commit_then_reveal_all(&[(a, 95, 1_000), (b, 90, 2_000)]);
    assert!(matches!(
        h.finalize().unwrap(),
        AuctionEvent::AuctionFinalized { oversubscribed: false, .. }
    ));

    let auction = h.registry.get(h.auction_id).unwrap();
    assert_eq!(auction.clearing_price(), Some(90));
    assert_eq!(h.allocation(&a), 1_000);
    assert_eq!(h.allocation(&b), 2_000);

    h.ledger.mint_payment(a, 1_000_000);
    h.ledger.mint_payment(b, 1_000_000);

    assert!(matches!(
        h.claim(a).unwrap(),
        AuctionEvent::TokensClaimed { payment: 90_000, allocation: 1_000, .. }
    ));
    assert!(matches!(
        h.claim(b).unwrap(),
        AuctionEvent::TokensClaimed { payment: 180_000, allocation: 2_000, .. }
    ));

    assert_eq!(h.ledger.payment_balance(&ORGANIZER), 270_000);
    assert_eq!(h.ledger.asset_balance(&a), 1_000);
    assert_eq!(h.ledger.asset_balance(&b), 2_000);
    assert_eq!(h.ledger.reserve(h.auction_id), 97_000);
}

/// Test oversubscribed clearing with pro-rata rationing at the margin.
#[test]
fn test_scenario_b_oversubscribed_pro_rata() {
    let h = Harness::new(1_000, 1, 1_000);
    let (a, b, c) = (bidder(1), bidder(2), bidder(3));

    h.commit_then_reveal_all(&[(a, 100, 700), (b, 90, 600), (c, 90, 400)]);

    match h.finalize().unwrap() {
        AuctionEvent::AuctionFinalized {
            clearing_price,
            total_allocated_quantity,
            oversubscribed,
            ..
        } => {
            assert_eq!(clearing_price, 90);
            assert_eq!(total_allocated_quantity, 1_000);
            assert!(oversubscribed);
        }
        other => panic!("unexpected event: {:?}", other),
    }

    assert_eq!(h.allocation(&a), 700);
    assert_eq!(h.allocation(&b), 180);
    assert_eq!(h.allocation(&c), 120);
}

/// Test that a wrong salt fails and leaves the bid unrevealed.
#[test]
fn test_scenario_c_invalid_reveal() {
    let h = Harness::new(1_000, 1, 1_000);
    let a = bidder(1);

    let commitment = compute_bid_commitment(&a, 50, 10, &salt_from(42));
    h.execute(
        a,
        COMMIT_AT,
        AuctionCall::CommitBid {
            commitment,
            encrypted_payload: vec![1],
        },
    )
    .unwrap();

    let result = h.execute(
        a,
        REVEAL_AT,
        AuctionCall::RevealBid {
            price: 50,
            quantity: 10,
            salt: salt_from(99),
        },
    );
    assert_eq!(result, Err(AuctionError::InvalidCommitment));

    let auction = h.registry.get(h.auction_id).unwrap();
    assert!(!auction.bid(&a).unwrap().revealed);
    assert_eq!(auction.current_phase(), AuctionPhase::Commit);

    // The correct opening still works afterwards
    h.execute(
        a,
        REVEAL_AT,
        AuctionCall::RevealBid {
            price: 50,
            quantity: 10,
            salt: salt_from(42),
        },
    )
    .unwrap();
    assert!(auction.bid(&a).unwrap().revealed);
}

/// Test that commits after the deadline fail even though the phase still reads Commit.
#[test]
fn test_scenario_d_late_commit() {
    let h = Harness::new(1_000, 1, 1_000);
    h.commit(bidder(1), 50, 10);

    let auction = h.registry.get(h.auction_id).unwrap();
    let late = auction.commit_bid(
        &ctx(bidder(2), auction.commit_deadline()),
        compute_bid_commitment(&bidder(2), 50, 10, &salt_from(1)),
        vec![1],
    );

    assert!(matches!(late, Err(AuctionError::PhaseViolation(_))));
    assert_eq!(auction.current_phase(), AuctionPhase::Commit);
    assert!(auction.bid(&bidder(2)).is_none());
}

/// Test that the first reveal closes the commit window for everyone.
#[test]
fn test_commit_after_first_reveal_rejected() {
    let h = Harness::new(1_000, 1, 1_000);
    let (a, b) = (bidder(1), bidder(2));

    let sealed = h.commit(a, 50, 10);
    h.reveal(a, &sealed).unwrap();

    let auction = h.registry.get(h.auction_id).unwrap();
    assert_eq!(auction.current_phase(), AuctionPhase::Reveal);

    // Still inside the commit interval by the clock
    let late = auction.commit_bid(
        &ctx(b, COMMIT_AT),
        compute_bid_commitment(&b, 50, 10, &salt_from(3)),
        vec![1],
    );
    assert!(matches!(late, Err(AuctionError::PhaseViolation(_))));
    assert!(auction.bid(&b).is_none());
}

/// Test that any field differing from the committed one fails the reveal.
#[test]
fn test_reveal_requires_exact_opening() {
    let h = Harness::new(1_000, 1, 1_000);
    let a = bidder(1);
    let sealed = h.commit(a, 50, 10);

    let mut wrong_salt = sealed.salt;
    wrong_salt[31] ^= 1;

    let attempts = [(51, 10, sealed.salt), (50, 11, sealed.salt), (50, 10, wrong_salt)];
    for (price, quantity, salt) in attempts {
        let result = h.execute(
            a,
            REVEAL_AT,
            AuctionCall::RevealBid {
                price,
                quantity,
                salt,
            },
        );
        assert_eq!(result, Err(AuctionError::InvalidCommitment));
    }

    // A different caller cannot open someone else's commitment either
    let stolen = h.execute(
        bidder(2),
        REVEAL_AT,
        AuctionCall::RevealBid {
            price: 50,
            quantity: 10,
            salt: sealed.salt,
        },
    );
    assert_eq!(stolen, Err(AuctionError::NoCommitment));
}

/// Test the allocation invariants over a mixed set of bids.
#[test]
fn test_allocation_invariants() {
    let total_supply = 5_000;
    let h = Harness::new(total_supply, 10, 200);

    let bids: Vec<(Address, u64, u64)> = (1..=12u8)
        .map(|i| {
            let price = 10 + u64::from(i % 5) * 40;
            let quantity = 300 + u64::from(i) * 97;
            (bidder(i), price, quantity)
        })
        .collect();
    h.commit_then_reveal_all(&bids);

    h.finalize().unwrap();
    let auction = h.registry.get(h.auction_id).unwrap();
    let clearing_price = auction.clearing_price().unwrap();

    let mut total = 0u64;
    for (who, price, quantity) in &bids {
        let allocation = h.allocation(who);
        assert!(allocation <= *quantity);
        if *price > clearing_price {
            assert_eq!(allocation, *quantity, "above-margin bid must fill");
        }
        if *price < clearing_price {
            assert_eq!(allocation, 0, "below-margin bid must get nothing");
        }
        total += allocation;
    }
    assert!(total <= total_supply);
}

/// Test exactly-once claiming and claim preconditions.
#[test]
fn test_claim_exactly_once() {
    let h = Harness::new(1_000, 1, 1_000);
    let (a, loser) = (bidder(1), bidder(2));

    h.commit_then_reveal_all(&[(a, 100, 1_000), (loser, 50, 500)]);

    assert!(matches!(h.claim(a), Err(AuctionError::PhaseViolation(_))));

    h.finalize().unwrap();
    h.ledger.mint_payment(a, 200_000);

    h.claim(a).unwrap();
    assert_eq!(h.claim(a), Err(AuctionError::AlreadyClaimed));
    assert_eq!(h.claim(loser), Err(AuctionError::NoAllocation));
    assert_eq!(h.claim(bidder(7)), Err(AuctionError::NoCommitment));

    assert_eq!(h.ledger.payment_balance(&a), 100_000);
    assert_eq!(h.ledger.asset_balance(&a), 1_000);
}

/// Journal that refuses a configurable number of claim entries.
#[derive(Default)]
struct FlakyJournal {
    inner: MemoryJournal,
    claim_failures: AtomicUsize,
}

impl Journal for FlakyJournal {
    fn append(&self, entry: &JournalEntry) -> Result<(), JournalError> {
        if let JournalEntry::Applied {
            event: AuctionEvent::TokensClaimed { .. },
            ..
        } = entry
        {
            let remaining = self.claim_failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.claim_failures.store(remaining - 1, Ordering::SeqCst);
                return Err(JournalError::Write("disk full".to_string()));
            }
        }
        self.inner.append(entry)
    }
}

/// Test that a claim interrupted after settlement can be retried without paying twice.
#[test]
fn test_claim_retry_after_journal_failure() {
    let journal = Arc::new(FlakyJournal {
        claim_failures: AtomicUsize::new(1),
        ..Default::default()
    });
    let h = Harness::with_journal(1_000, 1, 1_000, journal.clone());
    let a = bidder(1);

    h.commit_then_reveal_all(&[(a, 100, 10)]);
    h.finalize().unwrap();
    h.ledger.mint_payment(a, 5_000);

    let first = h.claim(a);
    assert!(matches!(first, Err(AuctionError::Journal(_))));
    let auction = h.registry.get(h.auction_id).unwrap();
    assert!(!auction.bid(&a).unwrap().claimed);

    h.claim(a).unwrap();
    assert!(auction.bid(&a).unwrap().claimed);

    // Paid exactly once
    assert_eq!(h.ledger.payment_balance(&a), 4_000);
    assert_eq!(h.ledger.payment_balance(&ORGANIZER), 1_000);
    assert_eq!(h.ledger.asset_balance(&a), 10);
}

/// Test that a failed settlement leaves the claim retryable.
#[test]
fn test_failed_settlement_is_atomic() {
    let h = Harness::new(1_000, 1, 1_000);
    let a = bidder(1);

    h.commit_then_reveal_all(&[(a, 100, 10)]);
    h.finalize().unwrap();

    assert!(matches!(h.claim(a), Err(AuctionError::Ledger(_))));
    assert_eq!(h.ledger.reserve(h.auction_id), 1_000);
    assert_eq!(h.ledger.asset_balance(&a), 0);

    h.ledger.mint_payment(a, 1_000);
    h.claim(a).unwrap();
    assert_eq!(h.ledger.reserve(h.auction_id), 990);
}

/// Test rebuilding every auction from the journal.
#[test]
fn test_restore_replays_full_lifecycle() {
    let journal = Arc::new(MemoryJournal::new());
    let h = Harness::with_journal(1_000, 1, 1_000, journal.clone());
    let (a, b) = (bidder(1), bidder(2));

    h.commit_then_reveal_all(&[(a, 100, 700), (b, 90, 600)]);
    h.finalize().unwrap();
    h.ledger.mint_payment(a, 100_000);
    h.claim(a).unwrap();

    let restored = AuctionRegistry::restore(
        journal.entries().unwrap(),
        h.ledger.clone(),
        Arc::new(NoopJournal),
    )
    .unwrap();

    let original = h.registry.get(h.auction_id).unwrap();
    let rebuilt = restored.get(h.auction_id).unwrap();

    assert_eq!(rebuilt.current_phase(), AuctionPhase::Finalized);
    assert_eq!(rebuilt.clearing_price(), original.clearing_price());
    assert_eq!(rebuilt.bid(&a), original.bid(&a));
    assert_eq!(rebuilt.bid(&b), original.bid(&b));
    assert!(rebuilt.bid(&a).unwrap().claimed);

    let events = |auction: &auction_module::Auction| {
        auction.with_state(|s| s.events_from(0).to_vec())
    };
    assert_eq!(events(&rebuilt), events(&original));

    // The restored instance keeps enforcing exactly-once
    let again = rebuilt.claim_tokens(&ctx(a, CLAIM_AT));
    assert_eq!(again, Err(AuctionError::AlreadyClaimed));
}

/// Test that call messages survive borsh encoding and dispatch unchanged.
#[test]
fn test_encoded_calls() {
    let h = Harness::new(1_000, 1, 1_000);
    let a = bidder(1);
    let sealed = create_sealed_bid(&a, 10, 10, vec![9, 9], &mut OsRng).unwrap();

    let calls = [
        (
            COMMIT_AT,
            AuctionCall::CommitBid {
                commitment: sealed.commitment,
                encrypted_payload: sealed.encrypted_payload.clone(),
            },
        ),
        (
            REVEAL_AT,
            AuctionCall::RevealBid {
                price: 10,
                quantity: 10,
                salt: sealed.salt,
            },
        ),
    ];

    for (timestamp, call) in calls {
        let bytes = borsh::to_vec(&call).unwrap();
        let decoded: AuctionCall = borsh::from_slice(&bytes).unwrap();
        h.execute(a, timestamp, decoded).unwrap();
    }

    assert!(h.registry.get(h.auction_id).unwrap().bid(&a).unwrap().revealed);
}

/// Test that concurrent commits to one auction are serialized.
#[test]
fn test_concurrent_commits_are_ordered() {
    let h = Arc::new(Harness::new(1_000, 1, 1_000));

    let handles: Vec<_> = (1..=16u8)
        .map(|i| {
            let h = h.clone();
            thread::spawn(move || {
                h.commit(bidder(i), 10, 1);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let auction = h.registry.get(h.auction_id).unwrap();
    let mut indices: Vec<u64> = (1..=16u8)
        .map(|i| auction.bid(&bidder(i)).unwrap().commit_index)
        .collect();
    indices.sort_unstable();
    assert_eq!(indices, (0..16).collect::<Vec<u64>>());
}

/// Test that auctions in one registry are independent.
#[test]
fn test_independent_auctions() {
    let ledger = Arc::new(InMemoryLedger::new());
    let registry = AuctionRegistry::new(ledger, Arc::new(NoopJournal));

    let params = AuctionParams {
        total_supply: 100,
        ..Default::default()
    };
    let first = registry.create_auction(&ctx(ORGANIZER, 0), params.clone()).unwrap();
    let second = registry.create_auction(&ctx(ORGANIZER, 5_000), params).unwrap();

    let a = bidder(1);
    let commitment = compute_bid_commitment(&a, 5, 5, &salt_from(7));
    registry
        .get(first)
        .unwrap()
        .commit_bid(&ctx(a, 10), commitment, vec![1])
        .unwrap();

    // Same bidder and commitment is fine in another auction
    registry
        .get(second)
        .unwrap()
        .commit_bid(&ctx(a, 5_010), commitment, vec![1])
        .unwrap();

    assert_eq!(
        registry.get(first).unwrap().commit_bid(&ctx(a, 20), commitment, vec![1]),
        Err(AuctionError::DuplicateBid)
    );
    assert_eq!(registry.list().len(), 2);
}
