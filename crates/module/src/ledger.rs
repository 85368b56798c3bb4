//! Boundary to the external asset ledger.
//!
//! The engine never moves assets itself. On claim it hands the ledger one
//! [`Settlement`] instruction covering both legs:
//! - `payment` units of the payment asset from the bidder to the organizer
//! - `quantity` units of the auctioned asset from the auction reserve to the bidder
//!
//! A ledger must apply both legs or neither. `(auction_id, bidder)` identifies
//! a settlement; re-submitting one that already went through must not move
//! assets a second time.

use auction_types::Address;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors surfaced by a settlement ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Insufficient funds: need {required}, have {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("Insufficient reserve: need {required}, have {available}")]
    InsufficientReserve { required: u64, available: u64 },

    #[error("Transfer rejected: {0}")]
    Rejected(String),
}

/// A two-legged settlement instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub auction_id: u64,
    pub bidder: Address,
    pub organizer: Address,
    pub payment: u64,
    pub quantity: u64,
}

/// External ledger that executes settlements atomically.
pub trait SettlementLedger: Send + Sync {
    fn settle(&self, settlement: &Settlement) -> Result<(), LedgerError>;
}

/// Balances held by the in-memory ledger.
#[derive(Debug, Default)]
struct Balances {
    /// Payment asset balances
    payment: HashMap<Address, u64>,
    /// Auctioned asset balances
    asset: HashMap<Address, u64>,
    /// Auctioned asset held in reserve per auction
    reserves: HashMap<u64, u64>,
    /// Settlements already executed
    settled: HashSet<(u64, Address)>,
}

/// Simple in-memory ledger for hosts and tests.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    balances: Mutex<Balances>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit payment asset to an account.
    pub fn mint_payment(&self, account: Address, amount: u64) {
        let mut balances = self.balances.lock();
        let balance = balances.payment.entry(account).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Deposit auctioned asset into an auction's reserve.
    pub fn fund_reserve(&self, auction_id: u64, amount: u64) {
        let mut balances = self.balances.lock();
        let reserve = balances.reserves.entry(auction_id).or_insert(0);
        *reserve = reserve.saturating_add(amount);
    }

    pub fn payment_balance(&self, account: &Address) -> u64 {
        self.balances.lock().payment.get(account).copied().unwrap_or(0)
    }

    pub fn asset_balance(&self, account: &Address) -> u64 {
        self.balances.lock().asset.get(account).copied().unwrap_or(0)
    }

    pub fn reserve(&self, auction_id: u64) -> u64 {
        self.balances
            .lock()
            .reserves
            .get(&auction_id)
            .copied()
            .unwrap_or(0)
    }
}

impl SettlementLedger for InMemoryLedger {
    fn settle(&self, s: &Settlement) -> Result<(), LedgerError> {
        let mut balances = self.balances.lock();

        if balances.settled.contains(&(s.auction_id, s.bidder)) {
            return Ok(());
        }

        let available = balances.payment.get(&s.bidder).copied().unwrap_or(0);
        if available < s.payment {
            return Err(LedgerError::InsufficientFunds {
                required: s.payment,
                available,
            });
        }
        let reserve = balances.reserves.get(&s.auction_id).copied().unwrap_or(0);
        if reserve < s.quantity {
            return Err(LedgerError::InsufficientReserve {
                required: s.quantity,
                available: reserve,
            });
        }

        // Organizer balance as seen after the bidder debit.
        let organizer_base = if s.organizer == s.bidder {
            available - s.payment
        } else {
            balances.payment.get(&s.organizer).copied().unwrap_or(0)
        };
        let organizer_balance = organizer_base
            .checked_add(s.payment)
            .ok_or_else(|| LedgerError::Rejected("balance overflow".to_string()))?;
        let asset_balance = balances
            .asset
            .get(&s.bidder)
            .copied()
            .unwrap_or(0)
            .checked_add(s.quantity)
            .ok_or_else(|| LedgerError::Rejected("balance overflow".to_string()))?;

        // Both legs checked; apply under the same lock.
        balances.payment.insert(s.bidder, available - s.payment);
        balances.payment.insert(s.organizer, organizer_balance);
        balances.reserves.insert(s.auction_id, reserve - s.quantity);
        balances.asset.insert(s.bidder, asset_balance);
        balances.settled.insert((s.auction_id, s.bidder));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settlement(payment: u64, quantity: u64) -> Settlement {
        Settlement {
            auction_id: 1,
            bidder: [2u8; 32],
            organizer: [9u8; 32],
            payment,
            quantity,
        }
    }

    #[test]
    fn test_settle_moves_both_legs() {
        let ledger = InMemoryLedger::new();
        ledger.mint_payment([2u8; 32], 1000);
        ledger.fund_reserve(1, 50);

        ledger.settle(&settlement(900, 10)).unwrap();

        assert_eq!(ledger.payment_balance(&[2u8; 32]), 100);
        assert_eq!(ledger.payment_balance(&[9u8; 32]), 900);
        assert_eq!(ledger.asset_balance(&[2u8; 32]), 10);
        assert_eq!(ledger.reserve(1), 40);
    }

    #[test]
    fn test_resubmitted_settlement_is_not_repeated() {
        let ledger = InMemoryLedger::new();
        ledger.mint_payment([2u8; 32], 2000);
        ledger.fund_reserve(1, 50);

        ledger.settle(&settlement(900, 10)).unwrap();
        ledger.settle(&settlement(900, 10)).unwrap();

        assert_eq!(ledger.payment_balance(&[2u8; 32]), 1100);
        assert_eq!(ledger.asset_balance(&[2u8; 32]), 10);
    }

    #[test]
    fn test_insufficient_funds_moves_nothing() {
        let ledger = InMemoryLedger::new();
        ledger.mint_payment([2u8; 32], 100);
        ledger.fund_reserve(1, 50);

        let result = ledger.settle(&settlement(900, 10));
        assert_eq!(
            result,
            Err(LedgerError::InsufficientFunds {
                required: 900,
                available: 100
            })
        );
        assert_eq!(ledger.payment_balance(&[2u8; 32]), 100);
        assert_eq!(ledger.reserve(1), 50);
        assert_eq!(ledger.asset_balance(&[2u8; 32]), 0);
    }

    #[test]
    fn test_insufficient_reserve_moves_nothing() {
        let ledger = InMemoryLedger::new();
        ledger.mint_payment([2u8; 32], 1000);
        ledger.fund_reserve(1, 5);

        assert!(matches!(
            ledger.settle(&settlement(900, 10)),
            Err(LedgerError::InsufficientReserve { .. })
        ));
        assert_eq!(ledger.payment_balance(&[2u8; 32]), 1000);
        assert_eq!(ledger.payment_balance(&[9u8; 32]), 0);
    }

    #[test]
    fn test_credit_overflow_moves_nothing() {
        let ledger = InMemoryLedger::new();
        ledger.mint_payment([2u8; 32], 1000);
        ledger.mint_payment([9u8; 32], u64::MAX);
        ledger.fund_reserve(1, 50);

        assert_eq!(
            ledger.settle(&settlement(10, 10)),
            Err(LedgerError::Rejected("balance overflow".to_string()))
        );
        assert_eq!(ledger.payment_balance(&[2u8; 32]), 1000);
        assert_eq!(ledger.payment_balance(&[9u8; 32]), u64::MAX);
        assert_eq!(ledger.asset_balance(&[2u8; 32]), 0);
        assert_eq!(ledger.reserve(1), 50);

        // Not recorded as settled, so a later attempt can still go through
        let other = Settlement {
            organizer: [8u8; 32],
            ..settlement(10, 10)
        };
        ledger.settle(&other).unwrap();
        assert_eq!(ledger.payment_balance(&[8u8; 32]), 10);
    }

    #[test]
    fn test_organizer_bidding_in_own_auction() {
        let ledger = InMemoryLedger::new();
        ledger.mint_payment([2u8; 32], u64::MAX);
        ledger.fund_reserve(1, 50);

        let own = Settlement {
            organizer: [2u8; 32],
            ..settlement(900, 10)
        };
        ledger.settle(&own).unwrap();

        assert_eq!(ledger.payment_balance(&[2u8; 32]), u64::MAX);
        assert_eq!(ledger.asset_balance(&[2u8; 32]), 10);
        assert_eq!(ledger.reserve(1), 40);
    }
}
