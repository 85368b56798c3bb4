//! Registry of independent auction instances.

use auction_types::AuctionEvent;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::call::AuctionCall;
use crate::config::AuctionParams;
use crate::engine::Auction;
use crate::error::AuctionError;
use crate::handlers::{CallContext, HandlerResult};
use crate::journal::{Journal, JournalEntry};
use crate::ledger::SettlementLedger;
use crate::state::AuctionState;

#[derive(Default)]
struct Inner {
    /// Next auction ID to assign
    next_auction_id: u64,
    /// All auctions by ID
    auctions: HashMap<u64, Arc<Auction>>,
}

/// Holds every auction a host runs.
///
/// The registry lock only guards the id map; each auction serializes its
/// own calls, so different auctions run concurrently.
pub struct AuctionRegistry {
    inner: RwLock<Inner>,
    ledger: Arc<dyn SettlementLedger>,
    journal: Arc<dyn Journal>,
}

impl AuctionRegistry {
    pub fn new(ledger: Arc<dyn SettlementLedger>, journal: Arc<dyn Journal>) -> Self {
        Self {
            inner: RwLock::new(Inner {
                next_auction_id: 1,
                auctions: HashMap::new(),
            }),
            ledger,
            journal,
        }
    }

    /// Create an auction organized by `ctx.sender`, opening its commit window at `ctx.timestamp`.
    pub fn create_auction(&self, ctx: &CallContext, params: AuctionParams) -> HandlerResult<u64> {
        let mut inner = self.inner.write();
        let auction_id = inner.next_auction_id;
        let config = params.into_config(auction_id, ctx.sender, ctx.timestamp)?;

        self.journal.append(&JournalEntry::Created {
            config: config.clone(),
        })?;

        info!(
            auction_id,
            total_supply = config.total_supply,
            commit_deadline = config.commit_deadline,
            reveal_deadline = config.reveal_deadline,
            "Auction created"
        );

        inner.next_auction_id += 1;
        inner
            .auctions
            .insert(auction_id, Arc::new(self.instance(AuctionState::new(config))));

        Ok(auction_id)
    }

    /// Get an auction by ID.
    pub fn get(&self, auction_id: u64) -> HandlerResult<Arc<Auction>> {
        self.inner
            .read()
            .auctions
            .get(&auction_id)
            .cloned()
            .ok_or(AuctionError::AuctionNotFound(auction_id))
    }

    /// All auctions, ordered by ID.
    pub fn list(&self) -> Vec<Arc<Auction>> {
        let mut auctions: Vec<Arc<Auction>> =
            self.inner.read().auctions.values().cloned().collect();
        auctions.sort_by_key(|a| a.id());
        auctions
    }

    /// Execute a call against one auction.
    ///
    /// The registry lock is released before the call runs.
    pub fn execute(
        &self,
        auction_id: u64,
        ctx: &CallContext,
        call: AuctionCall,
    ) -> HandlerResult<AuctionEvent> {
        self.get(auction_id)?.execute(ctx, call)
    }

    /// Rebuild a registry from journal entries, in order.
    pub fn restore(
        entries: impl IntoIterator<Item = JournalEntry>,
        ledger: Arc<dyn SettlementLedger>,
        journal: Arc<dyn Journal>,
    ) -> HandlerResult<Self> {
        let registry = Self::new(ledger, journal);
        let mut replayed = 0usize;

        for entry in entries {
            match entry {
                JournalEntry::Created { config } => {
                    let mut inner = registry.inner.write();
                    let auction_id = config.auction_id;
                    inner.next_auction_id = inner.next_auction_id.max(auction_id + 1);
                    inner.auctions.insert(
                        auction_id,
                        Arc::new(registry.instance(AuctionState::new(config))),
                    );
                }
                JournalEntry::Applied { auction_id, event } => {
                    registry.get(auction_id)?.replay(event);
                }
            }
            replayed += 1;
        }

        info!(entries = replayed, "Registry restored from journal");
        Ok(registry)
    }

    fn instance(&self, state: AuctionState) -> Auction {
        Auction::new(state, self.ledger.clone(), self.journal.clone())
    }
}
