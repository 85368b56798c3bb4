//! Sealed-bid uniform-price auction engine.
//!
//! This module implements the commit/reveal auction lifecycle:
//!
//! - Hashed bid commitments with opaque encrypted payloads
//! - Reveal verification against the stored commitment
//! - Uniform clearing price with pro-rata rationing at the margin
//! - Exactly-once claim settlement through an external ledger
//!
//! # Architecture
//!
//! - `phase`: Stored phase and deadline gates
//! - `state`: Per-auction bid store, clearing result and event log
//! - `handlers`: Checks for each call, producing events
//! - `call`: Call messages and dispatch (check, settle, journal, apply)
//! - `queries`: Read-only state access
//! - `config`: Construction parameters
//! - `ledger`: External settlement boundary
//! - `journal`: Write-ahead hook for hosts
//! - `engine`: Single-writer auction instance
//! - `registry`: Many independent instances
//! - `error`: Error types
//!
//! # Example
//!
//! ```ignore
//! use auction_module::{AuctionParams, AuctionRegistry, CallContext, InMemoryLedger, NoopJournal};
//!
//! let registry = AuctionRegistry::new(Arc::new(InMemoryLedger::new()), Arc::new(NoopJournal));
//! let ctx = CallContext { sender: organizer, timestamp: now };
//!
//! // Create an auction
//! let auction_id = registry.create_auction(&ctx, AuctionParams::default())?;
//!
//! // Commit a sealed bid
//! registry.get(auction_id)?.commit_bid(&bidder_ctx, commitment, payload)?;
//! ```

pub mod call;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod journal;
pub mod ledger;
pub mod phase;
pub mod queries;
pub mod registry;
pub mod state;

pub use call::{dispatch_call, AuctionCall};
pub use config::{AuctionParams, ParamsError};
pub use engine::Auction;
pub use error::AuctionError;
pub use handlers::{CallContext, HandlerResult};
pub use journal::{Journal, JournalEntry, JournalError, MemoryJournal, NoopJournal};
pub use ledger::{InMemoryLedger, LedgerError, Settlement, SettlementLedger};
pub use phase::{PhaseClock, Window};
pub use queries::{AuctionQuery, AuctionQueryResponse, AuctionSummary};
pub use registry::AuctionRegistry;
pub use state::AuctionState;
