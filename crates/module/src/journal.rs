//! Write-ahead journal hook.
//!
//! The engine keeps no durable state of its own. A host that needs crash
//! safety supplies a [`Journal`]; every accepted change is appended to it
//! before being applied in memory, and a failed append aborts the operation
//! with nothing applied. Replaying the entries in order rebuilds the same
//! state (see [`crate::registry::AuctionRegistry::restore`]).

use auction_types::{AuctionConfig, AuctionEvent};
use borsh::{BorshDeserialize, BorshSerialize};
use parking_lot::Mutex;
use thiserror::Error;

/// One journaled state change.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum JournalEntry {
    /// A new auction instance
    Created { config: AuctionConfig },
    /// An accepted operation on an existing instance
    Applied { auction_id: u64, event: AuctionEvent },
}

/// Errors from a journal backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JournalError {
    #[error("Write failed: {0}")]
    Write(String),

    #[error("Corrupt entry at {index}: {reason}")]
    Corrupt { index: usize, reason: String },
}

/// Durable, ordered sink for journal entries.
pub trait Journal: Send + Sync {
    fn append(&self, entry: &JournalEntry) -> Result<(), JournalError>;
}

/// Journal that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopJournal;

impl Journal for NoopJournal {
    fn append(&self, _entry: &JournalEntry) -> Result<(), JournalError> {
        Ok(())
    }
}

/// In-memory journal holding borsh-encoded records.
#[derive(Debug, Default)]
pub struct MemoryJournal {
    records: Mutex<Vec<Vec<u8>>>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Decode every record in append order.
    pub fn entries(&self) -> Result<Vec<JournalEntry>, JournalError> {
        self.records
            .lock()
            .iter()
            .enumerate()
            .map(|(index, bytes)| {
                borsh::from_slice(bytes).map_err(|e| JournalError::Corrupt {
                    index,
                    reason: e.to_string(),
                })
            })
            .collect()
    }
}

impl Journal for MemoryJournal {
    fn append(&self, entry: &JournalEntry) -> Result<(), JournalError> {
        let bytes = borsh::to_vec(entry).map_err(|e| JournalError::Write(e.to_string()))?;
        self.records.lock().push(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_journal_preserves_order() {
        let journal = MemoryJournal::new();
        assert!(journal.is_empty());

        let first = JournalEntry::Applied {
            auction_id: 1,
            event: AuctionEvent::BidRevealed {
                bidder: [1u8; 32],
                price: 90,
                quantity: 10,
            },
        };
        let second = JournalEntry::Applied {
            auction_id: 1,
            event: AuctionEvent::TokensClaimed {
                bidder: [1u8; 32],
                allocation: 10,
                payment: 900,
            },
        };
        journal.append(&first).unwrap();
        journal.append(&second).unwrap();

        assert_eq!(journal.len(), 2);
        assert_eq!(journal.entries().unwrap(), vec![first, second]);
    }
}
