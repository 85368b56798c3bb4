//! Auction phase clock.
//!
//! The stored phase only moves forward and only as a side effect of an
//! accepted operation: the first successful reveal moves Commit -> Reveal and
//! finalize moves Reveal -> Finalized. Elapsed time alone never changes it, so
//! an auction with no reveals keeps reporting `Commit` after its commit
//! deadline. Whether an operation may run right now is decided by the
//! `check_*` gates, which compare the caller's timestamp against deadlines.

use auction_types::{AuctionConfig, AuctionPhase};
use serde::{Deserialize, Serialize};

use crate::error::AuctionError;

/// Time-based view of which window is open at a given instant.
///
/// Informational only; it never feeds back into the stored phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Window {
    /// Before the commit deadline
    Commit,
    /// Between the commit and reveal deadlines
    Reveal,
    /// Reveal closed, finalize not yet called
    AwaitingFinalize,
    /// Finalized and before the claim deadline
    Claim,
    /// Past the claim deadline
    Closed,
}

/// Stored phase plus the deadlines that gate each operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseClock {
    phase: AuctionPhase,
    commit_deadline: u64,
    reveal_deadline: u64,
    claim_deadline: u64,
}

impl PhaseClock {
    /// Create a clock for a new auction. The commit window opens immediately.
    pub fn new(config: &AuctionConfig) -> Self {
        let mut clock = Self {
            phase: AuctionPhase::Setup,
            commit_deadline: config.commit_deadline,
            reveal_deadline: config.reveal_deadline,
            claim_deadline: config.claim_deadline,
        };
        clock.advance(AuctionPhase::Commit);
        clock
    }

    pub fn phase(&self) -> AuctionPhase {
        self.phase
    }

    pub fn commit_deadline(&self) -> u64 {
        self.commit_deadline
    }

    pub fn reveal_deadline(&self) -> u64 {
        self.reveal_deadline
    }

    pub fn claim_deadline(&self) -> u64 {
        self.claim_deadline
    }

    /// Move the stored phase forward. Requests to stay or go back are ignored.
    pub(crate) fn advance(&mut self, to: AuctionPhase) {
        if to > self.phase {
            self.phase = to;
        }
    }

    /// Commit requires phase Commit and `now < commit_deadline`.
    pub fn check_commit(&self, now: u64) -> Result<(), AuctionError> {
        if self.phase != AuctionPhase::Commit || now >= self.commit_deadline {
            return Err(AuctionError::phase("commit window closed"));
        }
        Ok(())
    }

    /// Reveal requires `commit_deadline <= now < reveal_deadline` and no finalize yet.
    pub fn check_reveal(&self, now: u64) -> Result<(), AuctionError> {
        if self.phase == AuctionPhase::Finalized {
            return Err(AuctionError::phase("auction already finalized"));
        }
        if now < self.commit_deadline {
            return Err(AuctionError::phase("reveal window not open"));
        }
        if now >= self.reveal_deadline {
            return Err(AuctionError::phase("reveal window closed"));
        }
        Ok(())
    }

    /// Finalize requires phase Reveal and `now >= reveal_deadline`.
    pub fn check_finalize(&self, now: u64) -> Result<(), AuctionError> {
        match self.phase {
            AuctionPhase::Finalized => Err(AuctionError::phase("auction already finalized")),
            AuctionPhase::Reveal if now >= self.reveal_deadline => Ok(()),
            AuctionPhase::Reveal => Err(AuctionError::phase("reveal window still open")),
            AuctionPhase::Setup | AuctionPhase::Commit => {
                Err(AuctionError::phase("no bids revealed"))
            }
        }
    }

    /// Claim requires phase Finalized.
    pub fn check_claim(&self) -> Result<(), AuctionError> {
        if self.phase != AuctionPhase::Finalized {
            return Err(AuctionError::phase("auction not finalized"));
        }
        Ok(())
    }

    /// Whether the claim window is open at `now`.
    pub fn is_claim_window_open(&self, now: u64) -> bool {
        self.phase == AuctionPhase::Finalized && now < self.claim_deadline
    }

    /// Classify `now` against the deadlines.
    pub fn window_at(&self, now: u64) -> Window {
        if self.phase == AuctionPhase::Finalized {
            if now < self.claim_deadline {
                Window::Claim
            } else {
                Window::Closed
            }
        } else if now < self.commit_deadline {
            Window::Commit
        } else if now < self.reveal_deadline {
            Window::Reveal
        } else {
            Window::AwaitingFinalize
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuctionParams;

    fn clock() -> PhaseClock {
        let params = AuctionParams {
            commit_duration_secs: 100,
            reveal_duration_secs: 100,
            claim_duration_secs: 100,
            ..Default::default()
        };
        PhaseClock::new(&params.into_config(1, [0u8; 32], 1000).unwrap())
    }

    #[test]
    fn test_new_clock_opens_commit() {
        let clock = clock();
        assert_eq!(clock.phase(), AuctionPhase::Commit);
        assert_eq!(clock.commit_deadline(), 1100);
        assert_eq!(clock.reveal_deadline(), 1200);
        assert_eq!(clock.claim_deadline(), 1300);
    }

    #[test]
    fn test_phase_does_not_follow_time() {
        let clock = clock();
        assert_eq!(clock.window_at(5000), Window::AwaitingFinalize);
        assert_eq!(clock.phase(), AuctionPhase::Commit);
        assert!(clock.check_commit(1100).is_err());
        assert!(clock.check_commit(1099).is_ok());
    }

    #[test]
    fn test_advance_is_monotonic() {
        let mut clock = clock();
        clock.advance(AuctionPhase::Finalized);
        clock.advance(AuctionPhase::Reveal);
        clock.advance(AuctionPhase::Setup);
        assert_eq!(clock.phase(), AuctionPhase::Finalized);
    }

    #[test]
    fn test_reveal_window_bounds() {
        let clock = clock();
        assert!(clock.check_reveal(1099).is_err());
        assert!(clock.check_reveal(1100).is_ok());
        assert!(clock.check_reveal(1199).is_ok());
        assert!(clock.check_reveal(1200).is_err());
    }

    #[test]
    fn test_finalize_gates() {
        let mut clock = clock();
        assert!(matches!(
            clock.check_finalize(5000),
            Err(AuctionError::PhaseViolation(_))
        ));

        clock.advance(AuctionPhase::Reveal);
        assert!(clock.check_finalize(1199).is_err());
        assert!(clock.check_finalize(1200).is_ok());

        clock.advance(AuctionPhase::Finalized);
        assert!(clock.check_finalize(1200).is_err());
        assert!(clock.check_claim().is_ok());
        assert!(clock.is_claim_window_open(1299));
        assert!(!clock.is_claim_window_open(1300));
        assert_eq!(clock.window_at(1300), Window::Closed);
    }
}
