//! Construction parameters for an auction instance.
//!
//! `AuctionParams` is what a host supplies when creating an auction. It is
//! validated once and turned into an immutable [`AuctionConfig`] whose
//! deadlines are anchored at the creation timestamp.

use auction_types::{Address, AuctionConfig};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Parameters for a new auction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(default)]
pub struct AuctionParams {
    /// Total quantity to allocate
    pub total_supply: u64,
    /// Lowest admissible revealed price
    pub min_price: u64,
    /// Highest admissible revealed price
    pub max_price: u64,
    /// Length of the commit window (seconds)
    pub commit_duration_secs: u64,
    /// Length of the reveal window (seconds)
    pub reveal_duration_secs: u64,
    /// Length of the claim window (seconds)
    pub claim_duration_secs: u64,
    /// Fixed-point scale of one quantity unit
    pub quantity_scale: u64,
    /// Opaque reference to the organizer's decryption key
    pub organizer_key_ref: Vec<u8>,
}

impl Default for AuctionParams {
    fn default() -> Self {
        Self {
            total_supply: 1_000_000,
            min_price: 1,
            max_price: u64::MAX,
            commit_duration_secs: 3600,  // 1 hour
            reveal_duration_secs: 3600,  // 1 hour
            claim_duration_secs: 86_400, // 1 day
            quantity_scale: 1,
            organizer_key_ref: Vec::new(),
        }
    }
}

impl AuctionParams {
    /// Validate the parameters.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.total_supply == 0 {
            return Err(ParamsError::ZeroSupply);
        }
        if self.min_price == 0 || self.min_price > self.max_price {
            return Err(ParamsError::InvalidPriceBounds {
                min: self.min_price,
                max: self.max_price,
            });
        }
        if self.commit_duration_secs == 0
            || self.reveal_duration_secs == 0
            || self.claim_duration_secs == 0
        {
            return Err(ParamsError::ZeroDuration);
        }
        if self.quantity_scale == 0 {
            return Err(ParamsError::ZeroQuantityScale);
        }
        Ok(())
    }

    /// Build the immutable configuration, anchoring deadlines at `created_at`.
    pub fn into_config(
        self,
        auction_id: u64,
        organizer: Address,
        created_at: u64,
    ) -> Result<AuctionConfig, ParamsError> {
        self.validate()?;

        let commit_deadline = created_at
            .checked_add(self.commit_duration_secs)
            .ok_or(ParamsError::DeadlineOverflow)?;
        let reveal_deadline = commit_deadline
            .checked_add(self.reveal_duration_secs)
            .ok_or(ParamsError::DeadlineOverflow)?;
        let claim_deadline = reveal_deadline
            .checked_add(self.claim_duration_secs)
            .ok_or(ParamsError::DeadlineOverflow)?;

        Ok(AuctionConfig {
            auction_id,
            organizer,
            total_supply: self.total_supply,
            min_price: self.min_price,
            max_price: self.max_price,
            quantity_scale: self.quantity_scale,
            created_at,
            commit_deadline,
            reveal_deadline,
            claim_deadline,
            organizer_key_ref: self.organizer_key_ref,
        })
    }
}

/// Errors that can occur during parameter validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamsError {
    #[error("Total supply cannot be zero")]
    ZeroSupply,

    #[error("Invalid price bounds: min {min}, max {max}")]
    InvalidPriceBounds { min: u64, max: u64 },

    #[error("Window durations must be non-zero")]
    ZeroDuration,

    #[error("Quantity scale cannot be zero")]
    ZeroQuantityScale,

    #[error("Deadline overflows the clock")]
    DeadlineOverflow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = AuctionParams::default();
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_zero_supply() {
        let params = AuctionParams {
            total_supply: 0,
            ..Default::default()
        };
        assert_eq!(params.validate(), Err(ParamsError::ZeroSupply));
    }

    #[test]
    fn test_inverted_price_bounds() {
        let params = AuctionParams {
            min_price: 100,
            max_price: 85,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ParamsError::InvalidPriceBounds { .. })
        ));
    }

    #[test]
    fn test_zero_duration() {
        let params = AuctionParams {
            reveal_duration_secs: 0,
            ..Default::default()
        };
        assert_eq!(params.validate(), Err(ParamsError::ZeroDuration));
    }

    #[test]
    fn test_deadlines_chain_from_creation() {
        let params = AuctionParams {
            commit_duration_secs: 100,
            reveal_duration_secs: 50,
            claim_duration_secs: 25,
            ..Default::default()
        };
        let config = params.into_config(7, [1u8; 32], 1000).unwrap();

        assert_eq!(config.auction_id, 7);
        assert_eq!(config.commit_deadline, 1100);
        assert_eq!(config.reveal_deadline, 1150);
        assert_eq!(config.claim_deadline, 1175);
    }

    #[test]
    fn test_deadline_overflow() {
        let params = AuctionParams {
            commit_duration_secs: u64::MAX,
            ..Default::default()
        };
        assert_eq!(
            params.into_config(1, [0u8; 32], 10),
            Err(ParamsError::DeadlineOverflow)
        );
    }

    #[test]
    fn test_params_from_json_uses_defaults() {
        let params: AuctionParams =
            serde_json::from_str(r#"{"total_supply": 1000, "min_price": 85, "max_price": 100}"#)
                .unwrap();
        assert_eq!(params.total_supply, 1000);
        assert_eq!(params.quantity_scale, 1);
        assert_eq!(params.commit_duration_secs, 3600);
    }
}
