//! Sealed bid creation.

use rand::{CryptoRng, RngCore};
use thiserror::Error;

use auction_types::{compute_bid_commitment, Address, CommitmentHash, Salt};

/// Errors that can occur during bid creation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BidError {
    #[error("Bid price must be non-zero")]
    ZeroPrice,

    #[error("Bid quantity must be non-zero")]
    ZeroQuantity,

    #[error("Encrypted payload must be non-empty")]
    EmptyPayload,

    #[error("Bid price {price} outside [{min}, {max}]")]
    PriceOutOfRange { price: u64, min: u64, max: u64 },

    #[error("Bid quantity {quantity} exceeds supply {supply}")]
    QuantityExceedsSupply { quantity: u64, supply: u64 },
}

/// A sealed bid ready for submission.
///
/// Only `commitment` and `encrypted_payload` go on the wire at commit time.
/// The rest must be kept by the bidder until the reveal window.
#[derive(Debug, Clone)]
pub struct SealedBid {
    /// Hash binding the bidder to (price, quantity, salt)
    pub commitment: CommitmentHash,
    /// Blinding salt (keep secret until reveal)
    pub salt: Salt,
    /// Bid price (keep secret)
    pub price: u64,
    /// Bid quantity (keep secret)
    pub quantity: u64,
    /// Opaque payload stored alongside the commitment
    pub encrypted_payload: Vec<u8>,
}

impl SealedBid {
    /// Check that this bid opens its own commitment for `bidder`.
    pub fn opens_for(&self, bidder: &Address) -> bool {
        compute_bid_commitment(bidder, self.price, self.quantity, &self.salt) == self.commitment
    }
}

/// Seal a bid with a freshly drawn salt.
///
/// # Arguments
/// * `bidder` - Address the bid will be committed from
/// * `price` - Price per unit
/// * `quantity` - Units wanted
/// * `encrypted_payload` - Opaque payload, passed through unchanged
/// * `rng` - Cryptographically secure random number generator
pub fn create_sealed_bid<R: RngCore + CryptoRng>(
    bidder: &Address,
    price: u64,
    quantity: u64,
    encrypted_payload: Vec<u8>,
    rng: &mut R,
) -> Result<SealedBid, BidError> {
    if price == 0 {
        return Err(BidError::ZeroPrice);
    }
    if quantity == 0 {
        return Err(BidError::ZeroQuantity);
    }
    if encrypted_payload.is_empty() {
        return Err(BidError::EmptyPayload);
    }

    let mut salt = [0u8; 32];
    rng.fill_bytes(&mut salt);

    Ok(SealedBid {
        commitment: compute_bid_commitment(bidder, price, quantity, &salt),
        salt,
        price,
        quantity,
        encrypted_payload,
    })
}

/// Builder for sealing bids checked against an auction's bounds.
pub struct BidBuilder {
    bidder: Address,
    price: u64,
    quantity: u64,
    price_bounds: Option<(u64, u64)>,
    total_supply: Option<u64>,
    encrypted_payload: Vec<u8>,
}

impl BidBuilder {
    /// Create a new bid builder.
    pub fn new(bidder: Address) -> Self {
        Self {
            bidder,
            price: 0,
            quantity: 0,
            price_bounds: None,
            total_supply: None,
            encrypted_payload: Vec::new(),
        }
    }

    pub fn price(mut self, price: u64) -> Self {
        self.price = price;
        self
    }

    pub fn quantity(mut self, quantity: u64) -> Self {
        self.quantity = quantity;
        self
    }

    /// Reject prices outside `[min, max]` before anything is committed.
    pub fn price_bounds(mut self, min: u64, max: u64) -> Self {
        self.price_bounds = Some((min, max));
        self
    }

    /// Reject quantities above the auction's supply.
    pub fn total_supply(mut self, supply: u64) -> Self {
        self.total_supply = Some(supply);
        self
    }

    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.encrypted_payload = payload;
        self
    }

    /// Build the sealed bid.
    pub fn build<R: RngCore + CryptoRng>(self, rng: &mut R) -> Result<SealedBid, BidError> {
        if let Some((min, max)) = self.price_bounds {
            if self.price < min || self.price > max {
                return Err(BidError::PriceOutOfRange {
                    price: self.price,
                    min,
                    max,
                });
            }
        }
        if let Some(supply) = self.total_supply {
            if self.quantity > supply {
                return Err(BidError::QuantityExceedsSupply {
                    quantity: self.quantity,
                    supply,
                });
            }
        }

        create_sealed_bid(
            &self.bidder,
            self.price,
            self.quantity,
            self.encrypted_payload,
            rng,
        )
    }
}
