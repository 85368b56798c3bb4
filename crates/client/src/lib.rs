//! Client SDK for bidding in sealed-bid auctions.
//!
//! This crate provides:
//! - Sealing bids into salted commitments
//! - Hex helpers for addresses and salts on the RPC wire

pub mod bid;
pub mod wire;

pub use bid::{create_sealed_bid, BidBuilder, BidError, SealedBid};
