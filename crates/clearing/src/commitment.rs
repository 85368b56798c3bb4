//! Commitment opening checks.
//!
//! A reveal is accepted only if the disclosed price, quantity and salt hash to
//! exactly the commitment recorded at commit time. The check deliberately
//! reports a single yes/no so callers cannot tell which field was wrong.

use auction_types::{compute_bid_commitment, Address, CommitmentHash, Salt};

/// Verify that a commitment opens to the given price, quantity and salt.
///
/// # Arguments
/// * `commitment` - The hash stored at commit time
/// * `bidder` - The identity that made the commitment
/// * `price` - The claimed price
/// * `quantity` - The claimed quantity
/// * `salt` - The blinding salt used at commit time
///
/// # Returns
/// `true` if the opening matches
pub fn verify_commitment_opening(
    commitment: &CommitmentHash,
    bidder: &Address,
    price: u64,
    quantity: u64,
    salt: &Salt,
) -> bool {
    if commitment.is_zero() {
        return false;
    }
    let expected = compute_bid_commitment(bidder, price, quantity, salt);

    // Constant-time comparison
    expected
        .0
        .iter()
        .zip(commitment.0.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
