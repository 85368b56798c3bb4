//! Hex encoding of fixed-size values on the RPC wire.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Expected {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },
}

/// Decode exactly 32 bytes of hex, with or without a `0x` prefix.
pub fn decode_hex32(s: &str) -> Result<[u8; 32], WireError> {
    let bytes = hex::decode(s.trim_start_matches("0x"))
        .map_err(|e| WireError::InvalidHex(e.to_string()))?;
    let actual = bytes.len();
    bytes
        .try_into()
        .map_err(|_| WireError::WrongLength {
            expected: 32,
            actual,
        })
}

/// Hex encode with a `0x` prefix.
pub fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_hex32() {
        let encoded = encode_hex(&[7u8; 32]);
        assert!(encoded.starts_with("0x"));
        assert_eq!(decode_hex32(&encoded).unwrap(), [7u8; 32]);
        assert_eq!(decode_hex32(&hex::encode([7u8; 32])).unwrap(), [7u8; 32]);
    }

    #[test]
    fn test_decode_hex32_rejects_bad_input() {
        assert!(matches!(decode_hex32("zz"), Err(WireError::InvalidHex(_))));
        assert_eq!(
            decode_hex32("0xabcd"),
            Err(WireError::WrongLength {
                expected: 32,
                actual: 2
            })
        );
    }
}
