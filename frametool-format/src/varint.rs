//! Variable-length integer encoding (ULEB128 / ZigZag)

use crate::error::FrameError;
use smallvec::SmallVec;

/// Longest ULEB128 encoding of a u64
pub const MAX_ULEB128_LEN: usize = 10;

/// Encode a u64 as ULEB128
pub fn encode_uleb128(val: u64) -> SmallVec<[u8; MAX_ULEB128_LEN]> {
    let mut result = SmallVec::new();
    let mut x = val;

    while x >= 0x80 {
        result.push((x & 0x7F) as u8 | 0x80);
        x >>= 7;
    }
    result.push((x & 0x7F) as u8);

    result
}

/// Number of bytes `encode_uleb128(val)` produces
pub fn uleb128_len(val: u64) -> usize {
    let bits = 64 - val.leading_zeros() as usize;
    bits.max(1).div_ceil(7)
}

/// Decode ULEB128 from bytes, returning the value and bytes consumed
pub fn decode_uleb128(bytes: &[u8]) -> Result<(u64, usize), FrameError> {
    let mut result = 0u64;
    let mut shift = 0;

    for (i, &byte) in bytes.iter().enumerate() {
        if i >= MAX_ULEB128_LEN {
            return Err(FrameError::LimitExceeded("ULEB128 too long".to_string()));
        }

        result |= ((byte & 0x7F) as u64) << shift;

        if (byte & 0x80) == 0 {
            return Ok((result, i + 1));
        }

        shift += 7;
    }

    Err(FrameError::UnexpectedEof)
}

/// ZigZag encode a signed integer
pub fn zigzag_encode(v: i64) -> u64 {
    ((v << 1) ^ (v >> 63)) as u64
}

/// ZigZag decode to signed integer
pub fn zigzag_decode(u: u64) -> i64 {
    ((u >> 1) as i64) ^ -((u & 1) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_uleb128_boundaries() {
        let test_cases = vec![0u64, 1, 127, 128, 16383, 16384, u64::MAX];

        for val in test_cases {
            let encoded = encode_uleb128(val);
            let (decoded, bytes_consumed) = decode_uleb128(&encoded).unwrap();
            assert_eq!(val, decoded);
            assert_eq!(bytes_consumed, encoded.len());
            assert_eq!(uleb128_len(val), encoded.len());
        }
    }

    proptest! {
        #[test]
        fn prop_uleb128_len_matches_encoding(value in any::<u64>()) {
            prop_assert_eq!(uleb128_len(value), encode_uleb128(value).len());
        }

        #[test]
        fn prop_zigzag_roundtrip(value in any::<i64>()) {
            prop_assert_eq!(zigzag_decode(zigzag_encode(value)), value);
        }
    }

    #[test]
    fn test_uleb128_decode_truncated() {
        let encoded = encode_uleb128(1000);
        let truncated = &encoded[..encoded.len() - 1];
        assert!(matches!(
            decode_uleb128(truncated),
            Err(FrameError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_uleb128_decode_too_long() {
        let mut long_bytes = vec![0x80; 11];
        long_bytes.push(0x00);
        assert!(matches!(
            decode_uleb128(&long_bytes),
            Err(FrameError::LimitExceeded(_))
        ));
    }

    #[test]
    fn test_zigzag_encoding_values() {
        assert_eq!(zigzag_encode(0), 0);
        assert_eq!(zigzag_encode(-1), 1);
        assert_eq!(zigzag_encode(1), 2);
        assert_eq!(zigzag_encode(-2), 3);
        assert_eq!(zigzag_encode(2), 4);
    }
}
