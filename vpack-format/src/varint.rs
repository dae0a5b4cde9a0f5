//! Variable-length unsigned integers (ULEB128), forward and reversed
//!
//! Compact containers store their byte size as a forward ULEB128 right after
//! the head byte, and their member count as a *reversed* ULEB128 at the very
//! end, so that a reader can decode it by walking backwards from the last byte.

use smallvec::SmallVec;

use crate::error::{Result, VPackError};

/// Longest possible encoding of a u64
pub const MAX_ULEB128_LEN: usize = 10;

/// Encode a u64 as ULEB128
pub fn encode_uleb128(val: u64) -> SmallVec<[u8; 10]> {
    let mut result = SmallVec::new();
    let mut x = val;

    while x >= 0x80 {
        result.push((x & 0x7F) as u8 | 0x80);
        x >>= 7;
    }
    result.push((x & 0x7F) as u8);

    result
}

/// Encode a u64 as reversed ULEB128: the last byte holds the low 7 bits
pub fn encode_uleb128_reversed(val: u64) -> SmallVec<[u8; 10]> {
    let mut result = encode_uleb128(val);
    result.reverse();
    result
}

/// Number of bytes the ULEB128 encoding of `val` occupies
pub fn uleb128_len(val: u64) -> usize {
    let bits = 64 - val.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

/// Decode ULEB128 from the start of `bytes`, returning the value and its length
pub fn decode_uleb128(bytes: &[u8]) -> Result<(u64, usize)> {
    let mut result = 0u64;
    let mut shift = 0;

    for (i, &byte) in bytes.iter().enumerate() {
        if i >= MAX_ULEB128_LEN {
            return Err(VPackError::ValidatorInvalidLength(
                "variable length integer too long".to_string(),
            ));
        }

        result |= ((byte & 0x7F) as u64) << shift;

        if (byte & 0x80) == 0 {
            return Ok((result, i + 1));
        }

        shift += 7;
    }

    Err(VPackError::truncated("variable length integer"))
}

/// Decode a reversed ULEB128 that ends at the last byte of `bytes`
///
/// Returns the value and the number of bytes it occupies.
pub fn decode_uleb128_reversed(bytes: &[u8]) -> Result<(u64, usize)> {
    let mut result = 0u64;
    let mut shift = 0;

    for (i, &byte) in bytes.iter().rev().enumerate() {
        if i >= MAX_ULEB128_LEN {
            return Err(VPackError::ValidatorInvalidLength(
                "variable length integer too long".to_string(),
            ));
        }

        result |= ((byte & 0x7F) as u64) << shift;

        if (byte & 0x80) == 0 {
            return Ok((result, i + 1));
        }

        shift += 7;
    }

    Err(VPackError::truncated("variable length integer"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_uleb128_roundtrip() {
        let test_cases = vec![0u64, 1, 127, 128, 16383, 16384, u64::MAX];

        for val in test_cases {
            let encoded = encode_uleb128(val);
            let (decoded, bytes_consumed) = decode_uleb128(&encoded).unwrap();
            assert_eq!(val, decoded);
            assert_eq!(bytes_consumed, encoded.len());
            assert_eq!(uleb128_len(val), encoded.len());
        }
    }

    #[test]
    fn test_uleb128_reversed_layout() {
        assert_eq!(encode_uleb128_reversed(3).as_slice(), &[0x03]);
        // 300 = 0b10_0101100: low group 0x2c with continuation, then 0x02
        assert_eq!(encode_uleb128(300).as_slice(), &[0xac, 0x02]);
        assert_eq!(encode_uleb128_reversed(300).as_slice(), &[0x02, 0xac]);

        let mut container = vec![0x13, 0x00, 0x00];
        container.extend_from_slice(&encode_uleb128_reversed(300));
        assert_eq!(decode_uleb128_reversed(&container).unwrap(), (300, 2));
    }

    proptest! {
        #[test]
        fn prop_uleb128_roundtrip(value in any::<u64>()) {
            let encoded = encode_uleb128(value);
            let (decoded, consumed) = decode_uleb128(&encoded).unwrap();
            prop_assert_eq!(decoded, value);
            prop_assert!(consumed <= MAX_ULEB128_LEN, "encoded length should be <= 10 bytes");
        }

        #[test]
        fn prop_uleb128_reversed_roundtrip(value in any::<u64>(), prefix in prop::collection::vec(any::<u8>(), 0..8)) {
            let mut bytes = prefix;
            let encoded = encode_uleb128_reversed(value);
            bytes.extend_from_slice(&encoded);
            let (decoded, consumed) = decode_uleb128_reversed(&bytes).unwrap();
            prop_assert_eq!(decoded, value);
            prop_assert_eq!(consumed, encoded.len());
        }
    }

    #[test]
    fn test_uleb128_decode_truncated() {
        let encoded = encode_uleb128(1000);
        let truncated = &encoded[..encoded.len() - 1];
        assert!(decode_uleb128(truncated).is_err());
        assert!(decode_uleb128_reversed(&[0x80]).is_err());
    }

    #[test]
    fn test_uleb128_decode_too_long() {
        let mut long_bytes = vec![0x80; 11]; // 11 bytes, all with continuation bit
        long_bytes.push(0x00); // final byte
        assert!(decode_uleb128(&long_bytes).is_err());
    }
}
