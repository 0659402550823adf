//! Variable-length encodings for compact metadata keys.
//!
//! `encode_uint` writes one length byte followed by the minimal big-endian
//! magnitude bytes; `encode_bytes` prefixes an opaque byte string with its
//! encoded length. `decode_uint`/`decode_bytes` are exact inverses.
//!
//! These encodings are compact, not comparable: two encoded integers only
//! sort like their values when their lengths match. Index values always use
//! the fixed-width scheme in [`super::value`] instead.

use strata_commons::{EngineError, Result};

/// Encode a non-negative integer as `[len][magnitude...]`.
pub fn encode_uint(value: u64) -> Vec<u8> {
    let size = uint_size(value);
    let mut encoded = Vec::with_capacity(1 + size);
    encoded.push(size as u8);
    encoded.extend_from_slice(&value.to_be_bytes()[8 - size..]);
    encoded
}

/// Decode an integer produced by [`encode_uint`], requiring the slice to
/// contain exactly one encoded value.
pub fn decode_uint(encoded: &[u8]) -> Result<u64> {
    let (value, consumed) = decode_uint_prefix(encoded)?;
    if consumed != encoded.len() {
        return Err(EngineError::encoding(format!(
            "trailing bytes after encoded integer: expected {} bytes, got {}",
            consumed,
            encoded.len()
        )));
    }
    Ok(value)
}

/// Decode an integer from the front of `encoded`, returning the value and
/// the number of bytes consumed.
pub fn decode_uint_prefix(encoded: &[u8]) -> Result<(u64, usize)> {
    let size = *encoded
        .first()
        .ok_or_else(|| EngineError::encoding("empty encoded integer"))? as usize;
    if size == 0 || size > 8 {
        return Err(EngineError::encoding(format!(
            "invalid encoded integer length byte: {}",
            size
        )));
    }
    if encoded.len() < 1 + size {
        return Err(EngineError::encoding(format!(
            "truncated encoded integer: need {} magnitude bytes, have {}",
            size,
            encoded.len() - 1
        )));
    }
    let mut value = 0u64;
    for &byte in &encoded[1..=size] {
        value = (value << 8) | byte as u64;
    }
    Ok((value, 1 + size))
}

/// Encode an opaque byte string as `[encoded length][bytes...]`.
pub fn encode_bytes(value: &[u8]) -> Vec<u8> {
    let mut encoded = encode_uint(value.len() as u64);
    encoded.extend_from_slice(value);
    encoded
}

/// Decode a byte string produced by [`encode_bytes`], requiring the slice to
/// contain exactly one encoded string.
pub fn decode_bytes(encoded: &[u8]) -> Result<Vec<u8>> {
    let (length, consumed) = decode_uint_prefix(encoded)?;
    let length = length as usize;
    let rest = &encoded[consumed..];
    if rest.len() != length {
        return Err(EngineError::encoding(format!(
            "encoded byte string declares {} bytes but carries {}",
            length,
            rest.len()
        )));
    }
    Ok(rest.to_vec())
}

/// Minimal magnitude byte count for a value; zero still takes one byte.
fn uint_size(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    std::cmp::max(1, bits.div_ceil(8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_boundaries() {
        for value in [
            0u64,
            1,
            0xFF,
            0x100,
            0xFFFF,
            0x10000,
            0xFF_FFFF,
            0x1_0000_0000,
            u64::from(u32::MAX),
            u64::MAX - 1,
            u64::MAX,
        ] {
            let encoded = encode_uint(value);
            assert_eq!(decode_uint(&encoded).unwrap(), value, "value {}", value);
        }
    }

    #[test]
    fn test_encoding_is_minimal() {
        assert_eq!(encode_uint(0), vec![1, 0x00]);
        assert_eq!(encode_uint(0xFF), vec![1, 0xFF]);
        assert_eq!(encode_uint(0x100), vec![2, 0x01, 0x00]);
        assert_eq!(encode_uint(u64::MAX).len(), 9);
    }

    #[test]
    fn test_bytes_round_trip() {
        for value in [&b""[..], b"x", b"hello world", &[0u8; 300]] {
            let encoded = encode_bytes(value);
            assert_eq!(decode_bytes(&encoded).unwrap(), value.to_vec());
        }
    }

    #[test]
    fn test_decode_rejects_malformed_input() {
        assert!(decode_uint(&[]).is_err());
        assert!(decode_uint(&[0]).is_err()); // zero length byte
        assert!(decode_uint(&[9, 0, 0, 0, 0, 0, 0, 0, 0, 0]).is_err()); // length > 8
        assert!(decode_uint(&[2, 0x01]).is_err()); // truncated magnitude
        assert!(decode_uint(&[1, 0x01, 0x02]).is_err()); // trailing bytes

        assert!(decode_bytes(&[1, 3, b'a', b'b']).is_err()); // short payload
        assert!(decode_bytes(&[1, 1, b'a', b'b']).is_err()); // long payload
    }

    #[test]
    fn test_prefix_decode_reports_consumption() {
        let mut buf = encode_uint(0xABCD);
        buf.extend_from_slice(b"tail");
        let (value, consumed) = decode_uint_prefix(&buf).unwrap();
        assert_eq!(value, 0xABCD);
        assert_eq!(&buf[consumed..], b"tail");
    }
}
