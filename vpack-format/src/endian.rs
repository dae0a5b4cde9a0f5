//! Little-endian integer helpers

use crate::error::{Result, VPackError};

/// Read an unsigned little-endian integer of `width` bytes (1..=8)
///
/// The caller guarantees `bytes.len() >= width`.
#[inline]
pub fn read_uint_le(bytes: &[u8], width: usize) -> u64 {
    debug_assert!((1..=8).contains(&width));
    bytes[..width]
        .iter()
        .rev()
        .fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

/// Read an unsigned little-endian integer at `offset`, bounds-checked
pub fn read_uint_at(bytes: &[u8], offset: usize, width: usize) -> Result<u64> {
    let end = offset
        .checked_add(width)
        .ok_or_else(|| VPackError::truncated("integer field"))?;
    if end > bytes.len() {
        return Err(VPackError::truncated("integer field"));
    }
    Ok(read_uint_le(&bytes[offset..], width))
}

/// Sign-extend a `width`-byte two's complement value
#[inline]
pub fn sign_extend(value: u64, width: usize) -> i64 {
    if width >= 8 {
        return value as i64;
    }
    let shift = 64 - 8 * width as u32;
    ((value << shift) as i64) >> shift
}

/// Append `value` as `width` little-endian bytes
#[inline]
pub fn append_uint_le(out: &mut Vec<u8>, value: u64, width: usize) {
    out.extend_from_slice(&value.to_le_bytes()[..width]);
}

/// Overwrite `target` with the low `target.len()` little-endian bytes of `value`
#[inline]
pub fn store_uint_le(target: &mut [u8], value: u64) {
    let width = target.len();
    target.copy_from_slice(&value.to_le_bytes()[..width]);
}

/// Number of bytes needed to store `value` unsigned (at least 1)
#[inline]
pub fn uint_length(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(8).max(1)
}

/// Number of bytes needed to store `value` in two's complement (at least 1)
#[inline]
pub fn int_length(value: i64) -> usize {
    let magnitude = if value < 0 { !value as u64 } else { value as u64 };
    // one extra bit for the sign
    let bits = 64 - magnitude.leading_zeros() as usize + 1;
    bits.div_ceil(8).clamp(1, 8)
}

/// Convert a format length to `usize`
#[inline]
pub fn to_usize(value: u64) -> Result<usize> {
    usize::try_from(value).map_err(|_| VPackError::NumberOutOfRange)
}
