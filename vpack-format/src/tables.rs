//! Lookup tables indexed by head byte
//!
//! All four tables are computed at compile time from the head byte ranges of
//! the encoding:
//!
//! - [`TYPE_MAP`]: the [`ValueType`] of each head
//! - [`FIXED_LENGTH`]: the total byte size for fixed-size heads, 0 otherwise
//! - [`WIDTH_MAP`]: the offset width of indexed and equal-size containers
//! - [`FIRST_SUB_MAP`]: the minimum data offset of non-empty containers

use crate::types::ValueType;

/// Head byte to value type
pub static TYPE_MAP: [ValueType; 256] = build_type_map();

/// Head byte to total byte size, or 0 when the size is dynamic
pub static FIXED_LENGTH: [u8; 256] = build_fixed_length();

/// Head byte to index-table / length-field width (1, 2, 4 or 8), or 0
pub static WIDTH_MAP: [u8; 256] = build_width_map();

/// Head byte to the smallest possible offset of the first member, or 0
pub static FIRST_SUB_MAP: [u8; 256] = build_first_sub_map();

const fn build_type_map() -> [ValueType; 256] {
    let mut map = [ValueType::None; 256];
    let mut h = 0usize;
    while h < 256 {
        map[h] = match h {
            0x00 => ValueType::None,
            0x01..=0x09 | 0x13 => ValueType::Array,
            0x0a..=0x12 | 0x14 => ValueType::Object,
            0x15 | 0x16 => ValueType::None,
            0x17 => ValueType::Illegal,
            0x18 => ValueType::Null,
            0x19 | 0x1a => ValueType::Bool,
            0x1b => ValueType::Double,
            0x1c => ValueType::UTCDate,
            0x1d => ValueType::External,
            0x1e => ValueType::MinKey,
            0x1f => ValueType::MaxKey,
            0x20..=0x27 => ValueType::Int,
            0x28..=0x2f => ValueType::UInt,
            0x30..=0x3f => ValueType::SmallInt,
            0x40..=0xbf => ValueType::String,
            0xc0..=0xc7 => ValueType::Binary,
            0xc8..=0xd7 => ValueType::BCD,
            0xee | 0xef => ValueType::Tagged,
            0xf0..=0xff => ValueType::Custom,
            _ => ValueType::None,
        };
        h += 1;
    }
    map
}

const fn build_fixed_length() -> [u8; 256] {
    let mut map = [0u8; 256];
    let mut h = 0usize;
    while h < 256 {
        map[h] = match h {
            0x00 | 0x01 | 0x0a => 1,
            0x17..=0x1a | 0x1e | 0x1f => 1,
            0x1b..=0x1d => 9,
            0x20..=0x27 => (h - 0x1f + 1) as u8,
            0x28..=0x2f => (h - 0x27 + 1) as u8,
            0x30..=0x3f => 1,
            0x40..=0xbe => (h - 0x3f) as u8,
            0xf0 => 2,
            0xf1 => 3,
            0xf2 => 5,
            0xf3 => 9,
            _ => 0,
        };
        h += 1;
    }
    map
}

const fn build_width_map() -> [u8; 256] {
    let mut map = [0u8; 256];
    let mut h = 0usize;
    while h < 256 {
        map[h] = match h {
            0x02 | 0x06 | 0x0b | 0x0f => 1,
            0x03 | 0x07 | 0x0c | 0x10 => 2,
            0x04 | 0x08 | 0x0d | 0x11 => 4,
            0x05 | 0x09 | 0x0e | 0x12 => 8,
            _ => 0,
        };
        h += 1;
    }
    map
}

const fn build_first_sub_map() -> [u8; 256] {
    let mut map = [0u8; 256];
    let mut h = 0usize;
    while h < 256 {
        map[h] = match h {
            0x02 => 2,
            0x03 | 0x06 | 0x0b | 0x0f => 3,
            0x04 | 0x07 | 0x0c | 0x10 => 5,
            0x05 | 0x08 | 0x09 | 0x0d | 0x0e | 0x11 | 0x12 => 9,
            _ => 0,
        };
        h += 1;
    }
    map
}

/// Value type of a head byte
#[inline]
pub fn value_type(head: u8) -> ValueType {
    TYPE_MAP[head as usize]
}

/// Fixed total byte size of a head byte, `None` when dynamic
#[inline]
pub fn fixed_length(head: u8) -> Option<u64> {
    match FIXED_LENGTH[head as usize] {
        0 => None,
        n => Some(n as u64),
    }
}

/// Offset width of a container head, 0 for everything else
#[inline]
pub fn width(head: u8) -> usize {
    WIDTH_MAP[head as usize] as usize
}
