//! Structural validation of untrusted buffers
//!
//! The [`Validator`] walks a buffer without trusting any length field beyond
//! a bounds check. Once a buffer passes, every [`Slice`] operation on it stays
//! within the value's bytes.

use std::str;

use ahash::AHashSet;
use tracing::debug;
use vpack_format::constants::*;
use vpack_format::endian::read_uint_at;
use vpack_format::tables::{fixed_length, value_type, width, FIRST_SUB_MAP};
use vpack_format::varint::{decode_uleb128, decode_uleb128_reversed};
use vpack_format::{Result, VPackError, ValueType};

use crate::slice::{custom_length_width, Slice};
use crate::Options;

/// Checks that bytes form a well-formed value
#[derive(Debug, Clone, Default)]
pub struct Validator {
    options: Options,
}

/// Shape of a container body, shared by arrays and objects
struct Layout {
    /// Members occupy `data_start..data_end`
    data_start: usize,
    data_end: usize,
    /// Declared member count
    count: u64,
    /// Index table start and entry width, absent for compact layouts
    index: Option<(usize, usize)>,
    byte_size: usize,
}

impl Validator {
    /// Validator with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Validator honouring `options` (UTF-8 checks, Externals, uniqueness, limits)
    pub fn with_options(options: Options) -> Self {
        Self { options }
    }

    /// Accept `data` only if it holds exactly one well-formed value
    pub fn validate(&self, data: &[u8]) -> Result<()> {
        let size = self.validate_part(data)?;
        if size != data.len() {
            let err = invalid_length(format!(
                "value occupies {} of {} bytes",
                size,
                data.len()
            ));
            debug!(head = data.first().copied(), error = %err, "rejected buffer");
            return Err(err);
        }
        Ok(())
    }

    /// Validate the value at the start of `data`, allowing trailing bytes
    ///
    /// Returns the byte size of the validated value.
    pub fn validate_part(&self, data: &[u8]) -> Result<usize> {
        self.check(data, 0).inspect_err(|err| {
            debug!(head = data.first().copied(), error = %err, "rejected buffer");
        })
    }

    /// Byte size of the (possibly tagged) value at the start of `data`
    fn check(&self, data: &[u8], depth: usize) -> Result<usize> {
        let mut offset = 0;
        loop {
            match data.get(offset) {
                Some(&HEAD_TAGGED_1) => offset += 2,
                Some(&HEAD_TAGGED_8) => offset += 9,
                _ => break,
            }
        }
        let inner = data
            .get(offset..)
            .ok_or_else(|| invalid_length("tag exceeds buffer".to_string()))?;
        Ok(offset + self.check_untagged(inner, depth)?)
    }

    fn check_untagged(&self, data: &[u8], depth: usize) -> Result<usize> {
        let head = *data
            .first()
            .ok_or_else(|| invalid_length("length 0 is invalid for any value".to_string()))?;

        match value_type(head) {
            ValueType::None if head != HEAD_NONE => Err(VPackError::ValidatorInvalidType(
                format!("reserved head byte 0x{:02x}", head),
            )),
            ValueType::Array | ValueType::Object
                if head != HEAD_EMPTY_ARRAY && head != HEAD_EMPTY_OBJECT =>
            {
                if depth >= self.options.limits.max_depth {
                    return Err(VPackError::TooDeepNesting);
                }
                if value_type(head) == ValueType::Array {
                    self.check_array(data, head, depth)
                } else {
                    self.check_object(data, head, depth)
                }
            }
            ValueType::String => {
                let (start, len) = if head == HEAD_LONG_STRING {
                    need(data, 9, "String")?;
                    (9, read_uint_at(data, 1, 8)?)
                } else {
                    (1, (head - HEAD_SHORT_STRING_0) as u64)
                };
                let size = bounded(data, (start as u64).saturating_add(len), "String")?;
                if self.options.validate_utf8_strings {
                    str::from_utf8(&data[start..size])
                        .map_err(|_| VPackError::InvalidUtf8Sequence)?;
                }
                Ok(size)
            }
            ValueType::Binary => {
                let w = (head - HEAD_BINARY_1 + 1) as usize;
                need(data, 1 + w as u64, "Binary")?;
                let len = read_uint_at(data, 1, w)?;
                bounded(data, (1 + w as u64).saturating_add(len), "Binary")
            }
            ValueType::BCD => Err(VPackError::NotImplemented(
                "validation of BCD values".to_string(),
            )),
            ValueType::External if self.options.disallow_externals => {
                Err(VPackError::BuilderExternalsDisallowed)
            }
            ValueType::Custom if head >= 0xf4 => {
                let w = custom_length_width(head);
                need(data, 1 + w as u64, "Custom")?;
                let len = read_uint_at(data, 1, w)?;
                if len == 0 {
                    return Err(invalid_length("Custom value with zero length".to_string()));
                }
                bounded(data, (1 + w as u64).saturating_add(len), "Custom")
            }
            kind => match fixed_length(head) {
                Some(len) => bounded(data, len, kind.name()),
                None => Err(VPackError::ValidatorInvalidType(format!(
                    "unexpected head byte 0x{:02x}",
                    head
                ))),
            },
        }
    }

    /// Validate the container member at `offset`, which must end by `end`
    fn member(&self, data: &[u8], offset: usize, end: usize, depth: usize) -> Result<usize> {
        if offset >= end {
            return Err(invalid_length("member offset is out of bounds".to_string()));
        }
        if data[offset] == HEAD_NONE {
            return Err(VPackError::ValidatorInvalidType(
                "None is not allowed inside a container".to_string(),
            ));
        }
        self.check(&data[offset..end], depth + 1)
    }

    fn check_array(&self, data: &[u8], head: u8, depth: usize) -> Result<usize> {
        if (0x02..=0x05).contains(&head) {
            return self.check_equal_size_array(data, head, depth);
        }
        let layout = if head == HEAD_COMPACT_ARRAY {
            compact_layout(data)?
        } else {
            indexed_layout(data, head)?
        };

        let mut offsets = Vec::with_capacity(layout.count.min(4096) as usize);
        let mut offset = layout.data_start;
        while offset < layout.data_end {
            offsets.push(offset);
            offset += self.member(data, offset, layout.data_end, depth)?;
        }
        if offsets.len() as u64 != layout.count {
            return Err(invalid_length(format!(
                "Array declares {} members but holds {}",
                layout.count,
                offsets.len()
            )));
        }
        if let Some((base, w)) = layout.index {
            // arrays are indexed in storage order
            for (i, &expected) in offsets.iter().enumerate() {
                if read_uint_at(data, base + i * w, w)? != expected as u64 {
                    return Err(invalid_length(
                        "Array index table entry does not match member".to_string(),
                    ));
                }
            }
        }
        Ok(layout.byte_size)
    }

    fn check_equal_size_array(&self, data: &[u8], head: u8, depth: usize) -> Result<usize> {
        let w = width(head);
        need(data, 1 + w as u64 + 1, "Array")?;
        let byte_size = bounded(data, read_uint_at(data, 1, w)?, "Array")?;
        let start = data_offset(data, head, byte_size)?;

        let item_size = self.member(data, start, byte_size, depth)?;
        if (byte_size - start) % item_size != 0 {
            return Err(invalid_length(
                "Array payload is not a multiple of its member size".to_string(),
            ));
        }
        let mut offset = start + item_size;
        while offset < byte_size {
            if self.member(data, offset, byte_size, depth)? != item_size {
                return Err(invalid_length("Unexpected Array value length".to_string()));
            }
            offset += item_size;
        }
        Ok(byte_size)
    }

    fn check_object(&self, data: &[u8], head: u8, depth: usize) -> Result<usize> {
        let layout = if head == HEAD_COMPACT_OBJECT {
            compact_layout(data)?
        } else {
            indexed_layout(data, head)?
        };

        let mut keys = Vec::with_capacity(layout.count.min(4096) as usize);
        let mut offset = layout.data_start;
        while offset < layout.data_end {
            keys.push(offset);
            offset += self.check_key(data, offset, layout.data_end)?;
            offset += self.member(data, offset, layout.data_end, depth)?;
        }
        if keys.len() as u64 != layout.count {
            return Err(invalid_length(format!(
                "Object declares {} members but holds {}",
                layout.count,
                keys.len()
            )));
        }

        let order = match layout.index {
            Some((base, w)) => {
                let mut entries = (0..keys.len())
                    .map(|i| read_uint_at(data, base + i * w, w).map(|e| e as usize))
                    .collect::<Result<Vec<_>>>()?;
                let order = entries.clone();
                entries.sort_unstable();
                if entries != keys {
                    return Err(invalid_length(
                        "Object index table does not cover its members".to_string(),
                    ));
                }
                order
            }
            None => keys,
        };

        let container = &data[..layout.byte_size];
        let key_of = |offset: usize| {
            let key = match self.options.attribute_translator.as_deref() {
                Some(t) => Slice::with_translator(&container[offset..], t),
                None => Slice::new(&container[offset..]),
            };
            key.key_bytes().unwrap_or(&[])
        };

        if (HEAD_OBJECT_SORTED_1..=HEAD_OBJECT_SORTED_8).contains(&head) {
            let sorted = order.windows(2).all(|pair| key_of(pair[0]) <= key_of(pair[1]));
            if !sorted {
                return Err(VPackError::ValidatorInvalidType(
                    "sorted Object has keys out of order".to_string(),
                ));
            }
        }
        if self.options.check_attribute_uniqueness {
            let mut seen = AHashSet::with_capacity(order.len());
            if !order.iter().all(|&offset| seen.insert(key_of(offset))) {
                return Err(VPackError::DuplicateAttributeName);
            }
        }
        Ok(layout.byte_size)
    }

    /// Byte size of the object key at `offset`
    fn check_key(&self, data: &[u8], offset: usize, end: usize) -> Result<usize> {
        let head = data.get(offset).copied().filter(|_| offset < end).ok_or_else(|| {
            invalid_length("Object key offset is out of bounds".to_string())
        })?;
        let integer_key = self.options.attribute_translator.is_some()
            && matches!(value_type(head), ValueType::SmallInt | ValueType::UInt);
        if value_type(head) != ValueType::String && !integer_key {
            return Err(VPackError::ValidatorInvalidType(format!(
                "Object key has head byte 0x{:02x}",
                head
            )));
        }
        self.check_untagged(&data[offset..end], 0)
    }
}

fn invalid_length(message: String) -> VPackError {
    VPackError::ValidatorInvalidLength(message)
}

fn need(data: &[u8], len: u64, what: &str) -> Result<()> {
    if (data.len() as u64) < len {
        return Err(VPackError::truncated(what));
    }
    Ok(())
}

/// `size` as an offset, checked against the buffer
fn bounded(data: &[u8], size: u64, what: &str) -> Result<usize> {
    need(data, size, what)?;
    Ok(size as usize)
}

/// Offset of the first member after zero padding, as the reader locates it
fn data_offset(data: &[u8], head: u8, byte_size: usize) -> Result<usize> {
    let start = Slice::new(&data[..byte_size]).find_data_offset(head);
    let header_end = FIRST_SUB_MAP[head as usize] as usize;
    if start >= byte_size || data[header_end..start].iter().any(|&b| b != 0) {
        return Err(invalid_length("container structure is invalid".to_string()));
    }
    Ok(start)
}

fn indexed_layout(data: &[u8], head: u8) -> Result<Layout> {
    let w = width(head);
    let header = if w < 8 { 1 + 2 * w } else { 9 };
    need(data, header as u64 + 1, "container header")?;
    let byte_size = bounded(data, read_uint_at(data, 1, w)?, "container")?;

    let count = if w < 8 {
        read_uint_at(data, 1 + w, w)?
    } else {
        let at = byte_size
            .checked_sub(8)
            .ok_or_else(|| invalid_length("member count is out of bounds".to_string()))?;
        read_uint_at(data, at, 8)?
    };
    if count == 0 {
        return Err(invalid_length("container nrItems value is invalid".to_string()));
    }

    let table_len = count
        .checked_mul(w as u64)
        .and_then(|len| len.checked_add(if w == 8 { 8 } else { 0 }))
        .filter(|&len| len <= byte_size as u64)
        .ok_or_else(|| invalid_length("index table is out of bounds".to_string()))?;
    let base = byte_size - table_len as usize;
    let start = data_offset(data, head, byte_size)?;
    if base < start {
        return Err(invalid_length("index table is out of bounds".to_string()));
    }
    Ok(Layout {
        data_start: start,
        data_end: base,
        count,
        index: Some((base, w)),
        byte_size,
    })
}

fn compact_layout(data: &[u8]) -> Result<Layout> {
    need(data, 4, "compact container")?;
    let (declared, size_len) = decode_uleb128(&data[1..])?;
    if declared < 4 {
        return Err(invalid_length("compact container is too short".to_string()));
    }
    let byte_size = bounded(data, declared, "compact container")?;
    let (count, count_len) = decode_uleb128_reversed(&data[..byte_size])?;
    if count == 0 {
        return Err(invalid_length("compact container nrItems value is invalid".to_string()));
    }
    let data_start = 1 + size_len;
    let data_end = byte_size
        .checked_sub(count_len)
        .filter(|&end| end > data_start)
        .ok_or_else(|| invalid_length("compact container structure is invalid".to_string()))?;
    Ok(Layout {
        data_start,
        data_end,
        count,
        index: None,
        byte_size,
    })
}
