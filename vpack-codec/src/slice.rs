//! Non-owning reader over an encoded value
//!
//! A [`Slice`] borrows a byte buffer whose first byte is the head of a value.
//! Lengths stored in the buffer are trusted, but every read is bounds-checked
//! against the borrowed bytes: a truncated or inconsistent buffer produces an
//! error instead of a panic. Run the [`Validator`](crate::Validator) first to
//! rule out structural inconsistencies altogether.
//!
//! Tags are transparent: [`Slice::kind`] and all getters look through any
//! number of tag prefixes. Use [`Slice::raw_kind`], [`Slice::tags`] and
//! [`Slice::value`] to inspect them explicitly.

use std::cmp::Ordering;
use std::fmt;

use smallvec::SmallVec;
use vpack_format::constants::*;
use vpack_format::endian::{read_uint_at, sign_extend, to_usize};
use vpack_format::tables::{fixed_length, value_type, width, FIRST_SUB_MAP};
use vpack_format::varint::{decode_uleb128, decode_uleb128_reversed};
use vpack_format::{Result, VPackError, ValueType};

use crate::external::ExternalTable;
use crate::iterator::{ArrayIterator, ObjectIterator};
use crate::translator::AttributeTranslator;

static NONE_BYTES: [u8; 1] = [HEAD_NONE];

/// Borrowed view of one encoded value
#[derive(Clone, Copy)]
pub struct Slice<'a> {
    data: &'a [u8],
    translator: Option<&'a AttributeTranslator>,
}

/// Decomposed BCD value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bcd<'a> {
    /// 1 or -1
    pub sign: i8,
    /// Decimal exponent
    pub exponent: i32,
    /// Packed decimal digits, two per byte
    pub mantissa: &'a [u8],
}

impl<'a> Slice<'a> {
    /// View over `data`; an empty buffer reads as None
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            translator: None,
        }
    }

    /// View over `data` translating integer object keys with `translator`
    pub fn with_translator(data: &'a [u8], translator: &'a AttributeTranslator) -> Self {
        Self {
            data,
            translator: Some(translator),
        }
    }

    /// The None value (head 0x00)
    pub fn none() -> Slice<'static> {
        Slice {
            data: &NONE_BYTES,
            translator: None,
        }
    }

    /// Attribute translator attached to this view
    pub fn translator(&self) -> Option<&'a AttributeTranslator> {
        self.translator
    }

    fn make(&self, data: &'a [u8]) -> Slice<'a> {
        Slice {
            data,
            translator: self.translator,
        }
    }

    /// Sub-slice starting `offset` bytes into this value
    fn at_offset(&self, offset: u64) -> Result<Slice<'a>> {
        let offset = to_usize(offset)?;
        if offset >= self.data.len() {
            return Err(VPackError::truncated(self.raw_kind().name()));
        }
        Ok(self.make(&self.data[offset..]))
    }

    fn read_uint(&self, offset: u64, width: usize) -> Result<u64> {
        read_uint_at(self.data, to_usize(offset)?, width)
    }

    fn bytes(&self, offset: u64, len: u64) -> Result<&'a [u8]> {
        let start = to_usize(offset)?;
        let end = start
            .checked_add(to_usize(len)?)
            .ok_or_else(|| VPackError::truncated(self.raw_kind().name()))?;
        self.data
            .get(start..end)
            .ok_or_else(|| VPackError::truncated(self.raw_kind().name()))
    }

    // ---- head and type ----

    /// First byte of the buffer, tags included (0 for an empty buffer)
    pub fn raw_head(&self) -> u8 {
        self.data.first().copied().unwrap_or(HEAD_NONE)
    }

    /// Head byte of the value behind any tags
    pub fn head(&self) -> u8 {
        self.value().raw_head()
    }

    /// Type of the first byte, `Tagged` for a tagged value
    pub fn raw_kind(&self) -> ValueType {
        value_type(self.raw_head())
    }

    /// Type of the value behind any tags
    pub fn kind(&self) -> ValueType {
        value_type(self.head())
    }

    /// Name of [`Slice::kind`]
    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    /// Whether this is the None value
    pub fn is_none(&self) -> bool {
        self.kind() == ValueType::None
    }
    /// Whether this is Illegal
    pub fn is_illegal(&self) -> bool {
        self.kind() == ValueType::Illegal
    }
    /// Whether this is Null
    pub fn is_null(&self) -> bool {
        self.kind() == ValueType::Null
    }
    /// Whether this is a Bool
    pub fn is_bool(&self) -> bool {
        self.kind() == ValueType::Bool
    }
    /// Whether this is `true`
    pub fn is_true(&self) -> bool {
        self.head() == HEAD_TRUE
    }
    /// Whether this is `false`
    pub fn is_false(&self) -> bool {
        self.head() == HEAD_FALSE
    }
    /// Whether this is an Array
    pub fn is_array(&self) -> bool {
        self.kind() == ValueType::Array
    }
    /// Whether this is an Object
    pub fn is_object(&self) -> bool {
        self.kind() == ValueType::Object
    }
    /// Whether this is a Double
    pub fn is_double(&self) -> bool {
        self.kind() == ValueType::Double
    }
    /// Whether this is a UTCDate
    pub fn is_utc_date(&self) -> bool {
        self.kind() == ValueType::UTCDate
    }
    /// Whether this is an External
    pub fn is_external(&self) -> bool {
        self.kind() == ValueType::External
    }
    /// Whether this is MinKey
    pub fn is_min_key(&self) -> bool {
        self.kind() == ValueType::MinKey
    }
    /// Whether this is MaxKey
    pub fn is_max_key(&self) -> bool {
        self.kind() == ValueType::MaxKey
    }
    /// Whether this is an Int
    pub fn is_int(&self) -> bool {
        self.kind() == ValueType::Int
    }
    /// Whether this is a UInt
    pub fn is_uint(&self) -> bool {
        self.kind() == ValueType::UInt
    }
    /// Whether this is a SmallInt
    pub fn is_small_int(&self) -> bool {
        self.kind() == ValueType::SmallInt
    }
    /// Whether this is an Int, UInt or SmallInt
    pub fn is_integer(&self) -> bool {
        self.kind().is_integer()
    }
    /// Whether this is an integer or a Double
    pub fn is_number(&self) -> bool {
        self.kind().is_number()
    }
    /// Whether this is a String
    pub fn is_string(&self) -> bool {
        self.kind() == ValueType::String
    }
    /// Whether this is Binary
    pub fn is_binary(&self) -> bool {
        self.kind() == ValueType::Binary
    }
    /// Whether this is BCD
    pub fn is_bcd(&self) -> bool {
        self.kind() == ValueType::BCD
    }
    /// Whether this is a Custom value
    pub fn is_custom(&self) -> bool {
        self.kind() == ValueType::Custom
    }
    /// Whether the value carries at least one tag
    pub fn is_tagged(&self) -> bool {
        self.raw_kind() == ValueType::Tagged
    }
    /// Whether this is an empty Array
    pub fn is_empty_array(&self) -> bool {
        self.head() == HEAD_EMPTY_ARRAY
    }
    /// Whether this is an empty Object
    pub fn is_empty_object(&self) -> bool {
        self.head() == HEAD_EMPTY_OBJECT
    }
    /// Whether this is an Object whose index table is sorted by key
    pub fn is_sorted(&self) -> bool {
        (HEAD_OBJECT_SORTED_1..=HEAD_OBJECT_SORTED_8).contains(&self.head())
    }
    /// Whether this is a compact Array or Object
    pub fn is_compact(&self) -> bool {
        matches!(self.head(), HEAD_COMPACT_ARRAY | HEAD_COMPACT_OBJECT)
    }

    // ---- tags ----

    fn tags_offset(&self) -> usize {
        let mut offset = 0;
        loop {
            match self.data.get(offset) {
                Some(&HEAD_TAGGED_1) => offset += 2,
                Some(&HEAD_TAGGED_8) => offset += 9,
                _ => return offset,
            }
        }
    }

    fn tag_at(&self, offset: usize) -> Option<(u64, usize)> {
        match self.data.get(offset)? {
            &HEAD_TAGGED_1 => Some((*self.data.get(offset + 1)? as u64, 2)),
            &HEAD_TAGGED_8 => Some((read_uint_at(self.data, offset + 1, 8).ok()?, 9)),
            _ => None,
        }
    }

    /// The value with all tags stripped
    pub fn value(&self) -> Slice<'a> {
        let offset = self.tags_offset();
        self.make(self.data.get(offset..).unwrap_or(&[]))
    }

    /// All tags, outermost first
    pub fn tags(&self) -> SmallVec<[u64; 4]> {
        let mut tags = SmallVec::new();
        let mut offset = 0;
        while let Some((tag, len)) = self.tag_at(offset) {
            tags.push(tag);
            offset += len;
        }
        tags
    }

    /// Whether `tag` is among the value's tags
    pub fn has_tag(&self, tag: u64) -> bool {
        self.tags().contains(&tag)
    }

    /// Outermost tag, if any
    pub fn first_tag(&self) -> Option<u64> {
        self.tag_at(0).map(|(tag, _)| tag)
    }

    // ---- sizes ----

    /// Total length of the value in bytes, tags included
    ///
    /// Trusts the length fields in the header; only fails when the header
    /// itself lies outside the buffer or names a reserved head byte.
    pub fn byte_size(&self) -> Result<u64> {
        let tags = self.tags_offset();
        if tags == 0 {
            return self.untagged_byte_size();
        }
        let inner = self.value();
        if inner.data.is_empty() {
            return Err(VPackError::truncated("Tagged value"));
        }
        (tags as u64)
            .checked_add(inner.untagged_byte_size()?)
            .ok_or_else(size_overflow)
    }

    /// Length of the value behind any tags
    pub fn value_byte_size(&self) -> Result<u64> {
        self.value().untagged_byte_size()
    }

    fn untagged_byte_size(&self) -> Result<u64> {
        let head = self.raw_head();
        if let Some(len) = fixed_length(head) {
            return Ok(len);
        }
        match head {
            0x02..=0x09 | 0x0b..=0x12 => self.read_uint(1, width(head)),
            HEAD_COMPACT_ARRAY | HEAD_COMPACT_OBJECT => {
                let rest = self
                    .data
                    .get(1..)
                    .ok_or_else(|| VPackError::truncated("compact container"))?;
                decode_uleb128(rest).map(|(size, _)| size)
            }
            HEAD_LONG_STRING => plus(1 + 8, self.read_uint(1, 8)?),
            0xc0..=0xc7 => {
                let w = (head - 0xbf) as usize;
                plus(1 + w as u64, self.read_uint(1, w)?)
            }
            HEAD_BCD_FIRST..=HEAD_BCD_LAST => {
                let w = bcd_length_width(head);
                plus(1 + w as u64 + 4, self.read_uint(1, w)?)
            }
            0xf4..=0xff => {
                let w = custom_length_width(head);
                plus(1 + w as u64, self.read_uint(1, w)?)
            }
            _ => Err(VPackError::InvalidValueType(format!(
                "invalid head byte 0x{:02x}",
                head
            ))),
        }
    }

    /// The bytes of this value, trimmed to its byte size when it fits
    pub fn as_bytes(&self) -> &'a [u8] {
        match self.byte_size().ok().and_then(|n| usize::try_from(n).ok()) {
            Some(n) if n <= self.data.len() => &self.data[..n],
            _ => self.data,
        }
    }

    // ---- scalars ----

    fn expect_kind(&self, kind: ValueType) -> Result<Slice<'a>> {
        let v = self.value();
        if v.kind() != kind {
            return Err(VPackError::InvalidValueType(format!(
                "Expecting type {}, got {}",
                kind,
                v.kind()
            )));
        }
        Ok(v)
    }

    /// Value of a Bool
    pub fn get_bool(&self) -> Result<bool> {
        Ok(self.expect_kind(ValueType::Bool)?.raw_head() == HEAD_TRUE)
    }

    /// Value of a Double
    pub fn get_double(&self) -> Result<f64> {
        let v = self.expect_kind(ValueType::Double)?;
        Ok(f64::from_bits(v.read_uint(1, 8)?))
    }

    /// Value of any integer type as i64
    pub fn get_int(&self) -> Result<i64> {
        let v = self.value();
        let head = v.raw_head();
        match v.kind() {
            ValueType::Int => {
                let w = (head - 0x1f) as usize;
                Ok(sign_extend(v.read_uint(1, w)?, w))
            }
            ValueType::SmallInt => Ok(small_int_value(head)),
            ValueType::UInt => {
                i64::try_from(v.get_uint()?).map_err(|_| VPackError::NumberOutOfRange)
            }
            other => Err(VPackError::InvalidValueType(format!(
                "Expecting type Int, got {}",
                other
            ))),
        }
    }

    /// Value of any integer type as u64
    pub fn get_uint(&self) -> Result<u64> {
        let v = self.value();
        let head = v.raw_head();
        match v.kind() {
            ValueType::UInt => v.read_uint(1, (head - 0x27) as usize),
            ValueType::Int | ValueType::SmallInt => {
                u64::try_from(v.get_int()?).map_err(|_| VPackError::NumberOutOfRange)
            }
            other => Err(VPackError::InvalidValueType(format!(
                "Expecting type UInt, got {}",
                other
            ))),
        }
    }

    /// Value of a SmallInt, or of any other integer type
    pub fn get_small_int(&self) -> Result<i64> {
        self.get_int()
    }

    /// Milliseconds since the epoch of a UTCDate
    pub fn get_utc_date(&self) -> Result<i64> {
        let v = self.expect_kind(ValueType::UTCDate)?;
        Ok(v.read_uint(1, 8)? as i64)
    }

    /// Convert any number to `T`, failing when it does not fit
    pub fn get_number<T: FromNumber>(&self) -> Result<T> {
        T::from_slice(self)
    }

    /// Whether the value is a number that fits `T`
    pub fn is_number_of<T: FromNumber>(&self) -> bool {
        self.get_number::<T>().is_ok()
    }

    /// Raw payload of a String
    pub fn get_string_bytes(&self) -> Result<&'a [u8]> {
        let v = self.expect_kind(ValueType::String)?;
        let head = v.raw_head();
        if head == HEAD_LONG_STRING {
            let len = v.read_uint(1, 8)?;
            v.bytes(9, len)
        } else {
            v.bytes(1, (head - HEAD_SHORT_STRING_0) as u64)
        }
    }

    /// Payload of a String as `&str`
    pub fn get_str(&self) -> Result<&'a str> {
        std::str::from_utf8(self.get_string_bytes()?).map_err(|_| VPackError::InvalidUtf8Sequence)
    }

    /// Owned copy of a String
    pub fn copy_string(&self) -> Result<String> {
        self.get_str().map(str::to_string)
    }

    /// Byte length of a String
    pub fn string_length(&self) -> Result<u64> {
        let v = self.expect_kind(ValueType::String)?;
        let head = v.raw_head();
        if head == HEAD_LONG_STRING {
            v.read_uint(1, 8)
        } else {
            Ok((head - HEAD_SHORT_STRING_0) as u64)
        }
    }

    /// Byte-wise comparison of a String with `other`
    pub fn compare_string(&self, other: &str) -> Result<Ordering> {
        Ok(self.get_string_bytes()?.cmp(other.as_bytes()))
    }

    /// Whether the value is a String equal to `other`
    pub fn is_equal_string(&self, other: &str) -> bool {
        matches!(self.get_string_bytes(), Ok(bytes) if bytes == other.as_bytes())
    }

    /// Payload of a Binary
    pub fn get_binary(&self) -> Result<&'a [u8]> {
        let v = self.expect_kind(ValueType::Binary)?;
        let w = (v.raw_head() - 0xbf) as usize;
        let len = v.read_uint(1, w)?;
        v.bytes(1 + w as u64, len)
    }

    /// Byte length of a Binary payload
    pub fn get_binary_length(&self) -> Result<u64> {
        let v = self.expect_kind(ValueType::Binary)?;
        v.read_uint(1, (v.raw_head() - 0xbf) as usize)
    }

    /// Owned copy of a Binary payload
    pub fn copy_binary(&self) -> Result<Vec<u8>> {
        self.get_binary().map(<[u8]>::to_vec)
    }

    /// Handle stored in an External
    pub fn get_external(&self) -> Result<u64> {
        let v = self.expect_kind(ValueType::External)?;
        v.read_uint(1, 8)
    }

    /// Sign, exponent and mantissa bytes of a BCD
    pub fn get_bcd(&self) -> Result<Bcd<'a>> {
        let v = self.expect_kind(ValueType::BCD)?;
        let head = v.raw_head();
        let w = bcd_length_width(head);
        let mantissa_len = v.read_uint(1, w)?;
        let exponent = v.read_uint(1 + w as u64, 4)? as u32 as i32;
        Ok(Bcd {
            sign: if head <= 0xcf { 1 } else { -1 },
            exponent,
            mantissa: v.bytes(1 + w as u64 + 4, mantissa_len)?,
        })
    }

    // ---- externals ----

    /// Follow one External indirection; other values are returned unchanged
    pub fn resolve_external<'t>(&self, table: &'t ExternalTable) -> Result<Slice<'t>>
    where
        'a: 't,
    {
        if self.is_external() {
            table.resolve(self.get_external()?)
        } else {
            Ok(*self)
        }
    }

    /// Follow External indirections until a non-External value is reached
    pub fn resolve_externals<'t>(&self, table: &'t ExternalTable) -> Result<Slice<'t>>
    where
        'a: 't,
    {
        let mut current: Slice<'t> = *self;
        // each hop lands on a table entry, so a longer chain must be a cycle
        for _ in 0..=table.len() {
            if !current.is_external() {
                return Ok(current);
            }
            current = table.resolve(current.get_external()?)?;
        }
        Err(VPackError::InvalidValueType(
            "cyclic chain of External values".to_string(),
        ))
    }

    // ---- containers ----

    /// Number of members of an Array or Object, or byte length of a String or Binary
    pub fn length(&self) -> Result<u64> {
        let v = self.value();
        match v.kind() {
            ValueType::Array | ValueType::Object => v.member_count(),
            ValueType::String => v.string_length(),
            ValueType::Binary => v.get_binary_length(),
            other => Err(VPackError::InvalidValueType(format!(
                "Expecting type Array, Object, String or Binary, got {}",
                other
            ))),
        }
    }

    /// Member count of an untagged container
    pub(crate) fn member_count(&self) -> Result<u64> {
        let head = self.raw_head();
        match head {
            HEAD_EMPTY_ARRAY | HEAD_EMPTY_OBJECT => Ok(0),
            HEAD_COMPACT_ARRAY | HEAD_COMPACT_OBJECT => {
                let end = to_usize(self.untagged_byte_size()?)?;
                let bytes = self
                    .data
                    .get(..end)
                    .ok_or_else(|| VPackError::truncated("compact container"))?;
                decode_uleb128_reversed(bytes).map(|(n, _)| n)
            }
            0x02..=0x05 => {
                let end = self.read_uint(1, width(head))?;
                let offset = self.find_data_offset(head) as u64;
                let item_size = self.at_offset(offset)?.byte_size()?;
                let payload = end
                    .checked_sub(offset)
                    .ok_or_else(|| VPackError::ValidatorInvalidLength("Array too short".into()))?;
                if item_size == 0 {
                    return Err(VPackError::ValidatorInvalidLength(
                        "Array member with zero length".into(),
                    ));
                }
                Ok(payload / item_size)
            }
            0x06..=0x12 => {
                let w = width(head);
                if w < 8 {
                    self.read_uint(1 + w as u64, w)
                } else {
                    let end = self.read_uint(1, 8)?;
                    let at = end
                        .checked_sub(8)
                        .ok_or_else(|| VPackError::truncated("member count"))?;
                    self.read_uint(at, 8)
                }
            }
            _ => Err(VPackError::InvalidValueType(
                "Expecting type Array or Object".to_string(),
            )),
        }
    }

    /// Offset of the first member of a non-compact, non-empty container
    ///
    /// Zero bytes between the minimum offset and the first member are padding.
    pub(crate) fn find_data_offset(&self, head: u8) -> usize {
        let first = FIRST_SUB_MAP[head as usize];
        let non_zero = |i: usize| matches!(self.data.get(i), Some(&b) if b != 0);
        if first <= 2 && non_zero(2) {
            2
        } else if first <= 3 && non_zero(3) {
            3
        } else if first <= 5 && non_zero(5) {
            5
        } else {
            9
        }
    }

    /// Offset of the first member of a compact container
    pub(crate) fn compact_data_offset(&self) -> Result<u64> {
        let rest = self
            .data
            .get(1..)
            .ok_or_else(|| VPackError::truncated("compact container"))?;
        decode_uleb128(rest).map(|(_, len)| 1 + len as u64)
    }

    /// Offset of the first member of any non-empty untagged container
    pub(crate) fn first_member_offset(&self) -> Result<u64> {
        match self.raw_head() {
            HEAD_COMPACT_ARRAY | HEAD_COMPACT_OBJECT => self.compact_data_offset(),
            head => Ok(self.find_data_offset(head) as u64),
        }
    }

    /// Start of the index table and its entry width for an indexed container
    pub(crate) fn index_table(&self, n: u64) -> Result<(u64, usize)> {
        let head = self.raw_head();
        let w = width(head);
        let end = self.read_uint(1, w)?;
        let table_len = n
            .checked_mul(w as u64)
            .and_then(|len| len.checked_add(if w == 8 { 8 } else { 0 }))
            .ok_or_else(size_overflow)?;
        let base = end
            .checked_sub(table_len)
            .ok_or_else(|| VPackError::truncated("index table"))?;
        Ok((base, w))
    }

    /// Offset of member `index` of an untagged container with `n` members
    fn nth_offset(&self, index: u64, n: u64) -> Result<u64> {
        let head = self.raw_head();
        match head {
            HEAD_COMPACT_ARRAY | HEAD_COMPACT_OBJECT => {
                let mut offset = self.compact_data_offset()?;
                let step = if head == HEAD_COMPACT_OBJECT { 2 } else { 1 };
                let steps = index.checked_mul(step).ok_or_else(size_overflow)?;
                for _ in 0..steps {
                    offset = plus(offset, self.at_offset(offset)?.byte_size()?)?;
                }
                Ok(offset)
            }
            0x02..=0x05 => {
                let offset = self.find_data_offset(head) as u64;
                let item_size = self.at_offset(offset)?.byte_size()?;
                plus(offset, index.checked_mul(item_size).ok_or_else(size_overflow)?)
            }
            _ => {
                let (base, w) = self.index_table(n)?;
                self.read_uint(base + index * w as u64, w)
            }
        }
    }

    /// Member `index` of an Array
    pub fn at(&self, index: u64) -> Result<Slice<'a>> {
        let v = self.value();
        if !v.is_array() {
            return Err(VPackError::InvalidValueType(
                "Expecting type Array".to_string(),
            ));
        }
        let n = v.member_count()?;
        if index >= n {
            return Err(VPackError::IndexOutOfBounds);
        }
        v.at_offset(v.nth_offset(index, n)?)
    }

    fn object_member(&self, index: u64) -> Result<(Slice<'a>, u64)> {
        let v = self.value();
        if !v.is_object() {
            return Err(VPackError::InvalidValueType(
                "Expecting type Object".to_string(),
            ));
        }
        let n = v.member_count()?;
        if index >= n {
            return Err(VPackError::IndexOutOfBounds);
        }
        let offset = v.nth_offset(index, n)?;
        Ok((v.at_offset(offset)?, offset))
    }

    /// Key of member `index` of an Object, in index table order
    ///
    /// With `translate`, integer keys are replaced by their string.
    pub fn key_at(&self, index: u64, translate: bool) -> Result<Slice<'a>> {
        let (key, _) = self.object_member(index)?;
        if translate {
            key.translate()
        } else {
            Ok(key)
        }
    }

    /// Value of member `index` of an Object, in index table order
    pub fn value_at(&self, index: u64) -> Result<Slice<'a>> {
        let (key, offset) = self.object_member(index)?;
        self.value().at_offset(plus(offset, key.byte_size()?)?)
    }

    /// Translate an integer key into its string; strings are returned unchanged
    pub fn translate(&self) -> Result<Slice<'a>> {
        let v = self.value();
        match v.kind() {
            ValueType::String => Ok(v),
            ValueType::SmallInt | ValueType::UInt => {
                let translator = self.translator.ok_or_else(|| {
                    VPackError::InvalidValueType(
                        "Cannot translate key without an attribute translator".to_string(),
                    )
                })?;
                translator.key_of(v.get_uint()?).ok_or_else(|| {
                    VPackError::InvalidValueType("Cannot translate key".to_string())
                })
            }
            _ => Err(VPackError::KeyNotString),
        }
    }

    /// Translated key when possible, otherwise the key itself
    pub(crate) fn translate_lenient(&self) -> Slice<'a> {
        self.translate().unwrap_or(*self)
    }

    /// String bytes a key compares by, translating integer keys
    pub(crate) fn key_bytes(&self) -> Option<&'a [u8]> {
        self.translate().ok()?.get_string_bytes().ok()
    }

    /// Look up `attribute` in an Object
    ///
    /// Returns the None slice when the key is absent.
    pub fn get(&self, attribute: &str) -> Result<Slice<'a>> {
        let v = self.value();
        if !v.is_object() {
            return Err(VPackError::InvalidValueType(
                "Expecting type Object".to_string(),
            ));
        }
        let attr = attribute.as_bytes();
        let head = v.raw_head();
        if head == HEAD_EMPTY_OBJECT {
            return Ok(Slice::none());
        }
        if head == HEAD_COMPACT_OBJECT {
            for member in v.object_iter_raw()? {
                let (key, value) = member?;
                if key.key_bytes() == Some(attr) {
                    return Ok(value);
                }
            }
            return Ok(Slice::none());
        }

        let n = v.member_count()?;
        let (base, w) = v.index_table(n)?;
        if v.is_sorted() && n >= SORTED_SEARCH_THRESHOLD {
            if let Some(found) = v.search_binary(attr, base, w, n)? {
                return Ok(found);
            }
        }
        v.search_linear(attr, base, w, n)
    }

    fn member_value(&self, key_offset: u64) -> Result<(Slice<'a>, Slice<'a>)> {
        let key = self.at_offset(key_offset)?;
        let value = self.at_offset(plus(key_offset, key.byte_size()?)?)?;
        Ok((key, value))
    }

    fn search_linear(&self, attr: &[u8], base: u64, w: usize, n: u64) -> Result<Slice<'a>> {
        for i in 0..n {
            let offset = self.read_uint(base + i * w as u64, w)?;
            let (key, value) = self.member_value(offset)?;
            if key.key_bytes() == Some(attr) {
                return Ok(value);
            }
        }
        Ok(Slice::none())
    }

    /// Binary search over a sorted index table, seeded by the key's first byte
    fn search_binary(&self, attr: &[u8], base: u64, w: usize, n: u64) -> Result<Option<Slice<'a>>> {
        let mut low = 0u64;
        let mut high = n - 1;
        let mut index = match attr.first() {
            Some(&c) if c < 128 => ((high as u128 * c as u128) / 128) as u64,
            _ => high / 2,
        };

        loop {
            let offset = self.read_uint(base + index * w as u64, w)?;
            let (key, value) = self.member_value(offset)?;
            let Some(key_bytes) = key.key_bytes() else {
                return Ok(None);
            };
            match key_bytes.cmp(attr) {
                Ordering::Equal => {
                    return self.first_equal(attr, base, w, index, value).map(Some);
                }
                Ordering::Greater => {
                    if index == 0 {
                        return Ok(None);
                    }
                    high = index - 1;
                }
                Ordering::Less => low = index + 1,
            }
            if high < low {
                return Ok(None);
            }
            index = low + (high - low) / 2;
        }
    }

    /// Walk back from a binary search hit to the first entry with the same key
    fn first_equal(
        &self,
        attr: &[u8],
        base: u64,
        w: usize,
        mut index: u64,
        mut value: Slice<'a>,
    ) -> Result<Slice<'a>> {
        while index > 0 {
            let offset = self.read_uint(base + (index - 1) * w as u64, w)?;
            let (key, previous) = self.member_value(offset)?;
            if key.key_bytes() != Some(attr) {
                break;
            }
            index -= 1;
            value = previous;
        }
        Ok(value)
    }

    /// Whether an Object contains `attribute`
    pub fn has_key(&self, attribute: &str) -> Result<bool> {
        Ok(!self.get(attribute)?.is_none())
    }

    /// Follow a path of keys through nested Objects
    ///
    /// Returns the None slice when a key is missing or an intermediate value
    /// is not an Object.
    pub fn get_path(&self, path: &[&str]) -> Result<Slice<'a>> {
        let Some((last, init)) = path.split_last() else {
            return Err(VPackError::InvalidAttributePath);
        };
        let mut current = *self;
        for key in init {
            current = current.get(key)?;
            if !current.is_object() {
                return Ok(Slice::none());
            }
        }
        current.get(last)
    }

    /// Members of an Array of exactly `N` elements
    pub fn tuple<const N: usize>(&self) -> Result<[Slice<'a>; N]> {
        let iter = self.array_iter()?;
        if iter.len() != N {
            return Err(VPackError::BadTupleSize);
        }
        let mut out: [Slice<'a>; N] = [Slice::none(); N];
        for (slot, member) in out.iter_mut().zip(iter) {
            *slot = member?;
        }
        Ok(out)
    }

    /// Iterator over the members of an Array
    pub fn array_iter(&self) -> Result<ArrayIterator<'a>> {
        ArrayIterator::new(self.value())
    }

    /// Iterator over the members of an Object, translating integer keys
    pub fn object_iter(&self) -> Result<ObjectIterator<'a>> {
        ObjectIterator::new(self.value(), true)
    }

    /// Iterator over the members of an Object, keys as stored
    pub fn object_iter_raw(&self) -> Result<ObjectIterator<'a>> {
        ObjectIterator::new(self.value(), false)
    }

    /// Sub-slice at an offset known to come from this container's layout
    pub(crate) fn member_at(&self, offset: u64) -> Result<Slice<'a>> {
        self.at_offset(offset)
    }

    /// Index table entry `index` of width `w` starting at `base`
    pub(crate) fn index_entry(&self, base: u64, w: usize, index: u64) -> Result<u64> {
        self.read_uint(base + index * w as u64, w)
    }

    // ---- comparison and rendering ----

    /// Whether both values have identical encodings
    pub fn binary_equals(&self, other: &Slice<'_>) -> bool {
        self.as_bytes() == other.as_bytes()
    }

    /// Hex dump of the value's bytes
    pub fn to_hex(&self) -> String {
        self.as_bytes()
            .iter()
            .map(|b| format!("0x{:02x}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Debug for Slice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Slice {} (0x{:02x}), byteSize: ", self.raw_kind(), self.raw_head())?;
        match self.byte_size() {
            Ok(n) => write!(f, "{}]", n),
            Err(_) => write!(f, "?]"),
        }
    }
}

impl<'a> From<&'a [u8]> for Slice<'a> {
    fn from(data: &'a [u8]) -> Self {
        Slice::new(data)
    }
}

fn plus(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b).ok_or_else(size_overflow)
}

fn size_overflow() -> VPackError {
    VPackError::ValidatorInvalidLength("byte size overflows u64".to_string())
}

fn small_int_value(head: u8) -> i64 {
    if head <= 0x39 {
        (head - HEAD_SMALL_INT_0) as i64
    } else {
        head as i64 - 0x40
    }
}

fn bcd_length_width(head: u8) -> usize {
    if head <= 0xcf {
        (head - 0xc7) as usize
    } else {
        (head - 0xcf) as usize
    }
}

/// Width of the length field of a Custom head in 0xf4..=0xff
pub(crate) fn custom_length_width(head: u8) -> usize {
    match head {
        0xf4..=0xf6 => 1,
        0xf7..=0xf9 => 2,
        0xfa..=0xfc => 4,
        _ => 8,
    }
}

/// Numeric types a number slice can be converted to
pub trait FromNumber: Sized {
    /// Convert, failing with `NumberOutOfRange` when the value does not fit
    fn from_slice(slice: &Slice<'_>) -> Result<Self>;
}

macro_rules! impl_from_number_int {
    ($($t:ty),*) => {
        $(
            impl FromNumber for $t {
                fn from_slice(slice: &Slice<'_>) -> Result<Self> {
                    match slice.kind() {
                        ValueType::Int | ValueType::SmallInt => {
                            <$t>::try_from(slice.get_int()?).map_err(|_| VPackError::NumberOutOfRange)
                        }
                        ValueType::UInt => {
                            <$t>::try_from(slice.get_uint()?).map_err(|_| VPackError::NumberOutOfRange)
                        }
                        ValueType::Double => {
                            let d = slice.get_double()?;
                            if d.is_nan() || d < <$t>::MIN as f64 || d > <$t>::MAX as f64 {
                                return Err(VPackError::NumberOutOfRange);
                            }
                            Ok(d as $t)
                        }
                        other => Err(VPackError::InvalidValueType(format!(
                            "Expecting numeric type, got {}",
                            other
                        ))),
                    }
                }
            }
        )*
    };
}

impl_from_number_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! impl_from_number_float {
    ($($t:ty),*) => {
        $(
            impl FromNumber for $t {
                fn from_slice(slice: &Slice<'_>) -> Result<Self> {
                    match slice.kind() {
                        ValueType::Int | ValueType::SmallInt => Ok(slice.get_int()? as $t),
                        ValueType::UInt => Ok(slice.get_uint()? as $t),
                        ValueType::Double => Ok(slice.get_double()? as $t),
                        other => Err(VPackError::InvalidValueType(format!(
                            "Expecting numeric type, got {}",
                            other
                        ))),
                    }
                }
            }
        )*
    };
}

impl_from_number_float!(f32, f64);
