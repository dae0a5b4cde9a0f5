//! Scalar input values for the builder and their encodings

use vpack_format::constants::*;
use vpack_format::endian::{append_uint_le, int_length, uint_length};
use vpack_format::{Result, VPackError, ValueType};

/// A scalar value to be appended by a [`Builder`](crate::Builder)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'v> {
    /// No value; always rejected by the builder
    None,
    /// Illegal marker value
    Illegal,
    /// JSON null
    Null,
    /// Boolean
    Bool(bool),
    /// IEEE-754 double
    Double(f64),
    /// Signed integer, always encoded with an Int head
    Int(i64),
    /// Unsigned integer, always encoded with a UInt head
    UInt(u64),
    /// Integer in -6..=9, encoded in the head byte
    SmallInt(i64),
    /// Milliseconds since the Unix epoch
    UTCDate(i64),
    /// UTF-8 string
    String(&'v str),
    /// Opaque bytes
    Binary(&'v [u8]),
    /// MinKey
    MinKey,
    /// MaxKey
    MaxKey,
    /// Handle into an [`ExternalTable`](crate::ExternalTable)
    External(u64),
}

impl<'v> Value<'v> {
    /// Smallest integer encoding of a signed number
    pub fn int(v: i64) -> Self {
        if (-6..=9).contains(&v) {
            Value::SmallInt(v)
        } else if v < 0 {
            Value::Int(v)
        } else {
            Value::UInt(v as u64)
        }
    }

    /// Smallest integer encoding of an unsigned number
    pub fn uint(v: u64) -> Self {
        if v <= 9 {
            Value::SmallInt(v as i64)
        } else {
            Value::UInt(v)
        }
    }

    /// Type the encoded value will have
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::None => ValueType::None,
            Value::Illegal => ValueType::Illegal,
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Bool,
            Value::Double(_) => ValueType::Double,
            Value::Int(_) => ValueType::Int,
            Value::UInt(_) => ValueType::UInt,
            Value::SmallInt(_) => ValueType::SmallInt,
            Value::UTCDate(_) => ValueType::UTCDate,
            Value::String(_) => ValueType::String,
            Value::Binary(_) => ValueType::Binary,
            Value::MinKey => ValueType::MinKey,
            Value::MaxKey => ValueType::MaxKey,
            Value::External(_) => ValueType::External,
        }
    }

    /// Append the encoding of this value to `out`
    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        match *self {
            Value::None => {
                return Err(VPackError::BuilderUnexpectedType(
                    "cannot add a None value".to_string(),
                ))
            }
            Value::Illegal => out.push(HEAD_ILLEGAL),
            Value::Null => out.push(HEAD_NULL),
            Value::Bool(b) => out.push(if b { HEAD_TRUE } else { HEAD_FALSE }),
            Value::Double(d) => {
                out.push(HEAD_DOUBLE);
                append_uint_le(out, d.to_bits(), 8);
            }
            Value::Int(v) => encode_int(out, v),
            Value::UInt(v) => encode_uint(out, v),
            Value::SmallInt(v) => encode_small_int(out, v)?,
            Value::UTCDate(ms) => {
                out.push(HEAD_UTC_DATE);
                append_uint_le(out, ms as u64, 8);
            }
            Value::String(s) => encode_string(out, s),
            Value::Binary(b) => encode_binary(out, b),
            Value::MinKey => out.push(HEAD_MIN_KEY),
            Value::MaxKey => out.push(HEAD_MAX_KEY),
            Value::External(handle) => {
                out.push(HEAD_EXTERNAL);
                append_uint_le(out, handle, 8);
            }
        }
        Ok(())
    }
}

impl From<bool> for Value<'_> {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value<'_> {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<i64> for Value<'_> {
    fn from(v: i64) -> Self {
        Value::int(v)
    }
}

impl From<u64> for Value<'_> {
    fn from(v: u64) -> Self {
        Value::uint(v)
    }
}

impl<'v> From<&'v str> for Value<'v> {
    fn from(s: &'v str) -> Self {
        Value::String(s)
    }
}

/// Append a signed integer with an Int head of minimal width
pub fn encode_int(out: &mut Vec<u8>, v: i64) {
    let width = int_length(v);
    out.push(HEAD_INT_1 + (width as u8 - 1));
    append_uint_le(out, v as u64, width);
}

/// Append an unsigned integer with a UInt head of minimal width
pub fn encode_uint(out: &mut Vec<u8>, v: u64) {
    let width = uint_length(v);
    out.push(HEAD_UINT_1 + (width as u8 - 1));
    append_uint_le(out, v, width);
}

/// Append a SmallInt; `v` must lie in -6..=9
pub fn encode_small_int(out: &mut Vec<u8>, v: i64) -> Result<()> {
    match v {
        0..=9 => out.push(HEAD_SMALL_INT_0 + v as u8),
        -6..=-1 => out.push((HEAD_SMALL_INT_MINUS_6 as i64 + 6 + v) as u8),
        _ => return Err(VPackError::NumberOutOfRange),
    }
    Ok(())
}

/// Append a String value, short form when it fits
pub fn encode_string(out: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    if bytes.len() <= MAX_SHORT_STRING_LEN {
        out.push(HEAD_SHORT_STRING_0 + bytes.len() as u8);
    } else {
        out.push(HEAD_LONG_STRING);
        append_uint_le(out, bytes.len() as u64, 8);
    }
    out.extend_from_slice(bytes);
}

/// Append a Binary value with a minimal length field
pub fn encode_binary(out: &mut Vec<u8>, b: &[u8]) {
    let width = uint_length(b.len() as u64);
    out.push(HEAD_BINARY_1 + (width as u8 - 1));
    append_uint_le(out, b.len() as u64, width);
    out.extend_from_slice(b);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(v: Value<'_>) -> Vec<u8> {
        let mut out = Vec::new();
        v.encode(&mut out).unwrap();
        out
    }

    #[test]
    fn test_scalar_encodings() {
        assert_eq!(encoded(Value::Null), vec![0x18]);
        assert_eq!(encoded(Value::Bool(true)), vec![0x1a]);
        assert_eq!(encoded(Value::UInt(12)), vec![0x28, 0x0c]);
        assert_eq!(encoded(Value::UInt(1200)), vec![0x29, 0xb0, 0x04]);
        assert_eq!(encoded(Value::Int(-1)), vec![0x20, 0xff]);
        assert_eq!(encoded(Value::Int(128)), vec![0x21, 0x80, 0x00]);
        assert_eq!(encoded(Value::SmallInt(1)), vec![0x31]);
        assert_eq!(encoded(Value::SmallInt(-1)), vec![0x3f]);
        assert_eq!(encoded(Value::SmallInt(-6)), vec![0x3a]);
        assert_eq!(encoded(Value::String("abc")), vec![0x43, b'a', b'b', b'c']);
        assert_eq!(encoded(Value::Binary(&[1, 2])), vec![0xc0, 0x02, 1, 2]);
        assert_eq!(
            encoded(Value::Double(2.3)),
            [vec![0x1b], 2.3f64.to_bits().to_le_bytes().to_vec()].concat()
        );
    }

    #[test]
    fn test_long_string_encoding() {
        let s = "a".repeat(300);
        let out = encoded(Value::String(&s));
        assert_eq!(out[0], 0xbf);
        assert_eq!(&out[1..9], &[0x2c, 0x01, 0, 0, 0, 0, 0, 0]);
        assert_eq!(out.len(), 309);

        let s = "b".repeat(126);
        assert_eq!(encoded(Value::String(&s))[0], 0xbe);
    }

    #[test]
    fn test_smallest_integer_selection() {
        assert_eq!(Value::int(9), Value::SmallInt(9));
        assert_eq!(Value::int(-6), Value::SmallInt(-6));
        assert_eq!(Value::int(-7), Value::Int(-7));
        assert_eq!(Value::int(10), Value::UInt(10));
        assert_eq!(Value::uint(u64::MAX), Value::UInt(u64::MAX));
    }

    #[test]
    fn test_rejected_values() {
        let mut out = Vec::new();
        assert!(matches!(
            Value::None.encode(&mut out),
            Err(VPackError::BuilderUnexpectedType(_))
        ));
        assert!(matches!(
            Value::SmallInt(10).encode(&mut out),
            Err(VPackError::NumberOutOfRange)
        ));
        assert!(out.is_empty());
    }
}
