//! Head byte constants for the VPack encoding

/// Placeholder for "no value"; never a valid container member.
pub const HEAD_NONE: u8 = 0x00;
/// Empty array.
pub const HEAD_EMPTY_ARRAY: u8 = 0x01;
/// First array head without index table (1-byte byte size).
pub const HEAD_ARRAY_EQUAL_SIZE_1: u8 = 0x02;
/// Last array head without index table (8-byte byte size).
pub const HEAD_ARRAY_EQUAL_SIZE_8: u8 = 0x05;
/// First array head with index table (1-byte offsets).
pub const HEAD_ARRAY_INDEXED_1: u8 = 0x06;
/// Array head with index table and 8-byte offsets; member count at the end.
pub const HEAD_ARRAY_INDEXED_8: u8 = 0x09;
/// Empty object.
pub const HEAD_EMPTY_OBJECT: u8 = 0x0a;
/// First sorted object head (1-byte offsets).
pub const HEAD_OBJECT_SORTED_1: u8 = 0x0b;
/// Sorted object head with 8-byte offsets; member count at the end.
pub const HEAD_OBJECT_SORTED_8: u8 = 0x0e;
/// First unsorted object head (1-byte offsets).
pub const HEAD_OBJECT_UNSORTED_1: u8 = 0x0f;
/// Unsorted object head with 8-byte offsets; member count at the end.
pub const HEAD_OBJECT_UNSORTED_8: u8 = 0x12;
/// Compact array: varuint byte size, members, reversed varuint count.
pub const HEAD_COMPACT_ARRAY: u8 = 0x13;
/// Compact object: varuint byte size, members, reversed varuint count.
pub const HEAD_COMPACT_OBJECT: u8 = 0x14;
/// Illegal value.
pub const HEAD_ILLEGAL: u8 = 0x17;
/// JSON null.
pub const HEAD_NULL: u8 = 0x18;
/// Boolean false.
pub const HEAD_FALSE: u8 = 0x19;
/// Boolean true.
pub const HEAD_TRUE: u8 = 0x1a;
/// IEEE-754 double, 8 bytes little-endian.
pub const HEAD_DOUBLE: u8 = 0x1b;
/// Milliseconds since epoch, 8 bytes signed little-endian.
pub const HEAD_UTC_DATE: u8 = 0x1c;
/// External reference, 8-byte handle.
pub const HEAD_EXTERNAL: u8 = 0x1d;
/// MinKey.
pub const HEAD_MIN_KEY: u8 = 0x1e;
/// MaxKey.
pub const HEAD_MAX_KEY: u8 = 0x1f;
/// Signed integer with one payload byte; `+ (n - 1)` for n bytes.
pub const HEAD_INT_1: u8 = 0x20;
/// Unsigned integer with one payload byte; `+ (n - 1)` for n bytes.
pub const HEAD_UINT_1: u8 = 0x28;
/// SmallInt zero; 0x30..=0x39 hold 0..=9.
pub const HEAD_SMALL_INT_0: u8 = 0x30;
/// SmallInt -6; 0x3a..=0x3f hold -6..=-1.
pub const HEAD_SMALL_INT_MINUS_6: u8 = 0x3a;
/// Empty short string; 0x40..=0xbe hold lengths 0..=126.
pub const HEAD_SHORT_STRING_0: u8 = 0x40;
/// Longest short string head.
pub const HEAD_SHORT_STRING_MAX: u8 = 0xbe;
/// Long string: 8-byte length, then payload.
pub const HEAD_LONG_STRING: u8 = 0xbf;
/// Binary with a 1-byte length field; `+ (n - 1)` for n-byte length fields.
pub const HEAD_BINARY_1: u8 = 0xc0;
/// First BCD head (positive, 1-byte mantissa length).
pub const HEAD_BCD_FIRST: u8 = 0xc8;
/// Last BCD head (negative, 8-byte mantissa length).
pub const HEAD_BCD_LAST: u8 = 0xd7;
/// Tag with 1-byte tag number.
pub const HEAD_TAGGED_1: u8 = 0xee;
/// Tag with 8-byte tag number.
pub const HEAD_TAGGED_8: u8 = 0xef;
/// First Custom head.
pub const HEAD_CUSTOM_FIRST: u8 = 0xf0;

/// Longest string that fits a short string head.
pub const MAX_SHORT_STRING_LEN: usize = 126;

/// Size of the header placeholder a builder reserves for an open container.
pub const CONTAINER_PLACEHOLDER_LEN: usize = 9;

/// Objects with fewer members than this are searched linearly even when sorted.
pub const SORTED_SEARCH_THRESHOLD: u64 = 4;

/// Default seed for binary and normalized hashing.
pub const DEFAULT_SEED: u64 = 0xdead_beef;
