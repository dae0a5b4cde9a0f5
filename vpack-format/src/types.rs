//! Value type enumeration

use std::fmt;

/// The kind of a value, selected by its head byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueType {
    /// No value (head 0x00) or a reserved head byte
    None,
    /// Illegal value
    Illegal,
    /// JSON null
    Null,
    /// Boolean value
    Bool,
    /// Array of values
    Array,
    /// Object of key/value pairs
    Object,
    /// IEEE-754 double
    Double,
    /// Milliseconds since the Unix epoch
    UTCDate,
    /// Reference to a value in a separately managed buffer
    External,
    /// Smaller than any other value
    MinKey,
    /// Larger than any other value
    MaxKey,
    /// Signed integer
    Int,
    /// Unsigned integer
    UInt,
    /// Integer in -6..=9 encoded in the head byte
    SmallInt,
    /// UTF-8 string
    String,
    /// Opaque bytes
    Binary,
    /// Binary-coded decimal (reserved)
    BCD,
    /// Application-defined value
    Custom,
    /// Value decorated with an integer tag
    Tagged,
}

impl ValueType {
    /// Lowercase name of the type
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::None => "none",
            ValueType::Illegal => "illegal",
            ValueType::Null => "null",
            ValueType::Bool => "bool",
            ValueType::Array => "array",
            ValueType::Object => "object",
            ValueType::Double => "double",
            ValueType::UTCDate => "utc-date",
            ValueType::External => "external",
            ValueType::MinKey => "min-key",
            ValueType::MaxKey => "max-key",
            ValueType::Int => "int",
            ValueType::UInt => "uint",
            ValueType::SmallInt => "smallint",
            ValueType::String => "string",
            ValueType::Binary => "binary",
            ValueType::BCD => "bcd",
            ValueType::Custom => "custom",
            ValueType::Tagged => "tagged",
        }
    }

    /// Whether the type is Int, UInt or SmallInt
    pub fn is_integer(&self) -> bool {
        matches!(self, ValueType::Int | ValueType::UInt | ValueType::SmallInt)
    }

    /// Whether the type is an integer or a Double
    pub fn is_number(&self) -> bool {
        self.is_integer() || *self == ValueType::Double
    }

    /// Whether the type has a direct JSON representation
    pub fn has_json_equivalent(&self) -> bool {
        matches!(
            self,
            ValueType::Null
                | ValueType::Bool
                | ValueType::Array
                | ValueType::Object
                | ValueType::Double
                | ValueType::Int
                | ValueType::UInt
                | ValueType::SmallInt
                | ValueType::String
        )
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
