//! VPack Codec - Reading, building and validating encoded values
//!
//! This crate provides the engines that operate on the encoding:
//!
//! - [`Slice`] for zero-copy access to an encoded value
//! - [`Builder`] for emitting values incrementally
//! - [`Validator`] for checking untrusted buffers
//! - Binary and normalized hashing
//! - Attribute translation and External value tables
//! - Collection utilities in [`collection`]

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;

pub mod builder;
pub mod collection;
pub mod external;
pub mod hash;
pub mod iterator;
pub mod shared;
pub mod slice;
pub mod translator;
pub mod validator;
pub mod value;

// Re-export commonly used types
pub use vpack_format::{ErrorCategory, Limits, Result, VPackError, ValueType};

// Re-export our own types
pub use builder::Builder;
pub use collection::VisitOrder;
pub use external::ExternalTable;
pub use hash::hash_bytes;
pub use iterator::{ArrayIterator, ObjectIterator};
pub use shared::SharedSlice;
pub use slice::{Bcd, FromNumber, Slice};
pub use translator::AttributeTranslator;
pub use validator::Validator;
pub use value::Value;

/// Options shared by the builder and the validator
#[derive(Debug, Clone)]
pub struct Options {
    /// Sort object index tables by key (default: true)
    pub sort_attribute_names: bool,
    /// Build arrays in the compact layout
    pub build_unindexed_arrays: bool,
    /// Build objects in the compact layout
    pub build_unindexed_objects: bool,
    /// Reject objects with repeated keys
    pub check_attribute_uniqueness: bool,
    /// Refuse External values
    pub disallow_externals: bool,
    /// Check that strings are well-formed UTF-8 when validating
    pub validate_utf8_strings: bool,
    /// Key translation applied when building, validating and reading back
    pub attribute_translator: Option<Arc<AttributeTranslator>>,
    /// Depth and size limits
    pub limits: Limits,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            sort_attribute_names: true,
            build_unindexed_arrays: false,
            build_unindexed_objects: false,
            check_attribute_uniqueness: false,
            disallow_externals: false,
            validate_utf8_strings: false,
            attribute_translator: None,
            limits: Limits::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = Options::default();
        assert!(opts.sort_attribute_names);
        assert!(!opts.build_unindexed_arrays);
        assert!(!opts.check_attribute_uniqueness);
        assert!(opts.attribute_translator.is_none());
        assert_eq!(opts.limits.max_depth, 128);
    }

    #[test]
    fn test_compact_defaults_flow_into_builder() {
        let mut builder = Builder::with_options(Options {
            build_unindexed_arrays: true,
            ..Options::default()
        });
        builder.open_array().unwrap();
        builder.add(Value::SmallInt(1)).unwrap();
        builder.add(Value::String("a")).unwrap();
        builder.close().unwrap();
        let slice = builder.slice().unwrap();
        assert!(slice.is_compact());
        assert!(Validator::new().validate(builder.start().unwrap()).is_ok());
    }
}
