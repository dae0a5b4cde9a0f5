//! VPack Format - Core primitives for the VPack binary value encoding
//!
//! This crate holds the pieces of the encoding that do not depend on any
//! particular reader or builder:
//!
//! - Head byte constants
//! - Value types and the per-head lookup tables
//! - Little-endian integer helpers
//! - Variable-length integers (forward and reversed ULEB128)
//! - Error types
//! - Resource limits

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod constants;
pub mod endian;
pub mod error;
pub mod limits;
pub mod tables;
pub mod types;
pub mod varint;

// Re-export commonly used types
pub use error::{ErrorCategory, Result, VPackError};
pub use limits::Limits;
pub use types::ValueType;
