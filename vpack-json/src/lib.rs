//! VPack JSON - Conversion between JSON text and encoded values
//!
//! - [`Parser`] builds encoded values from JSON text
//! - [`Dumper`] renders encoded values as JSON into a [`Sink`]

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod dumper;
pub mod parser;
pub mod sink;

pub use dumper::{DumpHandler, Dumper, DumperOptions, Strategy};
pub use parser::Parser;
pub use sink::{LengthSink, Sink, SizeConstrainedSink, StreamSink, StringSink};

use vpack_codec::{Result, Slice};

/// Render `slice` as compact JSON
pub fn to_json_string(slice: Slice<'_>) -> Result<String> {
    to_json_string_with(slice, &DumperOptions::default())
}

/// Render `slice` as JSON using `options`
pub fn to_json_string_with(slice: Slice<'_>, options: &DumperOptions) -> Result<String> {
    Dumper::new(options.clone()).dump_to_string(slice)
}

/// Parse JSON text with default options and return the encoded bytes
pub fn from_json_str(json: &str) -> Result<Vec<u8>> {
    Parser::new().parse(json)?.steal()
}
