//! JSON rendering of encoded values
//!
//! The [`Dumper`] walks a [`Slice`] and writes JSON text into a [`Sink`].
//! Values that have no JSON form (UTCDate, Binary, Custom, MinKey and the
//! like) are first offered to an optional [`DumpHandler`], then treated
//! according to [`DumperOptions::unsupported_type_strategy`].

use std::fmt::{self, Write as _};

use tracing::trace;
use vpack_codec::{ExternalTable, Result, Slice, VPackError, ValueType};

use crate::sink::{Sink, StringSink};

/// What to do with a value that has no JSON equivalent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Fail with `NoJsonEquivalent`
    #[default]
    Fail,
    /// Write `null` instead
    Nullify,
}

/// Dumper configuration
#[derive(Debug, Clone)]
pub struct DumperOptions {
    /// Emit newlines and indentation
    pub pretty_print: bool,
    /// Spaces per nesting level when pretty printing (default: 2)
    pub indent_width: usize,
    /// Write `/` as `\/`
    pub escape_forward_slashes: bool,
    /// Write non-ASCII characters as `\uXXXX` escapes
    pub escape_unicode: bool,
    /// Handling of None, Illegal, MinKey, MaxKey, UTCDate, Binary, BCD,
    /// Custom and unresolved External values
    pub unsupported_type_strategy: Strategy,
    /// Handling of NaN and infinite doubles
    pub unsupported_double_strategy: Strategy,
}

impl Default for DumperOptions {
    fn default() -> Self {
        Self {
            pretty_print: false,
            indent_width: 2,
            escape_forward_slashes: false,
            escape_unicode: false,
            unsupported_type_strategy: Strategy::Fail,
            unsupported_double_strategy: Strategy::Fail,
        }
    }
}

/// Callback for values without a JSON equivalent
///
/// `parent` is the enclosing Array or Object, if any. Return `Ok(true)` after
/// writing a replacement into the sink, or `Ok(false)` to fall back to the
/// configured strategy.
pub trait DumpHandler {
    /// Handle `value`
    fn handle(&self, sink: &mut dyn Sink, value: Slice<'_>, parent: Option<Slice<'_>>)
        -> Result<bool>;
}

impl<F> DumpHandler for F
where
    F: Fn(&mut dyn Sink, Slice<'_>, Option<Slice<'_>>) -> Result<bool>,
{
    fn handle(
        &self,
        sink: &mut dyn Sink,
        value: Slice<'_>,
        parent: Option<Slice<'_>>,
    ) -> Result<bool> {
        self(sink, value, parent)
    }
}

/// Renders values as JSON
pub struct Dumper<'d> {
    options: DumperOptions,
    handler: Option<Box<dyn DumpHandler + 'd>>,
    externals: Option<&'d ExternalTable>,
}

impl Default for Dumper<'_> {
    fn default() -> Self {
        Self::new(DumperOptions::default())
    }
}

impl<'d> Dumper<'d> {
    /// Dumper with `options`
    pub fn new(options: DumperOptions) -> Self {
        Self {
            options,
            handler: None,
            externals: None,
        }
    }

    /// Install a closure as the handler for unsupported values
    pub fn with_handler<F>(self, handler: F) -> Self
    where
        F: Fn(&mut dyn Sink, Slice<'_>, Option<Slice<'_>>) -> Result<bool> + 'd,
    {
        self.with_dump_handler(handler)
    }

    /// Install a [`DumpHandler`] for unsupported values
    pub fn with_dump_handler(mut self, handler: impl DumpHandler + 'd) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Resolve External values through `table` and dump their targets
    pub fn with_externals(mut self, table: &'d ExternalTable) -> Self {
        self.externals = Some(table);
        self
    }

    /// Options in effect
    pub fn options(&self) -> &DumperOptions {
        &self.options
    }

    /// Write `slice` as JSON into `sink`
    pub fn dump(&self, slice: Slice<'_>, sink: &mut dyn Sink) -> Result<()> {
        self.dump_value(slice, None, sink, 0)
    }

    /// Render `slice` as a JSON string
    pub fn dump_to_string(&self, slice: Slice<'_>) -> Result<String> {
        let mut sink = StringSink::new();
        self.dump(slice, &mut sink)?;
        sink.into_string()
    }

    /// Write `text` as a quoted, escaped JSON string
    pub fn append_string(&self, text: &str, sink: &mut dyn Sink) {
        sink.reserve(text.len() + 2);
        sink.push_byte(b'"');
        let bytes = text.as_bytes();
        let mut start = 0;
        for (i, ch) in text.char_indices() {
            let simple: &[u8] = match ch {
                '"' => b"\\\"",
                '\\' => b"\\\\",
                '/' if self.options.escape_forward_slashes => b"\\/",
                '\n' => b"\\n",
                '\r' => b"\\r",
                '\t' => b"\\t",
                '\u{8}' => b"\\b",
                '\u{c}' => b"\\f",
                c if (c as u32) < 0x20 || (self.options.escape_unicode && !c.is_ascii()) => &[],
                _ => continue,
            };
            sink.append(&bytes[start..i]);
            if simple.is_empty() {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    append_hex_escape(sink, *unit);
                }
            } else {
                sink.append(simple);
            }
            start = i + ch.len_utf8();
        }
        sink.append(&bytes[start..]);
        sink.push_byte(b'"');
    }

    fn dump_value(
        &self,
        slice: Slice<'_>,
        parent: Option<Slice<'_>>,
        sink: &mut dyn Sink,
        depth: usize,
    ) -> Result<()> {
        let value = slice.value();
        match value.kind() {
            ValueType::Null => sink.append(b"null"),
            ValueType::Bool => {
                sink.append(if value.get_bool()? { &b"true"[..] } else { &b"false"[..] })
            }
            ValueType::SmallInt | ValueType::Int => write_display(sink, value.get_int()?)?,
            ValueType::UInt => write_display(sink, value.get_uint()?)?,
            ValueType::Double => {
                let d = value.get_double()?;
                match serde_json::Number::from_f64(d) {
                    Some(number) => write_display(sink, number)?,
                    None => self.apply(self.options.unsupported_double_strategy, value, sink)?,
                }
            }
            ValueType::String => self.append_string(value.get_str()?, sink),
            ValueType::Array => self.dump_array(value, sink, depth)?,
            ValueType::Object => self.dump_object(value, sink, depth)?,
            ValueType::External => match self.externals {
                Some(table) => {
                    let target = value.resolve_externals(table)?;
                    self.dump_value(target, parent, sink, depth)?;
                }
                None => self.unsupported(value, parent, sink)?,
            },
            _ => self.unsupported(value, parent, sink)?,
        }
        Ok(())
    }

    fn dump_array(&self, array: Slice<'_>, sink: &mut dyn Sink, depth: usize) -> Result<()> {
        let members = array.array_iter()?;
        if members.len() == 0 {
            sink.append(b"[]");
            return Ok(());
        }
        sink.push_byte(b'[');
        for (i, member) in members.enumerate() {
            if i > 0 {
                sink.push_byte(b',');
            }
            self.newline(sink, depth + 1);
            self.dump_value(member?, Some(array), sink, depth + 1)?;
        }
        self.newline(sink, depth);
        sink.push_byte(b']');
        Ok(())
    }

    fn dump_object(&self, object: Slice<'_>, sink: &mut dyn Sink, depth: usize) -> Result<()> {
        let members = object.object_iter()?;
        if members.len() == 0 {
            sink.append(b"{}");
            return Ok(());
        }
        sink.push_byte(b'{');
        for (i, member) in members.enumerate() {
            let (key, value) = member?;
            if i > 0 {
                sink.push_byte(b',');
            }
            self.newline(sink, depth + 1);
            if !key.is_string() {
                return Err(VPackError::KeyNotString);
            }
            self.append_string(key.get_str()?, sink);
            sink.append(if self.options.pretty_print { &b" : "[..] } else { &b":"[..] });
            self.dump_value(value, Some(object), sink, depth + 1)?;
        }
        self.newline(sink, depth);
        sink.push_byte(b'}');
        Ok(())
    }

    fn newline(&self, sink: &mut dyn Sink, depth: usize) {
        if self.options.pretty_print {
            sink.push_byte(b'\n');
            for _ in 0..depth * self.options.indent_width {
                sink.push_byte(b' ');
            }
        }
    }

    fn unsupported(
        &self,
        value: Slice<'_>,
        parent: Option<Slice<'_>>,
        sink: &mut dyn Sink,
    ) -> Result<()> {
        if let Some(handler) = &self.handler {
            if handler.handle(sink, value, parent)? {
                return Ok(());
            }
        }
        self.apply(self.options.unsupported_type_strategy, value, sink)
    }

    fn apply(&self, strategy: Strategy, value: Slice<'_>, sink: &mut dyn Sink) -> Result<()> {
        match strategy {
            Strategy::Fail => Err(VPackError::NoJsonEquivalent(value.type_name().to_string())),
            Strategy::Nullify => {
                trace!(kind = value.type_name(), "dumping unsupported value as null");
                sink.append(b"null");
                Ok(())
            }
        }
    }
}

/// Adapter letting `write!` target a [`Sink`]
struct SinkWriter<'s>(&'s mut dyn Sink);

impl fmt::Write for SinkWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.append(s.as_bytes());
        Ok(())
    }
}

fn write_display(sink: &mut dyn Sink, value: impl fmt::Display) -> Result<()> {
    write!(SinkWriter(sink), "{}", value)
        .map_err(|_| VPackError::InternalError("formatting failed".to_string()))
}

fn append_hex_escape(sink: &mut dyn Sink, unit: u16) {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    sink.append(&[
        b'\\',
        b'u',
        HEX[(unit >> 12) as usize & 0xf],
        HEX[(unit >> 8) as usize & 0xf],
        HEX[(unit >> 4) as usize & 0xf],
        HEX[unit as usize & 0xf],
    ]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use vpack_codec::{Builder, Value};

    fn dump(bytes: &[u8]) -> Result<String> {
        Dumper::default().dump_to_string(Slice::new(bytes))
    }

    #[test]
    fn test_scalars() {
        assert_eq!(dump(&[0x18]).unwrap(), "null");
        assert_eq!(dump(&[0x1a]).unwrap(), "true");
        assert_eq!(dump(&[0x19]).unwrap(), "false");
        assert_eq!(dump(&[0x3a]).unwrap(), "-6");
        assert_eq!(dump(&[0x29, 0xb0, 0x04]).unwrap(), "1200");
        assert_eq!(dump(&[0x20, 0xd6]).unwrap(), "-42");
        let mut double = vec![0x1b];
        double.extend_from_slice(&3.4f64.to_le_bytes());
        assert_eq!(dump(&double).unwrap(), "3.4");
    }

    #[test]
    fn test_string_escaping() {
        let text = "special chars / \" \\ ' foo\n\r\t baz";
        let mut plain = Vec::new();
        Dumper::default().append_string(text, &mut plain);
        assert_eq!(
            plain,
            b"\"special chars / \\\" \\\\ ' foo\\n\\r\\t baz\"".to_vec()
        );

        let slashes = Dumper::new(DumperOptions {
            escape_forward_slashes: true,
            ..DumperOptions::default()
        });
        let mut escaped = Vec::new();
        slashes.append_string("a/b\u{1}", &mut escaped);
        assert_eq!(escaped, b"\"a\\/b\\u0001\"".to_vec());
    }

    #[test]
    fn test_unicode_escaping() {
        let dumper = Dumper::new(DumperOptions {
            escape_unicode: true,
            ..DumperOptions::default()
        });
        let mut out = Vec::new();
        dumper.append_string("mö\u{1f600}", &mut out);
        assert_eq!(out, b"\"m\\u00f6\\ud83d\\ude00\"".to_vec());

        let mut raw = Vec::new();
        Dumper::default().append_string("mö", &mut raw);
        assert_eq!(raw, "\"mö\"".as_bytes());
    }

    #[test]
    fn test_nan_strategy() {
        let mut nan = vec![0x1b];
        nan.extend_from_slice(&f64::NAN.to_le_bytes());
        assert!(matches!(dump(&nan), Err(VPackError::NoJsonEquivalent(_))));
        let nullify = Dumper::new(DumperOptions {
            unsupported_double_strategy: Strategy::Nullify,
            ..DumperOptions::default()
        });
        assert_eq!(nullify.dump_to_string(Slice::new(&nan)).unwrap(), "null");
    }

    #[test]
    fn test_unsupported_types() {
        let date = [0x1c, 0, 0, 0, 0, 0, 0, 0, 0];
        let unsupported: [&[u8]; 5] = [&[0x1e], &[0x17], &[0xf0, 0x01], &date, &[0xc0, 0x01, 0xff]];
        for bytes in unsupported {
            assert!(matches!(dump(bytes), Err(VPackError::NoJsonEquivalent(_))));
        }
        let nullify = Dumper::new(DumperOptions {
            unsupported_type_strategy: Strategy::Nullify,
            ..DumperOptions::default()
        });
        assert_eq!(nullify.dump_to_string(Slice::new(&date)).unwrap(), "null");
    }

    #[test]
    fn test_pretty_print() {
        let mut b = Builder::new();
        b.open_object().unwrap();
        b.add_keyed("foo", Value::String("bar")).unwrap();
        b.add_key("list").unwrap();
        b.open_array().unwrap();
        b.add(Value::SmallInt(1)).unwrap();
        b.open_array().unwrap();
        b.close().unwrap();
        b.close().unwrap();
        b.close().unwrap();

        let pretty = Dumper::new(DumperOptions {
            pretty_print: true,
            ..DumperOptions::default()
        });
        assert_eq!(
            pretty.dump_to_string(b.slice().unwrap()).unwrap(),
            "{\n  \"foo\" : \"bar\",\n  \"list\" : [\n    1,\n    []\n  ]\n}"
        );
        assert_eq!(
            Dumper::default().dump_to_string(b.slice().unwrap()).unwrap(),
            "{\"foo\":\"bar\",\"list\":[1,[]]}"
        );
    }

    #[test]
    fn test_handler_sees_parent() {
        let mut b = Builder::new();
        b.open_object().unwrap();
        b.add_key("_id").unwrap();
        b.add_custom(&[0xf0, 0x01]).unwrap();
        b.add_keyed("_key", Value::String("this is a key")).unwrap();
        b.close().unwrap();

        let dumper = Dumper::default().with_handler(|sink, value, parent| {
            if !value.is_custom() {
                return Ok(false);
            }
            let key = parent
                .ok_or_else(|| VPackError::InternalError("no parent".to_string()))?
                .get("_key")?;
            sink.append(b"\"foobar/");
            sink.append(key.get_string_bytes()?);
            sink.push_byte(b'"');
            Ok(true)
        });
        assert_eq!(
            dumper.dump_to_string(b.slice().unwrap()).unwrap(),
            "{\"_id\":\"foobar/this is a key\",\"_key\":\"this is a key\"}"
        );
    }

    #[test]
    fn test_externals_resolved_through_table() {
        let mut target = Builder::new();
        target.add(Value::String("far away")).unwrap();
        let mut table = ExternalTable::new();
        let handle = table.insert(target.steal().unwrap());

        let mut b = Builder::new();
        b.open_array().unwrap();
        b.add(Value::External(handle)).unwrap();
        b.close().unwrap();

        let dumper = Dumper::default().with_externals(&table);
        assert_eq!(
            dumper.dump_to_string(b.slice().unwrap()).unwrap(),
            "[\"far away\"]"
        );
        assert!(Dumper::default().dump_to_string(b.slice().unwrap()).is_err());
    }

    #[test]
    fn test_tags_are_transparent() {
        assert_eq!(dump(&[0xee, 0x01, 0x35]).unwrap(), "5");
    }
}
