//! JSON text to encoded values
//!
//! The parser streams `serde_json` deserialization events straight into a
//! [`Builder`], so no intermediate tree is allocated and objects keep their
//! key order and duplicate keys.

use std::fmt;

use serde::de::{self, DeserializeSeed, Deserializer, MapAccess, SeqAccess, Visitor};
use serde_json::Value as JsonValue;
use tracing::debug;
use vpack_codec::{Builder, Options, Result, VPackError, Value};

/// Builds encoded values from JSON
#[derive(Debug, Clone, Default)]
pub struct Parser {
    options: Options,
}

impl Parser {
    /// Parser producing builders with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser producing builders with `options`
    pub fn with_options(options: Options) -> Self {
        Self { options }
    }

    /// Parse one JSON document
    pub fn parse(&self, json: &str) -> Result<Builder> {
        self.parse_slice(json.as_bytes())
    }

    /// Parse one JSON document from bytes
    ///
    /// Trailing whitespace is allowed, anything else after the document is
    /// an error.
    pub fn parse_slice(&self, json: &[u8]) -> Result<Builder> {
        let mut builder = Builder::with_options(self.options.clone());
        let mut deserializer = serde_json::Deserializer::from_slice(json);
        let mut ctx = Context {
            builder: &mut builder,
            error: None,
        };
        let outcome = ValueSeed { ctx: &mut ctx }
            .deserialize(&mut deserializer)
            .and_then(|()| deserializer.end());
        if let Err(err) = outcome {
            return Err(ctx.error.take().unwrap_or_else(|| parse_error(&err)));
        }
        debug!(bytes = builder.size()?, "parsed JSON document");
        Ok(builder)
    }

    /// Encode an in-memory JSON value
    pub fn from_value(&self, value: &JsonValue) -> Result<Builder> {
        let mut builder = Builder::with_options(self.options.clone());
        feed(&mut builder, value)?;
        Ok(builder)
    }
}

fn feed(builder: &mut Builder, value: &JsonValue) -> Result<()> {
    match value {
        JsonValue::Null => builder.add(Value::Null),
        JsonValue::Bool(b) => builder.add(Value::Bool(*b)),
        JsonValue::Number(n) => match (n.as_u64(), n.as_i64()) {
            (Some(u), _) => builder.add(Value::uint(u)),
            (None, Some(i)) => builder.add(Value::int(i)),
            (None, None) => builder.add(Value::Double(n.as_f64().unwrap_or(f64::NAN))),
        },
        JsonValue::String(s) => builder.add(Value::String(s)),
        JsonValue::Array(items) => {
            builder.open_array()?;
            for item in items {
                feed(builder, item)?;
            }
            builder.close()
        }
        JsonValue::Object(members) => {
            builder.open_object()?;
            for (key, member) in members {
                builder.add_key(key)?;
                feed(builder, member)?;
            }
            builder.close()
        }
    }
}

fn parse_error(err: &serde_json::Error) -> VPackError {
    let mut message = err.to_string();
    if let Some(at) = message.rfind(" at line ") {
        message.truncate(at);
    }
    VPackError::Parse {
        message,
        line: err.line(),
        column: err.column(),
    }
}

/// Builder being filled plus the first builder error, which serde can only
/// carry as text
struct Context<'b> {
    builder: &'b mut Builder,
    error: Option<VPackError>,
}

impl Context<'_> {
    fn record<E: de::Error>(&mut self, result: Result<()>) -> std::result::Result<(), E> {
        result.map_err(|err| {
            let message = err.to_string();
            if self.error.is_none() {
                self.error = Some(err);
            }
            E::custom(message)
        })
    }

    fn add<E: de::Error>(&mut self, value: Value<'_>) -> std::result::Result<(), E> {
        let result = self.builder.add(value);
        self.record(result)
    }
}

struct ValueSeed<'c, 'b> {
    ctx: &'c mut Context<'b>,
}

impl<'de> DeserializeSeed<'de> for ValueSeed<'_, '_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<(), D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for ValueSeed<'_, '_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "any JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<(), E> {
        self.ctx.add(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<(), E> {
        self.ctx.add(Value::int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<(), E> {
        self.ctx.add(Value::uint(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<(), E> {
        self.ctx.add(Value::Double(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<(), E> {
        self.ctx.add(Value::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<(), E> {
        self.ctx.add(Value::Null)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<(), A::Error> {
        let ctx = self.ctx;
        let opened = ctx.builder.open_array();
        ctx.record(opened)?;
        while seq.next_element_seed(ValueSeed { ctx: &mut *ctx })?.is_some() {}
        let closed = ctx.builder.close();
        ctx.record(closed)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<(), A::Error> {
        let ctx = self.ctx;
        let opened = ctx.builder.open_object();
        ctx.record(opened)?;
        while map.next_key_seed(KeySeed { ctx: &mut *ctx })?.is_some() {
            map.next_value_seed(ValueSeed { ctx: &mut *ctx })?;
        }
        let closed = ctx.builder.close();
        ctx.record(closed)
    }
}

/// Writes an object key without allocating it
struct KeySeed<'c, 'b> {
    ctx: &'c mut Context<'b>,
}

impl<'de> DeserializeSeed<'de> for KeySeed<'_, '_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<(), D::Error> {
        deserializer.deserialize_str(self)
    }
}

impl<'de> Visitor<'de> for KeySeed<'_, '_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "an object key")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<(), E> {
        let result = self.ctx.builder.add_key(v);
        self.ctx.record(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vpack_codec::{Slice, ValueType};

    fn parse(json: &str) -> Vec<u8> {
        Parser::new().parse(json).unwrap().steal().unwrap()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(parse("null"), vec![0x18]);
        assert_eq!(parse(" true "), vec![0x1a]);
        assert_eq!(parse("7"), vec![0x37]);
        assert_eq!(parse("-3"), vec![0x3d]);
        assert_eq!(parse("1200"), vec![0x29, 0xb0, 0x04]);
        assert_eq!(parse("-42"), vec![0x20, 0xd6]);
        assert_eq!(parse("\"a\""), vec![0x41, b'a']);
        let double = parse("2.5");
        assert_eq!(Slice::new(&double).get_double().unwrap(), 2.5);
    }

    #[test]
    fn test_number_kinds_follow_value() {
        let bytes = parse("[1, 10, -7, 18446744073709551615, 1.5, -9223372036854775808]");
        let kinds: Vec<ValueType> = Slice::new(&bytes)
            .array_iter()
            .unwrap()
            .map(|m| m.unwrap().kind())
            .collect();
        assert_eq!(
            kinds,
            vec![
                ValueType::SmallInt,
                ValueType::UInt,
                ValueType::Int,
                ValueType::UInt,
                ValueType::Double,
                ValueType::Int,
            ]
        );
    }

    #[test]
    fn test_objects_keep_order_and_duplicates() {
        let parser = Parser::with_options(Options {
            sort_attribute_names: false,
            ..Options::default()
        });
        let builder = parser.parse(r#"{"b": 1, "a": 2, "b": 3}"#).unwrap();
        let keys: Vec<String> = builder
            .slice()
            .unwrap()
            .object_iter()
            .unwrap()
            .map(|m| m.unwrap().0.copy_string().unwrap())
            .collect();
        assert_eq!(keys, vec!["b", "a", "b"]);
    }

    #[test]
    fn test_builder_errors_are_preserved() {
        let parser = Parser::with_options(Options {
            check_attribute_uniqueness: true,
            ..Options::default()
        });
        assert!(matches!(
            parser.parse(r#"{"a": 1, "a": 2}"#),
            Err(VPackError::DuplicateAttributeName)
        ));

        let mut options = Options::default();
        options.limits.max_depth = 2;
        assert!(matches!(
            Parser::with_options(options).parse("[[[1]]]"),
            Err(VPackError::TooDeepNesting)
        ));
    }

    #[test]
    fn test_syntax_errors_carry_position() {
        match Parser::new().parse("[1,\n 2,,]") {
            Err(VPackError::Parse { line, column, .. }) => {
                assert_eq!(line, 2);
                assert!(column > 0);
            }
            other => panic!("expected parse error, got {:?}", other.map(|_| ())),
        }
        assert!(matches!(
            Parser::new().parse("1 2"),
            Err(VPackError::Parse { .. })
        ));
        assert!(matches!(
            Parser::new().parse(""),
            Err(VPackError::Parse { .. })
        ));
    }

    #[test]
    fn test_escaped_keys_and_strings() {
        let bytes = parse(r#"{"line\nbreak": "tab\there"}"#);
        let s = Slice::new(&bytes);
        assert_eq!(s.get("line\nbreak").unwrap().get_str().unwrap(), "tab\there");
    }

    #[test]
    fn test_from_value() {
        let value = serde_json::json!({"list": [1, -2, 3.5, "x", null, true], "n": 300});
        let builder = Parser::new().from_value(&value).unwrap();
        let s = builder.slice().unwrap();
        assert_eq!(s.get("n").unwrap().get_uint().unwrap(), 300);
        let list = s.get("list").unwrap();
        assert_eq!(list.length().unwrap(), 6);
        assert_eq!(list.at(1).unwrap().get_int().unwrap(), -2);
        assert_eq!(list.at(2).unwrap().get_double().unwrap(), 3.5);
    }
}
