//! JSON text through the parser and back out of the dumper

use proptest::prelude::*;
use serde_json::{Map, Value as JsonValue};
use vpack_codec::{Options, Slice, Validator};
use vpack_json::{to_json_string, Dumper, DumperOptions, Parser, StreamSink};

fn json_strategy() -> impl Strategy<Value = JsonValue> {
    let leaf = prop_oneof![
        Just(JsonValue::Null),
        any::<bool>().prop_map(JsonValue::Bool),
        any::<i64>().prop_map(JsonValue::from),
        any::<u64>().prop_map(JsonValue::from),
        (-1_000_000i64..1_000_000).prop_map(|n| JsonValue::from(n as f64 / 64.0)),
        "[ -~\u{e9}\u{2028}\u{1f600}\n\t]{0,40}".prop_map(JsonValue::String),
    ];
    leaf.prop_recursive(4, 64, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(JsonValue::Array),
            prop::collection::btree_map("[a-z_]{0,6}", inner, 0..6)
                .prop_map(|m| JsonValue::Object(m.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

proptest! {
    #[test]
    fn test_json_survives_round_trip(value in json_strategy(), compact in any::<bool>()) {
        let text = value.to_string();
        let parser = Parser::with_options(Options {
            build_unindexed_arrays: compact,
            build_unindexed_objects: compact,
            ..Options::default()
        });
        let builder = parser.parse(&text).unwrap();
        let slice = builder.slice().unwrap();

        let validator = Validator::with_options(Options {
            validate_utf8_strings: true,
            check_attribute_uniqueness: true,
            ..Options::default()
        });
        prop_assert!(validator.validate(builder.start().unwrap()).is_ok());

        let dumped = to_json_string(slice).unwrap();
        let reparsed: JsonValue = serde_json::from_str(&dumped).unwrap();
        prop_assert_eq!(reparsed, value);
    }

    #[test]
    fn test_from_value_matches_text_parse(value in json_strategy()) {
        let parser = Parser::new();
        let from_text = parser.parse(&value.to_string()).unwrap().steal().unwrap();
        let from_tree = parser.from_value(&value).unwrap().steal().unwrap();
        prop_assert_eq!(from_text, from_tree);
    }
}

#[test]
fn test_long_string_dumps_quoted() {
    let text = "a".repeat(300);
    let bytes = Parser::new()
        .parse(&format!("\"{}\"", text))
        .unwrap()
        .steal()
        .unwrap();
    assert_eq!(bytes[0], 0xbf);
    let dumped = to_json_string(Slice::new(&bytes)).unwrap();
    assert_eq!(dumped.len(), 302);
    assert_eq!(&dumped[1..301], text);
}

#[test]
fn test_pretty_print_nested() {
    let builder = Parser::new()
        .parse(r#"{"foo":"bar","list":[1,[]],"empty":{}}"#)
        .unwrap();
    let options = DumperOptions {
        pretty_print: true,
        ..DumperOptions::default()
    };
    let dumped = Dumper::new(options)
        .dump_to_string(builder.slice().unwrap())
        .unwrap();
    assert_eq!(
        dumped,
        "{\n  \"empty\" : {},\n  \"foo\" : \"bar\",\n  \"list\" : [\n    1,\n    []\n  ]\n}"
    );
}

#[test]
fn test_unsorted_objects_dump_in_insertion_order() {
    let parser = Parser::with_options(Options {
        sort_attribute_names: false,
        ..Options::default()
    });
    let builder = parser.parse(r#"{"z":1,"a":2,"m":3}"#).unwrap();
    assert_eq!(
        to_json_string(builder.slice().unwrap()).unwrap(),
        r#"{"z":1,"a":2,"m":3}"#
    );
}

#[test]
fn test_dump_into_stream() {
    let builder = Parser::new().parse("[true, -1, \"x\"]").unwrap();
    let mut sink = StreamSink::new(Vec::new());
    Dumper::default()
        .dump(builder.slice().unwrap(), &mut sink)
        .unwrap();
    assert_eq!(sink.finish().unwrap(), b"[true,-1,\"x\"]");
}
