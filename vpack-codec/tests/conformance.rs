//! Conformance tests against literal encodings
//!
//! Each test builds a value through the public API, compares the exact bytes
//! with the expected encoding and reads the result back.

use vpack_codec::{Builder, Options, Slice, Validator, Value, VPackError};
use vpack_format::constants::DEFAULT_SEED;

fn strict_validator() -> Validator {
    Validator::with_options(Options {
        validate_utf8_strings: true,
        check_attribute_uniqueness: true,
        ..Options::default()
    })
}

#[test]
fn test_small_int_array() {
    let mut b = Builder::new();
    b.open_array().unwrap();
    for i in 1..=3 {
        b.add(Value::SmallInt(i)).unwrap();
    }
    b.close().unwrap();
    assert_eq!(b.start().unwrap(), &[0x02, 0x05, 0x31, 0x32, 0x33]);

    let s = b.slice().unwrap();
    assert_eq!(s.length().unwrap(), 3);
    assert_eq!(s.at(1).unwrap().get_small_int().unwrap(), 2);
    assert!(matches!(s.at(3), Err(VPackError::IndexOutOfBounds)));
    strict_validator().validate(b.start().unwrap()).unwrap();
}

#[test]
fn test_unsorted_object_lookup() {
    let mut b = Builder::new();
    b.open_object_with(false, false).unwrap();
    b.add_keyed("b", Value::UInt(12)).unwrap();
    b.add_keyed("a", Value::Bool(true)).unwrap();
    b.close().unwrap();
    assert_eq!(
        b.start().unwrap(),
        &[0x0f, 0x0c, 0x02, 0x41, b'b', 0x28, 0x0c, 0x41, b'a', 0x1a, 0x03, 0x07]
    );

    let s = b.slice().unwrap();
    assert!(s.get("a").unwrap().get_bool().unwrap());
    assert_eq!(s.get("b").unwrap().get_uint().unwrap(), 12);
    assert!(s.get("c").unwrap().is_none());
    strict_validator().validate(b.start().unwrap()).unwrap();
}

#[test]
fn test_unsorted_object_with_wide_uint() {
    // {"b": 12, "a": true} with 12 stored in two bytes
    let bytes = [
        0x0f, 0x0d, 0x02, 0x41, 0x62, 0x29, 0x0c, 0x00, 0x41, 0x61, 0x1a, 0x03, 0x08,
    ];
    strict_validator().validate(&bytes).unwrap();
    let s = Slice::new(&bytes);
    assert_eq!(s.byte_size().unwrap(), 13);
    assert_eq!(s.length().unwrap(), 2);
    assert!(s.get("a").unwrap().get_bool().unwrap());
    assert_eq!(s.get("b").unwrap().get_uint().unwrap(), 12);
    assert_eq!(s.key_at(0, false).unwrap().get_str().unwrap(), "b");
}

#[test]
fn test_sorted_object_index_table() {
    let build = |sorted: bool| {
        let mut b = Builder::new();
        b.open_object_with(false, sorted).unwrap();
        b.add_keyed("d", Value::UInt(1200)).unwrap();
        b.add_keyed("c", Value::Double(2.3)).unwrap();
        b.add_keyed("b", Value::String("abc")).unwrap();
        b.add_keyed("a", Value::Bool(true)).unwrap();
        b.close().unwrap();
        b.steal().unwrap()
    };

    let sorted = build(true);
    assert_eq!(sorted.len(), 0x20);
    assert_eq!(&sorted[..3], &[0x0b, 0x20, 0x04]);
    assert_eq!(&sorted[28..], &[0x19, 0x13, 0x08, 0x03]);

    let unsorted = build(false);
    assert_eq!(&unsorted[..3], &[0x0f, 0x20, 0x04]);
    assert_eq!(&unsorted[28..], &[0x03, 0x08, 0x13, 0x19]);

    // same payload, different index order
    assert_eq!(&sorted[3..28], &unsorted[3..28]);

    for bytes in [&sorted, &unsorted] {
        let s = Slice::new(bytes);
        strict_validator().validate(bytes).unwrap();
        assert_eq!(s.get("d").unwrap().get_uint().unwrap(), 1200);
        assert_eq!(s.get("c").unwrap().get_double().unwrap(), 2.3);
        assert_eq!(s.get("b").unwrap().get_str().unwrap(), "abc");
        assert!(s.get("a").unwrap().get_bool().unwrap());
    }
    assert_eq!(
        Slice::new(&sorted).normalized_hash(DEFAULT_SEED).unwrap(),
        Slice::new(&unsorted).normalized_hash(DEFAULT_SEED).unwrap()
    );
}

#[test]
fn test_compact_small_int_array() {
    let mut b = Builder::new();
    b.open_compact_array().unwrap();
    for i in 0..5 {
        b.add(Value::SmallInt(i)).unwrap();
    }
    b.close().unwrap();
    assert_eq!(
        b.start().unwrap(),
        &[0x13, 0x08, 0x30, 0x31, 0x32, 0x33, 0x34, 0x05]
    );

    let s = b.slice().unwrap();
    assert_eq!(s.length().unwrap(), 5);
    assert_eq!(s.at(3).unwrap().get_small_int().unwrap(), 3);
    strict_validator().validate(b.start().unwrap()).unwrap();
}

#[test]
fn test_long_utf8_string() {
    let text = "a".repeat(300);
    let mut b = Builder::new();
    b.add(Value::String(&text)).unwrap();
    let bytes = b.steal().unwrap();

    assert_eq!(bytes[0], 0xbf);
    assert_eq!(&bytes[1..9], &[0x2c, 0x01, 0, 0, 0, 0, 0, 0]);
    assert_eq!(bytes.len(), 309);
    assert_eq!(Slice::new(&bytes).get_str().unwrap(), text);
    strict_validator().validate(&bytes).unwrap();
}

#[test]
fn test_malformed_array_rejected() {
    let bytes = [0x02, 0x05, 0x18];
    assert!(matches!(
        Validator::new().validate(&bytes),
        Err(VPackError::ValidatorInvalidLength(_))
    ));
    // the reader trusts the header
    assert_eq!(Slice::new(&bytes).byte_size().unwrap(), 5);
}

#[test]
fn test_sorted_lookup_uses_binary_search_for_larger_objects() {
    let keys: Vec<String> = (0..40).map(|i| format!("key{:02}", i)).collect();
    let mut b = Builder::new();
    b.open_object().unwrap();
    for (i, key) in keys.iter().enumerate().rev() {
        b.add_keyed(key, Value::int(i as i64)).unwrap();
    }
    b.close().unwrap();

    let s = b.slice().unwrap();
    assert!(s.is_sorted());
    for (i, key) in keys.iter().enumerate() {
        assert_eq!(s.get(key).unwrap().get_int().unwrap(), i as i64);
    }
    assert!(s.get("key99").unwrap().is_none());
    assert!(s.get("").unwrap().is_none());
}

#[test]
fn test_nested_path_and_tuple() {
    let mut b = Builder::new();
    b.open_object().unwrap();
    b.add_key("point").unwrap();
    b.open_array().unwrap();
    b.add(Value::int(-3)).unwrap();
    b.add(Value::int(400)).unwrap();
    b.close().unwrap();
    b.add_key("meta").unwrap();
    b.open_object().unwrap();
    b.add_keyed("name", Value::String("origin")).unwrap();
    b.close().unwrap();
    b.close().unwrap();

    let s = b.slice().unwrap();
    assert_eq!(
        s.get_path(&["meta", "name"]).unwrap().get_str().unwrap(),
        "origin"
    );
    assert!(matches!(
        s.get_path(&[]),
        Err(VPackError::InvalidAttributePath)
    ));
    let [x, y] = s.get("point").unwrap().tuple::<2>().unwrap();
    assert_eq!((x.get_int().unwrap(), y.get_int().unwrap()), (-3, 400));
    assert!(matches!(
        s.get("point").unwrap().tuple::<3>(),
        Err(VPackError::BadTupleSize)
    ));
    Validator::new().validate(b.start().unwrap()).unwrap();
}

#[test]
fn test_deep_nesting_roundtrip() {
    let mut b = Builder::new();
    for _ in 0..100 {
        b.open_array().unwrap();
    }
    b.add(Value::Null).unwrap();
    for _ in 0..100 {
        b.close().unwrap();
    }
    let bytes = b.steal().unwrap();
    Validator::new().validate(&bytes).unwrap();

    let mut s = Slice::new(&bytes);
    for _ in 0..100 {
        s = s.at(0).unwrap();
    }
    assert!(s.is_null());
}
