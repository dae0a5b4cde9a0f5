//! Property tests for building, validating and reading values

use proptest::prelude::*;
use vpack_codec::{Builder, Options, Slice, Validator, Value};

/// In-memory value tree used to drive the builder
#[derive(Debug, Clone)]
enum Tree {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Double(f64),
    Str(String),
    Array(Vec<Tree>),
    Object(Vec<(String, Tree)>),
}

fn tree_strategy() -> impl Strategy<Value = Tree> {
    let leaf = prop_oneof![
        Just(Tree::Null),
        any::<bool>().prop_map(Tree::Bool),
        any::<i64>().prop_map(Tree::Int),
        any::<u64>().prop_map(Tree::UInt),
        (-1e12f64..1e12).prop_map(Tree::Double),
        "[a-z\u{e4}\u{1f600}]{0,140}".prop_map(Tree::Str),
    ];
    leaf.prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(Tree::Array),
            prop::collection::vec(("[a-e]{1,3}", inner), 0..8).prop_map(Tree::Object),
        ]
    })
}

fn build(builder: &mut Builder, tree: &Tree) {
    match tree {
        Tree::Null => builder.add(Value::Null).unwrap(),
        Tree::Bool(b) => builder.add(Value::Bool(*b)).unwrap(),
        Tree::Int(v) => builder.add(Value::int(*v)).unwrap(),
        Tree::UInt(v) => builder.add(Value::uint(*v)).unwrap(),
        Tree::Double(d) => builder.add(Value::Double(*d)).unwrap(),
        Tree::Str(s) => builder.add(Value::String(s)).unwrap(),
        Tree::Array(items) => {
            builder.open_array().unwrap();
            for item in items {
                build(builder, item);
            }
            builder.close().unwrap();
        }
        Tree::Object(members) => {
            builder.open_object().unwrap();
            for (key, value) in members {
                builder.add_key(key).unwrap();
                build(builder, value);
            }
            builder.close().unwrap();
        }
    }
}

fn assert_matches(slice: Slice<'_>, tree: &Tree, sorted: bool) {
    match tree {
        Tree::Null => assert!(slice.is_null()),
        Tree::Bool(b) => assert_eq!(slice.get_bool().unwrap(), *b),
        Tree::Int(v) => assert_eq!(slice.get_int().unwrap(), *v),
        Tree::UInt(v) => assert_eq!(slice.get_uint().unwrap(), *v),
        Tree::Double(d) => assert_eq!(slice.get_double().unwrap(), *d),
        Tree::Str(s) => assert_eq!(slice.get_str().unwrap(), s),
        Tree::Array(items) => {
            assert_eq!(slice.length().unwrap(), items.len() as u64);
            for (member, item) in slice.array_iter().unwrap().zip(items) {
                assert_matches(member.unwrap(), item, sorted);
            }
        }
        Tree::Object(members) => {
            let mut expected: Vec<&(String, Tree)> = members.iter().collect();
            if sorted {
                expected.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
            }
            assert_eq!(slice.length().unwrap(), members.len() as u64);
            for (member, (key, value)) in slice.object_iter().unwrap().zip(expected) {
                let (k, v) = member.unwrap();
                assert_eq!(k.get_str().unwrap(), key);
                assert_matches(v, value, sorted);
            }
        }
    }
}

proptest! {
    #[test]
    fn test_built_values_validate_and_read_back(
        tree in tree_strategy(),
        compact_arrays in any::<bool>(),
        compact_objects in any::<bool>(),
        sort in any::<bool>(),
    ) {
        let options = Options {
            build_unindexed_arrays: compact_arrays,
            build_unindexed_objects: compact_objects,
            sort_attribute_names: sort,
            ..Options::default()
        };
        let mut builder = Builder::with_options(options);
        build(&mut builder, &tree);
        let bytes = builder.start().unwrap();

        let validator = Validator::with_options(Options {
            validate_utf8_strings: true,
            ..Options::default()
        });
        prop_assert!(validator.validate(bytes).is_ok());

        let slice = Slice::new(bytes);
        prop_assert_eq!(slice.byte_size().unwrap(), bytes.len() as u64);
        assert_matches(slice, &tree, sort && !compact_objects);
    }

    #[test]
    fn test_member_byte_sizes_tile_the_payload(tree in tree_strategy()) {
        let mut builder = Builder::new();
        build(&mut builder, &tree);
        let slice = builder.slice().unwrap();
        if slice.is_array() && !slice.is_empty_array() {
            let total: u64 = slice
                .array_iter()
                .unwrap()
                .map(|m| m.unwrap().byte_size().unwrap())
                .sum();
            prop_assert!(total < slice.byte_size().unwrap());
        }
    }

    #[test]
    fn test_normalized_hash_ignores_layout(tree in tree_strategy()) {
        let mut indexed = Builder::new();
        build(&mut indexed, &tree);
        let mut compact = Builder::with_options(Options {
            build_unindexed_arrays: true,
            build_unindexed_objects: true,
            ..Options::default()
        });
        build(&mut compact, &tree);
        prop_assert_eq!(
            indexed.slice().unwrap().normalized_hash_default().unwrap(),
            compact.slice().unwrap().normalized_hash_default().unwrap()
        );
    }

    #[test]
    fn test_validator_never_panics(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let validator = Validator::new();
        if let Ok(size) = validator.validate_part(&data) {
            let slice = Slice::new(&data);
            prop_assert_eq!(slice.byte_size().unwrap(), size as u64);
            if slice.is_array() {
                for member in slice.array_iter().unwrap() {
                    prop_assert!(member.is_ok());
                }
            }
            if slice.is_object() {
                for member in slice.object_iter().unwrap() {
                    prop_assert!(member.is_ok());
                }
                let _ = slice.get("a").unwrap();
            }
        }
    }
}
