//! Property-based tests for the codec's core guarantees: round trip,
//! chunking independence, and numeric fidelity.

use chrono::DateTime;
use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use serde_zipson::number::{decode_float, decode_integer, encode_float, encode_integer};
use serde_zipson::{
    decode, encode_with_options, from_str, to_string, CompressOptions, Decoder, Map, Value,
};

fn exact() -> CompressOptions {
    CompressOptions::new().with_full_precision_floats(true)
}

fn roundtrip<T: Serialize + for<'de> Deserialize<'de> + PartialEq + std::fmt::Debug>(
    value: &T,
) -> bool {
    match to_string(value) {
        Ok(serialized) => match from_str::<T>(&serialized) {
            Ok(deserialized) => *value == deserialized,
            Err(e) => {
                eprintln!("Deserialize failed: {}", e);
                eprintln!("Serialized was: {}", serialized);
                false
            }
        },
        Err(e) => {
            eprintln!("Serialize failed: {}", e);
            false
        }
    }
}

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-12i64..12).prop_map(Value::Integer),
        any::<i64>().prop_map(Value::Integer),
        any::<f64>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(Value::Float),
        prop::sample::select(vec!["a", "b", "ab", ""]).prop_map(Value::from),
        "\\PC{0,8}".prop_map(Value::String),
        (-10_000_000_000_000i64..10_000_000_000_000)
            .prop_filter_map("in range", DateTime::from_timestamp_millis)
            .prop_map(Value::Date),
        (-100_000_000i64..100_000_000)
            .prop_filter_map("in range", |units| DateTime::from_timestamp_millis(units * 100_000))
            .prop_map(Value::Date),
    ]
}

fn value() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Sequence),
            prop::collection::vec(("[a-c]{1,2}", inner), 0..6)
                .prop_map(|entries| Value::Mapping(entries.into_iter().collect::<Map>())),
        ]
    })
}

/// Sequences of same-shaped records, so templates and repeats kick in.
fn records() -> impl Strategy<Value = Value> {
    let record = (0i64..3, prop::sample::select(vec!["x", "y"]), any::<bool>()).prop_map(
        |(id, tag, flag)| {
            let mut pos = Map::new();
            pos.insert("x".to_string(), Value::Integer(id * 1000));
            pos.insert("flag".to_string(), Value::Bool(flag));
            let mut map = Map::new();
            map.insert("id".to_string(), Value::Integer(id));
            map.insert("tag".to_string(), Value::from(tag));
            map.insert("pos".to_string(), Value::Mapping(pos));
            Value::Mapping(map)
        },
    );
    prop::collection::vec(prop_oneof![4 => record, 1 => leaf()], 0..24).prop_map(Value::Sequence)
}

fn floor_boundary(text: &str, mut index: usize) -> usize {
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

proptest! {
    #[test]
    fn prop_value_roundtrip(value in value()) {
        let text = encode_with_options(&value, exact()).unwrap();
        prop_assert_eq!(decode(&text).unwrap(), value);
    }

    #[test]
    fn prop_record_roundtrip(value in records()) {
        let text = encode_with_options(&value, exact()).unwrap();
        prop_assert_eq!(decode(&text).unwrap(), value);
    }

    #[test]
    fn prop_incremental_equivalence(
        value in prop_oneof![value(), records()],
        a in any::<prop::sample::Index>(),
        b in any::<prop::sample::Index>(),
    ) {
        let text = encode_with_options(&value, exact()).unwrap();
        let i = floor_boundary(&text, a.index(text.len() + 1));
        let j = floor_boundary(&text, b.index(text.len() + 1));
        let (i, j) = (i.min(j), i.max(j));

        let mut decoder = Decoder::new();
        decoder.push(&text[..i]).unwrap();
        decoder.push(&text[i..j]).unwrap();
        decoder.push(&text[j..]).unwrap();
        prop_assert_eq!(decoder.finish().unwrap(), decode(&text).unwrap());
    }

    #[test]
    fn prop_integer_codec(n in any::<i64>()) {
        prop_assert_eq!(decode_integer(&encode_integer(n)).unwrap(), n);
    }

    #[test]
    fn prop_full_precision_float(f in any::<f64>().prop_filter("finite", |f| f.is_finite())) {
        let back = decode_float(&encode_float(f, true)).unwrap();
        prop_assert_eq!(back, f);
    }

    #[test]
    fn prop_reduced_precision_float(f in -1.0e6f64..1.0e6) {
        let back = decode_float(&encode_float(f, false)).unwrap();
        prop_assert!((back - f).abs() < 0.0006, "{} came back as {}", f, back);
    }

    #[test]
    fn prop_i64(n in any::<i64>()) {
        prop_assert!(roundtrip(&n));
    }

    #[test]
    fn prop_u32(n in any::<u32>()) {
        prop_assert!(roundtrip(&n));
    }

    #[test]
    fn prop_bool(b in any::<bool>()) {
        prop_assert!(roundtrip(&b));
    }

    #[test]
    fn prop_string(s in "\\PC*") {
        prop_assert!(roundtrip(&s));
    }

    #[test]
    fn prop_vec_i32(v in prop::collection::vec(any::<i32>(), 0..40)) {
        prop_assert!(roundtrip(&v));
    }

    #[test]
    fn prop_option_i32(opt in proptest::option::of(any::<i32>())) {
        prop_assert!(roundtrip(&opt));
    }

    #[test]
    fn prop_tuple_i32_bool(t in (any::<i32>(), any::<bool>())) {
        prop_assert!(roundtrip(&t));
    }
}
