use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parsekit_core::{to_native, to_wire, Value};
use proptest::prelude::*;

fn arb_date() -> impl Strategy<Value = DateTime<Utc>> {
    // Millisecond precision, years 1970..2100.
    (0i64..4_102_444_800_000).prop_map(|millis| {
        DateTime::<Utc>::from_timestamp_millis(millis).expect("in range")
    })
}

fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        (-1.0e12f64..1.0e12f64).prop_map(Value::Float),
        (-1_000_000i64..1_000_000).prop_map(|n| Value::Float(n as f64)),
        ".{0,12}".prop_map(Value::String),
        prop::collection::vec(any::<u8>(), 0..32).prop_map(Value::Bytes),
        arb_date().prop_map(Value::Date),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    arb_leaf().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::List),
            prop::collection::btree_map("[a-z][a-z_]{0,7}", inner, 0..6)
                .prop_map(|map: BTreeMap<String, Value>| Value::Map(map)),
        ]
    })
}

#[test]
fn integral_float_stays_a_float() {
    let wire = to_wire(&Value::Float(2.0)).unwrap();
    assert_eq!(serde_json::to_string(&wire).unwrap(), "2.0");
    let reparsed: serde_json::Value = serde_json::from_str("2.0").unwrap();
    assert_eq!(to_native(&reparsed).unwrap(), Value::Float(2.0));
    assert_eq!(to_native(&wire).unwrap(), Value::Float(2.0));
}

proptest! {
    #[test]
    fn wire_round_trip_restores_native_value(value in arb_value()) {
        let wire = to_wire(&value).unwrap();
        prop_assert_eq!(to_native(&wire).unwrap(), value);
    }

    #[test]
    fn containers_keep_their_element_count(values in prop::collection::vec(arb_value(), 0..8)) {
        let wire = to_wire(&Value::List(values.clone())).unwrap();
        prop_assert_eq!(wire.as_array().map(Vec::len), Some(values.len()));
        match to_native(&wire).unwrap() {
            Value::List(back) => prop_assert_eq!(back.len(), values.len()),
            other => prop_assert!(false, "expected list, got {}", other.kind()),
        }
    }
}
