use super::*;
use std::{
    cmp::Ordering,
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

fn hash_of(value: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn float64_rejects_non_finite() {
    assert!(Float64::try_new(f64::NAN).is_none());
    assert!(Float64::try_new(f64::INFINITY).is_none());
    assert!(Float64::try_new(f64::NEG_INFINITY).is_none());
    assert!(Float64::try_new(1.5).is_some());
}

#[test]
fn float64_normalizes_negative_zero() {
    let pos = Float64::try_new(0.0).unwrap();
    let neg = Float64::try_new(-0.0).unwrap();

    assert_eq!(pos, neg);
    assert_eq!(
        hash_of(&Value::Float(pos)),
        hash_of(&Value::Float(neg)),
        "canonical zero must hash identically"
    );
}

#[test]
fn na_is_distinct_from_every_domain_value() {
    let domain = [
        Value::Bool(false),
        Value::Int(0),
        Value::Float(Float64::try_new(0.0).unwrap()),
        Value::Text(String::new()),
    ];

    for value in domain {
        assert_ne!(Value::Na, value, "NA must not equal {value:?}");
    }
    assert_eq!(Value::Na, Value::Na);
    assert!(Value::Na.is_na());
}

#[test]
fn int_and_float_are_not_coerced_for_equality() {
    let int = Value::Int(5);
    let float = Value::Float(Float64::try_new(5.0).unwrap());

    assert_ne!(int, float);
    assert_eq!(int.as_f64(), float.as_f64());
}

#[test]
fn canonical_ordering_is_total_and_stable() {
    let mut values = vec![
        Value::Text("b".to_string()),
        Value::Na,
        Value::Int(-3),
        Value::Bool(true),
        Value::Float(Float64::try_new(2.5).unwrap()),
        Value::Int(7),
        Value::Bool(false),
        Value::Text("a".to_string()),
    ];

    values.sort();
    let resorted = {
        let mut v = values.clone();
        v.sort();
        v
    };
    assert_eq!(values, resorted, "sorting must be idempotent");

    // within-variant natural order survives
    let ints: Vec<i64> = values.iter().filter_map(Value::as_int).collect();
    assert_eq!(ints, vec![-3, 7]);

    // cross-variant order follows canonical rank
    for pair in values.windows(2) {
        assert_ne!(pair[0].cmp(&pair[1]), Ordering::Greater);
    }
}

#[test]
fn kind_checks_admit_na_everywhere() {
    assert!(Value::Na.matches_kind(ValueKind::Int));
    assert!(Value::Na.matches_kind(ValueKind::Text));
    assert!(Value::Int(1).matches_kind(ValueKind::Int));
    assert!(!Value::Int(1).matches_kind(ValueKind::Float));
    assert!(!Value::Text("x".into()).matches_kind(ValueKind::Bool));
}

#[test]
fn value_from_conversions() {
    assert_eq!(Value::from(true), Value::Bool(true));
    assert_eq!(Value::from(42i64), Value::Int(42));
    assert_eq!(Value::from(7i32), Value::Int(7));
    assert_eq!(Value::from("gene"), Value::Text("gene".to_string()));
}

#[test]
fn value_serde_round_trip() {
    let values = vec![
        Value::Bool(true),
        Value::Float(Float64::try_new(-1.25).unwrap()),
        Value::Int(99),
        Value::Na,
        Value::Text("row".to_string()),
    ];

    let json = serde_json::to_string(&values).expect("serialize values");
    let back: Vec<Value> = serde_json::from_str(&json).expect("deserialize values");
    assert_eq!(values, back);
}

#[test]
fn float64_deserialize_rejects_non_finite() {
    let result: Result<Float64, _> = serde_json::from_str("1e999");
    assert!(result.is_err(), "overflowing float must not deserialize");
}
