use crate::{LogicError, Value};
use std::cmp::Ordering;

#[test]
fn test_integer_and_float_compare_numerically() {
    assert!(Value::Integer(1).checked_eq(&Value::Float(1.0)).unwrap());
    assert!(!Value::Integer(1).checked_eq(&Value::Float(1.5)).unwrap());
    assert_eq!(
        Value::Integer(2).compare(&Value::Float(1.5)).unwrap(),
        Ordering::Greater
    );
}

#[test]
fn test_large_integers_compare_exactly_with_floats() {
    // 2^53 + 1 has no f64 representation; rounding it would make these equal
    let odd = Value::Integer(9_007_199_254_740_993);
    let even = Value::Float(9_007_199_254_740_992.0);
    assert!(!odd.checked_eq(&even).unwrap());
    assert_ne!(odd, even);
    assert_eq!(odd.compare(&even).unwrap(), Ordering::Greater);
    assert_eq!(even.compare(&odd).unwrap(), Ordering::Less);

    assert_eq!(Value::Integer(9_007_199_254_740_992), even);
    assert_eq!(Value::Integer(i64::MIN), Value::Float(-9_223_372_036_854_775_808.0));
    assert_eq!(
        Value::Integer(i64::MAX).compare(&Value::Float(9_223_372_036_854_775_808.0)).unwrap(),
        Ordering::Less
    );
    assert_eq!(
        Value::Integer(-1).compare(&Value::Float(-1.5)).unwrap(),
        Ordering::Greater
    );
    assert_eq!(
        Value::Integer(i64::MIN).compare(&Value::Float(f64::NEG_INFINITY)).unwrap(),
        Ordering::Greater
    );
    assert!(Value::Integer(1).compare(&Value::Float(f64::NAN)).is_err());
}

#[test]
fn test_shape_measures_depth_and_size() {
    let nested = Value::collection([
        Value::from(1),
        Value::object([("name", Value::from("abc"))]),
    ]);
    let shape = nested.shape(usize::MAX);
    assert_eq!(shape.depth, 2);
    assert_eq!(shape.size, 4);
    assert_eq!(shape.longest_string, 3);
    assert_eq!(Value::from(7).shape(usize::MAX).depth, 0);
    // Counting stops just past the cap
    assert_eq!(nested.shape(2).size, 3);
}

#[test]
fn test_null_equals_only_null() {
    assert!(Value::Null.checked_eq(&Value::Null).unwrap());
    assert!(!Value::Null.checked_eq(&Value::Integer(0)).unwrap());
    assert!(!Value::from("x").checked_eq(&Value::Null).unwrap());
}

#[test]
fn test_equality_across_kinds_is_a_type_mismatch() {
    let result = Value::from("1").checked_eq(&Value::Integer(1));
    assert!(matches!(result, Err(LogicError::TypeMismatch { .. })));

    let result = Value::Boolean(true).checked_eq(&Value::collection([]));
    assert!(matches!(result, Err(LogicError::TypeMismatch { .. })));
}

#[test]
fn test_ordering_is_only_defined_for_numbers_and_strings() {
    assert_eq!(
        Value::from("apple").compare(&Value::from("banana")).unwrap(),
        Ordering::Less
    );
    assert!(Value::Boolean(true).compare(&Value::Boolean(false)).is_err());
    assert!(Value::Integer(1).compare(&Value::from("1")).is_err());
}

#[test]
fn test_structural_equality_of_collections_and_objects() {
    let a = Value::object([("xs", Value::collection([Value::Integer(1), Value::Float(2.0)]))]);
    let b = Value::object([("xs", Value::collection([Value::Float(1.0), Value::Integer(2)]))]);
    assert!(a.checked_eq(&b).unwrap());

    let c = Value::object([("xs", Value::collection([Value::Integer(1)]))]);
    assert!(!a.checked_eq(&c).unwrap());
}

#[test]
fn test_accessors_fail_with_type_mismatch() {
    let value = Value::from("text");
    assert_eq!(value.as_str().unwrap(), "text");
    match value.as_integer() {
        Err(LogicError::TypeMismatch {
            expected, found, ..
        }) => {
            assert_eq!(expected, "integer");
            assert_eq!(found, "string");
        }
        other => panic!("expected type mismatch, got {:?}", other),
    }
    assert!(Value::Null.as_bool().is_err());
    assert_eq!(Value::Integer(3).as_float().unwrap(), 3.0);
}

#[test]
fn test_indexed_access_is_bounds_checked() {
    let items = Value::collection([Value::from("a"), Value::from("b")]);
    assert_eq!(items.at(1).unwrap(), &Value::from("b"));
    assert!(matches!(
        items.at(2),
        Err(LogicError::IndexOutOfRange { index: 2, len: 2 })
    ));
    assert!(matches!(
        items.at(-1),
        Err(LogicError::IndexOutOfRange { index: -1, len: 2 })
    ));
}

#[test]
fn test_contains_scans_by_value() {
    let items = Value::collection([Value::Integer(1), Value::from("two")]);
    assert!(items.contains(&Value::Float(1.0)).unwrap());
    assert!(items.contains(&Value::from("two")).unwrap());
    assert!(!items.contains(&Value::Integer(3)).unwrap());
    assert!(Value::Integer(1).contains(&Value::Integer(1)).is_err());
}

#[test]
fn test_object_keys_iterate_in_sorted_order() {
    let value: Value = serde_json::from_str(r#"{"zeta": 1, "alpha": 2, "mid": 3}"#).unwrap();
    let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
    assert_eq!(keys, ["alpha", "mid", "zeta"]);
}

#[test]
fn test_values_deserialize_from_plain_json() {
    let value: Value = serde_json::from_str(r#"[1, 2.5, null, "x", true, {"k": []}]"#).unwrap();
    assert_eq!(
        value,
        Value::collection([
            Value::Integer(1),
            Value::Float(2.5),
            Value::Null,
            Value::from("x"),
            Value::Boolean(true),
            Value::object([("k", Value::collection([]))]),
        ])
    );
    assert!(matches!(value.at(0).unwrap(), Value::Integer(1)));
}

#[test]
fn test_display() {
    let value = Value::object([
        ("name", Value::from("x")),
        ("sizes", Value::collection([Value::Integer(1), Value::Float(2.0)])),
    ]);
    assert_eq!(value.to_string(), r#"{"name": "x", "sizes": [1, 2.0]}"#);
    assert_eq!(Value::Null.to_string(), "null");
}
