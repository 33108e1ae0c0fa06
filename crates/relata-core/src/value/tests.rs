use super::*;
use serde_json::json;

#[test]
fn numeric_comparison_crosses_int_uint_and_float() {
    assert_eq!(Value::Int(3).cmp_numeric(&Value::Uint(3)), Some(Ordering::Equal));
    assert_eq!(Value::Int(-1).cmp_numeric(&Value::Uint(0)), Some(Ordering::Less));
    assert_eq!(
        Value::Uint(u64::MAX).cmp_numeric(&Value::Int(i64::MAX)),
        Some(Ordering::Greater)
    );
    assert_eq!(
        Value::Float64(2.5).cmp_numeric(&Value::Int(2)),
        Some(Ordering::Greater)
    );
    assert_eq!(Value::Text("1".into()).cmp_numeric(&Value::Int(1)), None);
}

#[test]
fn semantic_eq_is_family_aware() {
    assert_eq!(Value::Int(1).semantic_eq(&Value::Uint(1)), Some(true));
    assert_eq!(
        Value::Text("Fiction".into()).semantic_eq(&Value::Text("Fiction".into())),
        Some(true)
    );
    assert_eq!(Value::Text("1".into()).semantic_eq(&Value::Int(1)), None);
    assert_eq!(Value::Null.semantic_eq(&Value::Null), Some(true));
    assert_eq!(Value::Null.semantic_eq(&Value::Int(0)), Some(false));
    assert_eq!(
        Value::from_list(vec![1i64, 3]).semantic_eq(&Value::from_list(vec![1u64, 3])),
        Some(true)
    );
}

#[test]
fn in_list_requires_list_haystack() {
    let haystack = Value::from_list(vec!["a", "b"]);

    assert_eq!(Value::Text("b".into()).in_list(&haystack), Some(true));
    assert_eq!(Value::Text("c".into()).in_list(&haystack), Some(false));
    assert_eq!(Value::Text("b".into()).in_list(&Value::Text("b".into())), None);
}

#[test]
fn json_conversion_preserves_shape() {
    let json = json!([null, true, 1, -2, 18_446_744_073_709_551_615u64, 1.5, "x"]);
    let value = Value::from_json(&json).expect("array should convert");

    assert_eq!(
        value,
        Value::List(vec![
            Value::Null,
            Value::Bool(true),
            Value::Int(1),
            Value::Int(-2),
            Value::Uint(u64::MAX),
            Value::Float64(1.5),
            Value::Text("x".into()),
        ])
    );
    assert_eq!(value.to_json(), json);
}

#[test]
fn json_objects_are_rejected() {
    let err = Value::from_json(&json!({"a": 1})).expect_err("objects are not values");

    assert_eq!(err, JsonValueError::Object);
}

#[test]
fn serialize_is_untagged() {
    let value = Value::List(vec![Value::Int(1), Value::Text("a".into()), Value::Null]);
    let rendered = serde_json::to_value(&value).expect("value should serialize");

    assert_eq!(rendered, json!([1, "a", null]));
}

#[test]
fn integers_beyond_f64_precision_compare_exactly_with_floats() {
    let big = Value::Int((1 << 53) + 1);

    assert_eq!(big.semantic_eq(&Value::Float64(1.5)), Some(false));
    assert_eq!(big.semantic_cmp(&Value::Float64(1.5)), Some(Ordering::Greater));
    // 2^53 + 1 is not representable; the nearest float is 2^53.
    assert_eq!(
        big.cmp_numeric(&Value::Float64(9_007_199_254_740_992.0)),
        Some(Ordering::Greater)
    );
    assert_eq!(
        Value::Uint(u64::MAX).cmp_numeric(&Value::Float64(f64::INFINITY)),
        Some(Ordering::Less)
    );
    assert_eq!(
        Value::Float64(-0.5).cmp_numeric(&Value::Int(0)),
        Some(Ordering::Less)
    );
    assert_eq!(
        Value::Int(-1).cmp_numeric(&Value::Float64(-1.5)),
        Some(Ordering::Greater)
    );
    assert_eq!(Value::Int(1).cmp_numeric(&Value::Float64(f64::NAN)), None);
}
