//! Tests for filter parsing and the unknown-operator policies

use query_kernel::{
    FilterSpec, OrderClause, Predicate, QueryError, UnknownOperatorPolicy,
};
use serde_json::json;

fn compile(value: serde_json::Value) -> Result<query_kernel::CompiledFilter, QueryError> {
    FilterSpec::from(value).compile("id", UnknownOperatorPolicy::Verbatim)
}

#[test]
fn test_unknown_operator_verbatim() {
    let compiled = compile(json!({ "name:ilike": "%bob%" })).unwrap();

    assert_eq!(
        compiled.predicates,
        vec![Predicate::Compare {
            column: "name".into(),
            operator: "ilike".into(),
            value: json!("%bob%"),
        }]
    );
}

#[test]
fn test_unknown_operator_equality_policy() {
    let compiled = FilterSpec::from(json!({ "name:ilike": "bob" }))
        .compile("id", UnknownOperatorPolicy::Equality)
        .unwrap();

    assert_eq!(
        compiled.predicates,
        vec![Predicate::Eq {
            column: "name:ilike".into(),
            value: json!("bob"),
        }]
    );
}

#[test]
fn test_unknown_operator_reject_policy() {
    let err = FilterSpec::from(json!({ "name:ilike": "bob" }))
        .compile("id", UnknownOperatorPolicy::Reject)
        .unwrap_err();

    assert_eq!(
        err,
        QueryError::UnknownOperator {
            column: "name".into(),
            operator: "ilike".into(),
        }
    );
}

#[test]
fn test_operator_token_is_trimmed() {
    let compiled = compile(json!({ "age: lte ": 9 })).unwrap();
    assert_eq!(
        compiled.predicates,
        vec![Predicate::Compare {
            column: "age".into(),
            operator: "<=".into(),
            value: json!(9),
        }]
    );
}

#[test]
fn test_split_on_first_colon_only() {
    let compiled = compile(json!({ "meta:eq:x": 1 })).unwrap();
    assert_eq!(compiled.predicates[0].column(), "meta");
    assert!(matches!(
        &compiled.predicates[0],
        Predicate::Compare { operator, .. } if operator == "eq:x"
    ));
}

#[test]
fn test_spaced_aliases() {
    let compiled = compile(json!({
        "a:not in": [1],
        "b:not between": [1, 2],
        "c:not like": "x%",
    }))
    .unwrap();

    assert!(matches!(compiled.predicates[0], Predicate::NotIn { .. }));
    assert!(matches!(compiled.predicates[1], Predicate::NotBetween { .. }));
    assert!(matches!(
        &compiled.predicates[2],
        Predicate::Compare { operator, .. } if operator == "NOT LIKE"
    ));
}

#[test]
fn test_in_wraps_scalar() {
    let compiled = compile(json!({ "id:in": 5 })).unwrap();
    assert_eq!(
        compiled.predicates,
        vec![Predicate::In {
            column: "id".into(),
            values: vec![json!(5)],
        }]
    );
}

#[test]
fn test_between_requires_two_bounds() {
    assert!(compile(json!({ "age:between": [1, 2, 3] })).unwrap_err().is_invalid_filter());
    assert!(compile(json!({ "age:not_between": 4 })).unwrap_err().is_invalid_filter());
}

#[test]
fn test_empty_operator_rejected() {
    assert!(compile(json!({ "age:": 4 })).unwrap_err().is_invalid_filter());
    assert!(compile(json!({ ":gt": 4 })).unwrap_err().is_invalid_filter());
}

#[test]
fn test_reserved_null_values_ignored() {
    let compiled = compile(json!({ "order": null, "limit": null, "name": "x" })).unwrap();
    assert!(compiled.order.is_empty());
    assert!(compiled.limit.is_none());
    assert_eq!(compiled.predicates.len(), 1);
}

#[test]
fn test_bad_limit() {
    assert!(compile(json!({ "limit": -1 })).is_err());
    assert!(compile(json!({ "offset": "ten" })).is_err());
    assert!(compile(json!({ "order": 3 })).is_err());
}

#[test]
fn test_group_accepts_list_or_string() {
    let from_string = compile(json!({ "group": "a, b" })).unwrap();
    let from_list = compile(json!({ "group": ["a", "b"] })).unwrap();
    assert_eq!(from_string.group, vec!["a", "b"]);
    assert_eq!(from_string.group, from_list.group);
}

#[test]
fn test_order_parsed() {
    let compiled = compile(json!({ "order": "id desc, name" })).unwrap();
    assert_eq!(
        compiled.order,
        vec![OrderClause::desc("id"), OrderClause::asc("name")]
    );
    assert!(compiled.has_window());
}

#[test]
fn test_list_filter_rejected() {
    assert!(compile(json!([1, 2])).unwrap_err().is_invalid_filter());
}

#[test]
fn test_null_filter_matches_everything() {
    let compiled = compile(serde_json::Value::Null).unwrap();
    assert!(compiled.predicates.is_empty());
    assert!(!compiled.has_window());
}

#[test]
fn test_filter_spec_deserializes() {
    let spec: FilterSpec = serde_json::from_str("42").unwrap();
    assert_eq!(spec, FilterSpec::key(42));

    let spec: FilterSpec = serde_json::from_str(r#"{"a": 1}"#).unwrap();
    assert!(matches!(spec, FilterSpec::Conditions(_)));
}
