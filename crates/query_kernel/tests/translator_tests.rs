//! Tests for building queries from filter and projection specs

mod common;

use common::{builder_for, translator, Call};
use query_kernel::{Direction, FilterSpec, ProjectionSpec, QueryError};
use serde_json::json;

#[test]
fn test_bare_column_is_equality() {
    let builder = translator()
        .build_query(builder_for("user"), &json!({ "age": 30 }).into(), &ProjectionSpec::new())
        .unwrap();

    assert_eq!(builder.calls, vec![Call::WhereEq("age".into(), json!(30))]);
}

#[test]
fn test_comparison_operator() {
    let builder = translator()
        .build_query(builder_for("user"), &json!({ "age:gt": 30 }).into(), &ProjectionSpec::new())
        .unwrap();

    assert_eq!(
        builder.calls,
        vec![Call::WhereCompare("age".into(), ">".into(), json!(30))]
    );
}

#[test]
fn test_in_uses_exact_set() {
    let builder = translator()
        .build_query(
            builder_for("user"),
            &json!({ "age:in": [1, 2, 3] }).into(),
            &ProjectionSpec::new(),
        )
        .unwrap();

    assert_eq!(
        builder.calls,
        vec![Call::WhereIn("age".into(), vec![json!(1), json!(2), json!(3)])]
    );
}

#[test]
fn test_scalar_filter_targets_primary_key() {
    let scalar = translator()
        .build_query(builder_for("user"), &FilterSpec::from(42), &ProjectionSpec::new())
        .unwrap();
    let keyed = translator()
        .build_query(builder_for("user"), &json!({ "id": 42 }).into(), &ProjectionSpec::new())
        .unwrap();

    assert_eq!(scalar.calls, keyed.calls);
}

#[test]
fn test_scalar_filter_uses_model_primary_key() {
    let builder = translator()
        .build_query(builder_for("profile"), &FilterSpec::key(7), &ProjectionSpec::new())
        .unwrap();

    assert_eq!(builder.calls, vec![Call::WhereEq("user_id".into(), json!(7))]);
}

#[test]
fn test_shape_keys_applied_before_predicates() {
    let filters = json!({
        "status": "active",
        "group": "status",
        "offset": 20,
        "limit": "10",
        "order": "id desc, name",
    });

    let builder = translator()
        .build_query(builder_for("user"), &filters.into(), &ProjectionSpec::new())
        .unwrap();

    assert_eq!(
        builder.calls,
        vec![
            Call::OrderBy("id".into(), Direction::Desc),
            Call::OrderBy("name".into(), Direction::Asc),
            Call::Limit(10),
            Call::Offset(20),
            Call::GroupBy(vec!["status".into()]),
            Call::WhereEq("status".into(), json!("active")),
        ]
    );
}

#[test]
fn test_predicates_keep_insertion_order() {
    let filters = json!({
        "name:like": "a%",
        "age:between": [18, 65],
        "role:not_in": ["guest"],
        "score:egt": 5,
    });

    let builder = translator()
        .build_query(builder_for("user"), &filters.into(), &ProjectionSpec::new())
        .unwrap();

    assert_eq!(
        builder.calls,
        vec![
            Call::WhereCompare("name".into(), "LIKE".into(), json!("a%")),
            Call::WhereBetween("age".into(), json!(18), json!(65)),
            Call::WhereNotIn("role".into(), vec![json!("guest")]),
            Call::WhereCompare("score".into(), ">=".into(), json!(5)),
        ]
    );
}

#[test]
fn test_to_many_relation_projection() {
    let fields = ProjectionSpec::new()
        .column("flag")
        .relation("tags", ProjectionSpec::columns(["label"]));

    let builder = translator()
        .build_query(builder_for("user"), &FilterSpec::all(), &fields)
        .unwrap();

    assert_eq!(builder.selected(), Some(&["flag".to_string(), "id".to_string()][..]));

    let tags = builder.relation("tags").expect("tags eager loaded");
    assert_eq!(
        tags.selected(),
        Some(&["label".to_string(), "owner_id".to_string()][..])
    );
}

#[test]
fn test_empty_nested_projection_selects_everything() {
    let fields = ProjectionSpec::columns(["name"]).relation("tags", ProjectionSpec::new());

    let builder = translator()
        .build_query(builder_for("user"), &FilterSpec::all(), &fields)
        .unwrap();

    let tags = builder.relation("tags").unwrap();
    assert!(tags.calls.is_empty());
    assert_eq!(builder.selected(), Some(&["name".to_string(), "id".to_string()][..]));
}

#[test]
fn test_empty_projection_skips_select() {
    let builder = translator()
        .build_query(builder_for("user"), &FilterSpec::all(), &ProjectionSpec::new())
        .unwrap();

    assert!(builder.calls.is_empty());
    assert!(builder.relations.is_empty());
}

#[test]
fn test_unknown_relation_leaves_builder_untouched() {
    let mut builder = builder_for("user");
    let fields = ProjectionSpec::columns(["name"])
        .relation("tags", ProjectionSpec::columns(["label"]))
        .relation("followers", ProjectionSpec::new());

    let err = translator()
        .apply(&mut builder, &json!({ "age:gt": 30, "order": "id" }).into(), &fields)
        .unwrap_err();

    assert_eq!(err, QueryError::relation_not_found("user", "followers"));
    assert!(builder.calls.is_empty());
    assert!(builder.relations.is_empty());
}

#[test]
fn test_nested_unknown_relation_fails() {
    let fields = ProjectionSpec::new().relation(
        "posts",
        ProjectionSpec::columns(["title"]).relation("likes", ProjectionSpec::new()),
    );

    let err = translator()
        .build_query(builder_for("user"), &FilterSpec::all(), &fields)
        .unwrap_err();

    assert!(err.is_relation_not_found());
    assert!(err.to_string().contains("post"));
}

#[test]
fn test_invalid_filter_leaves_builder_untouched() {
    let mut builder = builder_for("user");
    let err = translator()
        .apply(
            &mut builder,
            &json!({ "order": "id", "age:between": [1] }).into(),
            &ProjectionSpec::columns(["id"]),
        )
        .unwrap_err();

    assert!(err.is_invalid_filter());
    assert!(builder.calls.is_empty());
}
