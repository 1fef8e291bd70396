//! Property-Based Test Generators
//!
//! Provides proptest strategies for filter keys, operator tokens and order
//! specs.

use proptest::prelude::*;

/// Strategy for plausible column names
pub fn column_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,15}".prop_map(|s| s)
}

/// Strategy for every operator token in the alias table
pub fn known_operator_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "eq", "neq", "ne", "gt", "egt", "gte", "ge", "lt", "le", "lte", "elt", "like",
        "not_like", "not like", "in", "not_in", "not in", "between", "not_between",
        "not between",
    ])
}

/// Strategy for the scalar comparison tokens only
pub fn comparison_operator_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "eq", "neq", "ne", "gt", "egt", "gte", "ge", "lt", "le", "lte", "elt", "like",
        "not_like", "not like",
    ])
}

/// Strategy for tokens outside the alias table
pub fn unknown_operator_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,8}".prop_filter("must not be a known operator", |token| {
        query_kernel::Operator::parse(token).is_none()
    })
}

/// Strategy for order specs with their expected (column, descending) pairs
pub fn order_spec_strategy() -> impl Strategy<Value = (String, Vec<(String, bool)>)> {
    prop::collection::vec((column_strategy(), prop::option::of(any::<bool>())), 1..5).prop_map(
        |items| {
            let spec = items
                .iter()
                .map(|(column, dir)| match dir {
                    None => column.clone(),
                    Some(true) => format!("{} desc", column),
                    Some(false) => format!("{} ASC", column),
                })
                .collect::<Vec<_>>()
                .join(" , ");
            let expected = items
                .into_iter()
                .map(|(column, dir)| (column, dir == Some(true)))
                .collect();
            (spec, expected)
        },
    )
}
