//! Custom Test Assertions
//!
//! Assertion helpers for repository records that give more meaningful
//! failure messages than comparing whole JSON maps.

use infra_db::Record;
use query_kernel::Page;
use serde_json::Value;

/// Asserts that a record holds exactly the given columns, in any order
pub fn assert_columns(record: &Record, expected: &[&str]) {
    let mut actual: Vec<&str> = record.keys().map(String::as_str).collect();
    let mut expected = expected.to_vec();
    actual.sort_unstable();
    expected.sort_unstable();
    assert_eq!(actual, expected, "Column mismatch for record {:?}", record);
}

/// Asserts that a record column equals `expected`
pub fn assert_field(record: &Record, column: &str, expected: Value) {
    assert_eq!(
        record.get(column),
        Some(&expected),
        "Unexpected value for '{}' in record {:?}",
        column,
        record
    );
}

/// Asserts the length of an eagerly loaded to-many relation
pub fn assert_relation_len(record: &Record, relation: &str, expected: usize) {
    let loaded = record
        .get(relation)
        .and_then(Value::as_array)
        .unwrap_or_else(|| panic!("Relation '{}' not loaded as a list in {:?}", relation, record));
    assert_eq!(
        loaded.len(),
        expected,
        "Expected {} '{}' rows, got {}",
        expected,
        relation,
        loaded.len()
    );
}

/// Asserts the total and row count of a page
pub fn assert_page(page: &Page<Record>, total: u64, rows: usize) {
    assert_eq!(page.total, total, "Unexpected page total");
    assert_eq!(page.rows.len(), rows, "Unexpected page row count");
}
