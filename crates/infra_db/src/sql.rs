//! SQL rendering helpers
//!
//! Identifiers are always double-quoted and values are always bound, so
//! column names and filter values from callers never reach the SQL text
//! unescaped. Comparison operators cannot be bound; they are checked against
//! [`render_operator`] instead.
//!
//! SQLx declares a type for every parameter and sends it in binary, so a
//! string bound as `text` never converts to a `bigint`, `timestamptz` or
//! `uuid` column. [`push_column_value`] hands strings to the server inside a
//! `jsonb` object and expands it through the table's row type, which parses
//! the string with the column's own input function.

use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};

use crate::error::DatabaseError;

/// Builder type every query in this crate renders into
pub type PgSql = QueryBuilder<'static, Postgres>;

/// Keyword operators accepted in addition to the symbolic ones
const KEYWORD_OPERATORS: &[&str] = &[
    "LIKE",
    "NOT LIKE",
    "ILIKE",
    "NOT ILIKE",
    "SIMILAR TO",
    "NOT SIMILAR TO",
    "IS DISTINCT FROM",
    "IS NOT DISTINCT FROM",
];

const SYMBOL_CHARS: &[char] = &['<', '>', '=', '!', '~', '*', '@', '&', '|'];

/// Quotes an identifier, keeping `*` and splitting `table.column`
///
/// ```rust
/// use infra_db::sql::quote_ident;
///
/// assert_eq!(quote_ident("users.id"), r#""users"."id""#);
/// assert_eq!(quote_ident("*"), "*");
/// assert_eq!(quote_ident(r#"we"ird"#), r#""we""ird""#);
/// ```
pub fn quote_ident(name: &str) -> String {
    name.split('.')
        .map(|segment| {
            if segment == "*" {
                segment.to_string()
            } else {
                format!("\"{}\"", segment.replace('"', "\"\""))
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Quotes and joins a column list
pub fn column_list(columns: &[String]) -> String {
    if columns.is_empty() {
        return "*".to_string();
    }
    columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Normalizes a comparison operator or refuses it
///
/// Accepts up to three characters from `< > = ! ~ * @ & |`, or one of a
/// small set of keyword operators (case-insensitive, any inner whitespace).
pub fn render_operator(operator: &str) -> Result<String, DatabaseError> {
    let trimmed = operator.trim();

    let symbolic = !trimmed.is_empty()
        && trimmed.chars().count() <= 3
        && trimmed.chars().all(|c| SYMBOL_CHARS.contains(&c));
    if symbolic {
        return Ok(trimmed.to_string());
    }

    let keyword = trimmed
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase();
    if KEYWORD_OPERATORS.contains(&keyword.as_str()) {
        return Ok(keyword);
    }

    Err(DatabaseError::InvalidOperator(operator.to_string()))
}

/// Binds a JSON value with the closest PostgreSQL type
///
/// `null` renders as a literal `NULL`; arrays and objects bind as `jsonb`.
/// Strings bind as `text`; use [`push_column_value`] when the value meets a
/// table column.
pub fn push_value(sql: &mut PgSql, value: &Value) {
    match value {
        Value::Null => {
            sql.push("NULL");
        }
        Value::Bool(b) => {
            sql.push_bind(*b);
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                sql.push_bind(i);
            } else {
                sql.push_bind(n.as_f64().unwrap_or(f64::NAN));
            }
        }
        Value::String(s) => {
            sql.push_bind(s.clone());
        }
        Value::Array(_) | Value::Object(_) => {
            sql.push_bind(Json(value.clone()));
        }
    }
}

/// Binds a value compared with, or stored into, `table.column`
///
/// Numbers and booleans keep their own type and rely on PostgreSQL's numeric
/// promotion. A string renders as
/// `(jsonb_populate_record(NULL::"table", $n))."column"` with
/// `$n = {"column": "<string>"}`, so `"42"` reaches a `bigint` column as a
/// `bigint` and `"2024-01-01"` a `timestamptz` column as a `timestamptz`.
pub fn push_column_value(sql: &mut PgSql, table: &str, column: &str, value: &Value) {
    let Value::String(_) = value else {
        push_value(sql, value);
        return;
    };

    let field = column.rsplit('.').next().unwrap_or(column);
    let mut row = Map::new();
    row.insert(field.to_string(), value.clone());

    sql.push("(jsonb_populate_record(NULL::");
    sql.push(quote_ident(table));
    sql.push(", ");
    sql.push_bind(Json(Value::Object(row)));
    sql.push(")).");
    sql.push(quote_ident(field));
}

/// Pushes `value, value, ...` for one column as separate bind parameters
pub fn push_column_values(sql: &mut PgSql, table: &str, column: &str, values: &[Value]) {
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            sql.push(", ");
        }
        push_column_value(sql, table, column, value);
    }
}
