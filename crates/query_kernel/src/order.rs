//! Order specification parsing
//!
//! An order spec is a comma separated list of `column [direction]` items,
//! e.g. `"id desc, name"`. A missing direction means ascending.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// Parses a direction token case-insensitively
    pub fn parse(token: &str) -> Option<Direction> {
        match token.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Direction::Asc),
            "desc" => Some(Direction::Desc),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Asc => f.write_str("asc"),
            Direction::Desc => f.write_str("desc"),
        }
    }
}

/// A single `ORDER BY` item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderClause {
    pub column: String,
    pub direction: Direction,
}

impl OrderClause {
    pub fn new(column: impl Into<String>, direction: Direction) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    pub fn asc(column: impl Into<String>) -> Self {
        Self::new(column, Direction::Asc)
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self::new(column, Direction::Desc)
    }
}

/// Parses an order spec into clauses, preserving their order
///
/// Empty segments are skipped, so `"id desc,,"` yields one clause.
///
/// # Errors
///
/// Returns `QueryError::InvalidFilterExpression` when a direction token is
/// neither `asc` nor `desc`, or when a segment has trailing tokens after the
/// direction.
///
/// # Example
///
/// ```rust
/// use query_kernel::order::{parse_order, OrderClause};
///
/// let clauses = parse_order("id desc, name").unwrap();
/// assert_eq!(clauses, vec![OrderClause::desc("id"), OrderClause::asc("name")]);
/// ```
pub fn parse_order(spec: &str) -> Result<Vec<OrderClause>, QueryError> {
    let mut clauses = Vec::new();

    for item in spec.split(',') {
        let mut tokens = item.split_whitespace();
        let Some(column) = tokens.next() else {
            continue;
        };

        let direction = match tokens.next() {
            None => Direction::Asc,
            Some(token) => Direction::parse(token).ok_or_else(|| {
                QueryError::invalid_filter(format!(
                    "invalid order direction '{}' for column '{}'",
                    token, column
                ))
            })?,
        };

        if let Some(extra) = tokens.next() {
            return Err(QueryError::invalid_filter(format!(
                "unexpected token '{}' in order item '{}'",
                extra,
                item.trim()
            )));
        }

        clauses.push(OrderClause::new(column, direction));
    }

    Ok(clauses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_direction_defaults_to_asc() {
        let clauses = parse_order("id desc, name").unwrap();
        assert_eq!(
            clauses,
            vec![OrderClause::desc("id"), OrderClause::asc("name")]
        );
    }

    #[test]
    fn test_empty_segments_skipped() {
        assert!(parse_order("").unwrap().is_empty());
        assert_eq!(parse_order(" , type ASC ,").unwrap(), vec![OrderClause::asc("type")]);
    }

    #[test]
    fn test_bad_direction() {
        let err = parse_order("id sideways").unwrap_err();
        assert!(err.is_invalid_filter());
        assert!(parse_order("id desc nulls").is_err());
    }

    proptest! {
        #[test]
        fn parsed_columns_keep_input_order(
            columns in proptest::collection::vec("[a-z_][a-z0-9_]{0,12}", 1..6),
            descending in proptest::collection::vec(any::<bool>(), 6),
        ) {
            let spec = columns
                .iter()
                .zip(descending.iter())
                .map(|(c, d)| if *d { format!("{} desc", c) } else { c.clone() })
                .collect::<Vec<_>>()
                .join(", ");

            let clauses = parse_order(&spec).unwrap();
            prop_assert_eq!(clauses.len(), columns.len());
            for ((clause, column), desc) in clauses.iter().zip(columns.iter()).zip(descending.iter()) {
                prop_assert_eq!(&clause.column, column);
                let expected = if *desc { Direction::Desc } else { Direction::Asc };
                prop_assert_eq!(clause.direction, expected);
            }
        }
    }
}
