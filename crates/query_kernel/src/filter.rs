//! Filter specifications
//!
//! A filter is a flat JSON object whose keys are either a bare column name
//! (equality) or `column:operator`, plus the reserved shape keys `order`,
//! `limit`, `offset` and `group`. A non-object filter is shorthand for
//! "primary key equals this value".
//!
//! ```rust
//! use query_kernel::filter::{FilterSpec, Predicate};
//! use query_kernel::operator::UnknownOperatorPolicy;
//! use serde_json::json;
//!
//! let spec = FilterSpec::from(json!({ "age:gt": 30, "order": "id desc" }));
//! let compiled = spec.compile("id", UnknownOperatorPolicy::Verbatim).unwrap();
//!
//! assert_eq!(compiled.order.len(), 1);
//! assert_eq!(
//!     compiled.predicates,
//!     vec![Predicate::Compare { column: "age".into(), operator: ">".into(), value: json!(30) }]
//! );
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::QueryError;
use crate::operator::{Operator, UnknownOperatorPolicy};
use crate::order::{parse_order, OrderClause};
use crate::ports::QueryBuilder;

pub const ORDER_KEY: &str = "order";
pub const LIMIT_KEY: &str = "limit";
pub const OFFSET_KEY: &str = "offset";
pub const GROUP_KEY: &str = "group";

/// Separator between column and operator in a filter key
pub const OPERATOR_DELIMITER: char = ':';

/// Caller supplied filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum FilterSpec {
    /// Keyed conditions and shape directives, in insertion order
    Conditions(Map<String, Value>),
    /// Primary key lookup
    PrimaryKey(Value),
}

impl Default for FilterSpec {
    fn default() -> Self {
        FilterSpec::Conditions(Map::new())
    }
}

impl FilterSpec {
    /// A filter matching every row
    pub fn all() -> Self {
        Self::default()
    }

    /// Shorthand for a primary key lookup
    pub fn key(value: impl Into<Value>) -> Self {
        FilterSpec::PrimaryKey(value.into())
    }

    /// Normalizes the filter into keyed conditions
    pub fn into_conditions(self, primary_key: &str) -> Map<String, Value> {
        match self {
            FilterSpec::Conditions(map) => map,
            FilterSpec::PrimaryKey(value) => {
                let mut map = Map::new();
                map.insert(primary_key.to_string(), value);
                map
            }
        }
    }

    /// Parses the filter into shape directives and predicates
    ///
    /// Reserved keys are consumed first in the fixed order `order`, `limit`,
    /// `offset`, `group`. A reserved key whose value is `null` is dropped.
    /// The remaining keys become predicates in insertion order.
    ///
    /// # Errors
    ///
    /// `InvalidFilterExpression` for values whose shape cannot be used
    /// (non-integer limit, `between` without two bounds, array filters) and
    /// `UnknownOperator` under [`UnknownOperatorPolicy::Reject`].
    pub fn compile(
        &self,
        primary_key: &str,
        policy: UnknownOperatorPolicy,
    ) -> Result<CompiledFilter, QueryError> {
        if let FilterSpec::PrimaryKey(Value::Array(_)) = self {
            return Err(QueryError::invalid_filter(
                "a list is not a valid filter; use an object or a primary key value",
            ));
        }

        let mut conditions = self.clone().into_conditions(primary_key);
        let mut compiled = CompiledFilter::default();

        if let Some(order) = take_reserved(&mut conditions, ORDER_KEY) {
            let spec = order.as_str().ok_or_else(|| {
                QueryError::invalid_filter(format!("'order' must be a string, got {}", order))
            })?;
            compiled.order = parse_order(spec)?;
        }

        if let Some(limit) = take_reserved(&mut conditions, LIMIT_KEY) {
            compiled.limit = Some(parse_count(LIMIT_KEY, &limit)?);
        }

        if let Some(offset) = take_reserved(&mut conditions, OFFSET_KEY) {
            compiled.offset = Some(parse_count(OFFSET_KEY, &offset)?);
        }

        if let Some(group) = take_reserved(&mut conditions, GROUP_KEY) {
            compiled.group = parse_group(&group)?;
        }

        for (key, value) in conditions {
            compiled.predicates.push(parse_predicate(key, value, policy)?);
        }

        Ok(compiled)
    }
}

impl From<Value> for FilterSpec {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => FilterSpec::Conditions(map),
            Value::Null => FilterSpec::default(),
            other => FilterSpec::PrimaryKey(other),
        }
    }
}

impl From<FilterSpec> for Value {
    fn from(spec: FilterSpec) -> Self {
        match spec {
            FilterSpec::Conditions(map) => Value::Object(map),
            FilterSpec::PrimaryKey(value) => value,
        }
    }
}

impl From<Map<String, Value>> for FilterSpec {
    fn from(map: Map<String, Value>) -> Self {
        FilterSpec::Conditions(map)
    }
}

impl From<i64> for FilterSpec {
    fn from(id: i64) -> Self {
        FilterSpec::PrimaryKey(Value::from(id))
    }
}

impl From<&str> for FilterSpec {
    fn from(id: &str) -> Self {
        FilterSpec::PrimaryKey(Value::from(id))
    }
}

impl From<String> for FilterSpec {
    fn from(id: String) -> Self {
        FilterSpec::PrimaryKey(Value::from(id))
    }
}

/// A single predicate ready to be issued on a builder
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq {
        column: String,
        value: Value,
    },
    Compare {
        column: String,
        operator: String,
        value: Value,
    },
    In {
        column: String,
        values: Vec<Value>,
    },
    NotIn {
        column: String,
        values: Vec<Value>,
    },
    Between {
        column: String,
        low: Value,
        high: Value,
    },
    NotBetween {
        column: String,
        low: Value,
        high: Value,
    },
}

impl Predicate {
    pub fn column(&self) -> &str {
        match self {
            Predicate::Eq { column, .. }
            | Predicate::Compare { column, .. }
            | Predicate::In { column, .. }
            | Predicate::NotIn { column, .. }
            | Predicate::Between { column, .. }
            | Predicate::NotBetween { column, .. } => column,
        }
    }

    pub fn apply<B: QueryBuilder + ?Sized>(&self, builder: &mut B) {
        match self {
            Predicate::Eq { column, value } => builder.where_eq(column, value.clone()),
            Predicate::Compare {
                column,
                operator,
                value,
            } => builder.where_compare(column, operator, value.clone()),
            Predicate::In { column, values } => builder.where_in(column, values.clone()),
            Predicate::NotIn { column, values } => builder.where_not_in(column, values.clone()),
            Predicate::Between { column, low, high } => {
                builder.where_between(column, low.clone(), high.clone())
            }
            Predicate::NotBetween { column, low, high } => {
                builder.where_not_between(column, low.clone(), high.clone())
            }
        }
    }
}

/// Parsed filter: shape directives plus predicates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledFilter {
    pub order: Vec<OrderClause>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub group: Vec<String>,
    pub predicates: Vec<Predicate>,
}

impl CompiledFilter {
    /// True if the filter changes ordering or windowing of the result
    pub fn has_window(&self) -> bool {
        !self.order.is_empty() || self.limit.is_some() || self.offset.is_some()
    }

    /// Issues shape directives then predicates on `builder`
    pub fn apply<B: QueryBuilder + ?Sized>(&self, builder: &mut B) {
        for clause in &self.order {
            builder.order_by(&clause.column, clause.direction);
        }
        if let Some(limit) = self.limit {
            builder.limit(limit);
        }
        if let Some(offset) = self.offset {
            builder.offset(offset);
        }
        if !self.group.is_empty() {
            builder.group_by(&self.group);
        }
        for predicate in &self.predicates {
            predicate.apply(builder);
        }
    }
}

fn take_reserved(conditions: &mut Map<String, Value>, key: &str) -> Option<Value> {
    // shift_remove keeps the remaining keys in insertion order
    match conditions.shift_remove(key) {
        Some(Value::Null) | None => None,
        Some(value) => Some(value),
    }
}

fn parse_count(key: &str, value: &Value) -> Result<u64, QueryError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        QueryError::invalid_filter(format!(
            "'{}' must be a non-negative integer, got {}",
            key, value
        ))
    })
}

fn parse_group(value: &Value) -> Result<Vec<String>, QueryError> {
    let invalid =
        || QueryError::invalid_filter(format!("'group' must be a string or list of strings, got {}", value));

    let columns: Vec<String> = match value {
        Value::String(s) => s.split(',').map(str::to_string).collect(),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
            .collect::<Result<_, _>>()?,
        _ => return Err(invalid()),
    };

    Ok(columns
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect())
}

fn parse_predicate(
    key: String,
    value: Value,
    policy: UnknownOperatorPolicy,
) -> Result<Predicate, QueryError> {
    let Some((column, token)) = key.split_once(OPERATOR_DELIMITER) else {
        return Ok(Predicate::Eq { column: key, value });
    };

    let column = column.trim().to_string();
    let token = token.trim();
    if column.is_empty() || token.is_empty() {
        return Err(QueryError::invalid_filter(format!(
            "filter key '{}' needs both a column and an operator",
            key
        )));
    }

    let Some(operator) = Operator::parse(token) else {
        return match policy {
            UnknownOperatorPolicy::Verbatim => Ok(Predicate::Compare {
                column,
                operator: token.to_string(),
                value,
            }),
            UnknownOperatorPolicy::Equality => Ok(Predicate::Eq { column: key, value }),
            UnknownOperatorPolicy::Reject => Err(QueryError::UnknownOperator {
                column,
                operator: token.to_string(),
            }),
        };
    };

    let predicate = match operator {
        Operator::In => Predicate::In {
            values: list_values(&key, value)?,
            column,
        },
        Operator::NotIn => Predicate::NotIn {
            values: list_values(&key, value)?,
            column,
        },
        Operator::Between => {
            let (low, high) = bounds(&key, value)?;
            Predicate::Between { column, low, high }
        }
        Operator::NotBetween => {
            let (low, high) = bounds(&key, value)?;
            Predicate::NotBetween { column, low, high }
        }
        scalar => Predicate::Compare {
            column,
            // every non set/range operator has a symbol
            operator: scalar.symbol().unwrap_or("=").to_string(),
            value,
        },
    };

    Ok(predicate)
}

fn list_values(key: &str, value: Value) -> Result<Vec<Value>, QueryError> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Null => Err(QueryError::invalid_filter(format!(
            "'{}' needs a list of values",
            key
        ))),
        scalar => Ok(vec![scalar]),
    }
}

fn bounds(key: &str, value: Value) -> Result<(Value, Value), QueryError> {
    match value {
        Value::Array(items) if items.len() == 2 => {
            let mut items = items.into_iter();
            match (items.next(), items.next()) {
                (Some(low), Some(high)) => Ok((low, high)),
                _ => Err(QueryError::invalid_filter(format!("'{}' needs two bounds", key))),
            }
        }
        other => Err(QueryError::invalid_filter(format!(
            "'{}' needs exactly two bounds, got {}",
            key, other
        ))),
    }
}
