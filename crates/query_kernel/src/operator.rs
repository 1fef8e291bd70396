//! Filter operator table
//!
//! Maps the textual operator tokens accepted in `column:operator` filter keys
//! onto a closed [`Operator`] enum. Set and range operators are dispatched to
//! dedicated builder methods; everything else becomes a plain comparison.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operators understood by the filter parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NotLike,
    In,
    NotIn,
    Between,
    NotBetween,
}

/// Token aliases, including the spaced spellings older callers send
const ALIASES: &[(&str, Operator)] = &[
    ("eq", Operator::Eq),
    ("neq", Operator::Neq),
    ("ne", Operator::Neq),
    ("gt", Operator::Gt),
    ("egt", Operator::Gte),
    ("gte", Operator::Gte),
    ("ge", Operator::Gte),
    ("lt", Operator::Lt),
    ("le", Operator::Lte),
    ("lte", Operator::Lte),
    ("elt", Operator::Lte),
    ("in", Operator::In),
    ("not_in", Operator::NotIn),
    ("not in", Operator::NotIn),
    ("between", Operator::Between),
    ("not_between", Operator::NotBetween),
    ("not between", Operator::NotBetween),
    ("like", Operator::Like),
    ("not_like", Operator::NotLike),
    ("not like", Operator::NotLike),
];

impl Operator {
    /// Looks up an operator token. Matching is exact after trimming.
    pub fn parse(token: &str) -> Option<Operator> {
        let token = token.trim();
        ALIASES
            .iter()
            .find(|(alias, _)| *alias == token)
            .map(|(_, op)| *op)
    }

    /// The SQL comparison symbol for scalar operators
    ///
    /// Returns `None` for set and range operators, which have no single symbol.
    pub fn symbol(&self) -> Option<&'static str> {
        match self {
            Operator::Eq => Some("="),
            Operator::Neq => Some("!="),
            Operator::Gt => Some(">"),
            Operator::Gte => Some(">="),
            Operator::Lt => Some("<"),
            Operator::Lte => Some("<="),
            Operator::Like => Some("LIKE"),
            Operator::NotLike => Some("NOT LIKE"),
            Operator::In | Operator::NotIn | Operator::Between | Operator::NotBetween => None,
        }
    }

    /// True for operators that take a list of values
    pub fn is_set(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }

    /// True for operators that take a pair of bounds
    pub fn is_range(&self) -> bool {
        matches!(self, Operator::Between | Operator::NotBetween)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Like => "like",
            Operator::NotLike => "not_like",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::Between => "between",
            Operator::NotBetween => "not_between",
        };
        f.write_str(name)
    }
}

/// What to do with a `column:operator` key whose operator is not in the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownOperatorPolicy {
    /// Hand the raw token to the builder as the comparison operator
    #[default]
    Verbatim,
    /// Treat the whole key as a column name compared with `=`
    Equality,
    /// Fail with `QueryError::UnknownOperator`
    Reject,
}
