//! Error types raised while translating filters and projections

use thiserror::Error;

/// Error type for query translation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A projection named a relation the model does not declare
    #[error("Relation '{relation}' not found on model '{model}'")]
    RelationNotFound { model: String, relation: String },

    /// A model name was not present in the registry
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// A filter key or value could not be turned into a builder call
    #[error("Invalid filter expression: {0}")]
    InvalidFilterExpression(String),

    /// An operator outside the expression table, raised only under the reject policy
    #[error("Unknown operator '{operator}' on column '{column}'")]
    UnknownOperator { column: String, operator: String },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl QueryError {
    pub fn relation_not_found(model: impl Into<String>, relation: impl Into<String>) -> Self {
        QueryError::RelationNotFound {
            model: model.into(),
            relation: relation.into(),
        }
    }

    pub fn invalid_filter(message: impl Into<String>) -> Self {
        QueryError::InvalidFilterExpression(message.into())
    }

    /// Returns true if the error came from an unresolvable relation name
    pub fn is_relation_not_found(&self) -> bool {
        matches!(self, QueryError::RelationNotFound { .. })
    }

    /// Returns true if the error describes a malformed filter
    pub fn is_invalid_filter(&self) -> bool {
        matches!(
            self,
            QueryError::InvalidFilterExpression(_) | QueryError::UnknownOperator { .. }
        )
    }
}
