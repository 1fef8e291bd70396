//! Ports consumed by the translator
//!
//! The translator never talks to a database. It drives a [`QueryBuilder`]
//! supplied by an adapter and looks relations up through a
//! [`RelationResolver`].
//!
//! ```text
//!   FilterSpec + ProjectionSpec
//!              │
//!              ▼
//!   ┌──────────────────────────┐      ┌──────────────────────┐
//!   │  QueryFilterTranslator   │─────▶│   RelationResolver   │
//!   │   (plan, then apply)     │      │   (ModelRegistry)    │
//!   └──────────────────────────┘      └──────────────────────┘
//!              │
//!              ▼
//!   ┌──────────────────────────┐
//!   │      QueryBuilder        │  infra_db::PgQueryBuilder
//!   └──────────────────────────┘
//! ```

use std::sync::Arc;

use serde_json::Value;

use crate::error::QueryError;
use crate::order::Direction;
use crate::relation::{ModelMeta, RelationDescriptor};

/// A mutable query under construction
///
/// Calls accumulate; nothing is executed until an adapter-specific terminal
/// method runs the query. Predicates are combined with `AND` in call order.
pub trait QueryBuilder {
    /// Metadata of the model this builder queries
    fn model(&self) -> &ModelMeta;

    /// `column = value`
    fn where_eq(&mut self, column: &str, value: Value);

    /// `column <operator> value`
    ///
    /// `operator` is usually a symbol from the operator table but may be a raw
    /// token under the verbatim unknown-operator policy. Adapters decide
    /// whether they accept it.
    fn where_compare(&mut self, column: &str, operator: &str, value: Value);

    fn where_in(&mut self, column: &str, values: Vec<Value>);

    fn where_not_in(&mut self, column: &str, values: Vec<Value>);

    fn where_between(&mut self, column: &str, low: Value, high: Value);

    fn where_not_between(&mut self, column: &str, low: Value, high: Value);

    fn order_by(&mut self, column: &str, direction: Direction);

    fn limit(&mut self, limit: u64);

    fn offset(&mut self, offset: u64);

    fn group_by(&mut self, columns: &[String]);

    /// Replaces the column projection
    fn select(&mut self, columns: &[String]);

    /// Registers an eager load and returns the nested builder for the related
    /// model so the caller can configure its projection
    fn with_relation(
        &mut self,
        name: &str,
        relation: &RelationDescriptor,
        related: Arc<ModelMeta>,
    ) -> &mut Self;
}

/// Lookup of model metadata by name
pub trait RelationResolver {
    fn model(&self, name: &str) -> Option<Arc<ModelMeta>>;

    /// Resolves `relation` on `model` to its descriptor and related model
    ///
    /// # Errors
    ///
    /// `RelationNotFound` if the model does not declare the relation,
    /// `UnknownModel` if the related model is missing from the resolver.
    fn resolve_relation(
        &self,
        model: &ModelMeta,
        relation: &str,
    ) -> Result<(RelationDescriptor, Arc<ModelMeta>), QueryError> {
        let descriptor = model
            .get_relation(relation)
            .ok_or_else(|| QueryError::relation_not_found(model.name(), relation))?;
        let related = self
            .model(&descriptor.related)
            .ok_or_else(|| QueryError::UnknownModel(descriptor.related.clone()))?;
        Ok((descriptor.clone(), related))
    }
}
