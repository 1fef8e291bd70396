//! Filter and projection translation
//!
//! [`QueryFilterTranslator`] turns a [`FilterSpec`] and a [`ProjectionSpec`]
//! into calls on a [`QueryBuilder`]. Translation runs in two phases: a pure
//! [`QueryFilterTranslator::plan`] that parses every key and resolves every
//! relation, and [`QueryPlan::apply`] that issues the builder calls. A plan
//! that fails never touches the builder.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::QueryError;
use crate::filter::{CompiledFilter, FilterSpec};
use crate::operator::UnknownOperatorPolicy;
use crate::ports::{QueryBuilder, RelationResolver};
use crate::projection::{ProjectionSpec, ResolvedProjection};
use crate::relation::{ModelMeta, ModelRegistry};

/// Tunables for the translator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorOptions {
    pub unknown_operator: UnknownOperatorPolicy,
}

/// Everything needed to configure a builder, already validated
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub filter: CompiledFilter,
    pub projection: Option<ResolvedProjection>,
}

impl QueryPlan {
    pub fn apply<B: QueryBuilder + ?Sized>(&self, builder: &mut B) {
        self.filter.apply(builder);
        if let Some(projection) = &self.projection {
            projection.apply(builder);
        }
    }
}

/// Translates filter maps into builder configuration
#[derive(Debug, Clone)]
pub struct QueryFilterTranslator<R = ModelRegistry> {
    resolver: Arc<R>,
    options: TranslatorOptions,
}

impl<R: RelationResolver> QueryFilterTranslator<R> {
    pub fn new(resolver: Arc<R>) -> Self {
        Self::with_options(resolver, TranslatorOptions::default())
    }

    pub fn with_options(resolver: Arc<R>, options: TranslatorOptions) -> Self {
        Self { resolver, options }
    }

    pub fn options(&self) -> TranslatorOptions {
        self.options
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Parses `filters` and resolves `fields` against `model`
    ///
    /// # Errors
    ///
    /// `InvalidFilterExpression`, `UnknownOperator` or `RelationNotFound`.
    pub fn plan(
        &self,
        model: &ModelMeta,
        filters: &FilterSpec,
        fields: &ProjectionSpec,
    ) -> Result<QueryPlan, QueryError> {
        let filter = filters.compile(model.primary_key_name(), self.options.unknown_operator)?;
        let projection = ResolvedProjection::resolve(fields, model, self.resolver.as_ref())?;

        debug!(
            model = model.name(),
            predicates = filter.predicates.len(),
            relations = projection.as_ref().map_or(0, |p| p.relations.len()),
            "Planned query"
        );

        Ok(QueryPlan { filter, projection })
    }

    /// Configures `builder` in place
    ///
    /// On error the builder is left exactly as it was.
    pub fn apply<B: QueryBuilder>(
        &self,
        builder: &mut B,
        filters: &FilterSpec,
        fields: &ProjectionSpec,
    ) -> Result<(), QueryError> {
        let plan = self.plan(builder.model(), filters, fields)?;
        plan.apply(builder);
        Ok(())
    }

    /// Configures and returns `builder`, ready for execution
    pub fn build_query<B: QueryBuilder>(
        &self,
        mut builder: B,
        filters: &FilterSpec,
        fields: &ProjectionSpec,
    ) -> Result<B, QueryError> {
        self.apply(&mut builder, filters, fields)?;
        Ok(builder)
    }
}
