//! Projection specifications and relation-aware resolution
//!
//! A projection lists the columns to select and the relations to eager load,
//! each relation carrying its own nested projection. Resolution turns the
//! caller's spec into a [`ResolvedProjection`] tree whose every relation has
//! been looked up, so applying it to a builder cannot fail half way.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::QueryError;
use crate::ports::{QueryBuilder, RelationResolver};
use crate::relation::{ModelMeta, RelationDescriptor};

/// Column name meaning "every column"
pub const WILDCARD: &str = "*";

/// One projection entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionEntry {
    Column(String),
    Relation { name: String, fields: ProjectionSpec },
}

/// Ordered projection
///
/// JSON form is a list mixing column names and `{relation: [...]}` objects:
///
/// ```rust
/// use query_kernel::projection::ProjectionSpec;
/// use serde_json::json;
///
/// let spec = ProjectionSpec::try_from(json!(["flag", { "tags": ["label"] }])).unwrap();
/// assert_eq!(spec, ProjectionSpec::new().column("flag").relation("tags", ProjectionSpec::columns(["label"])));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct ProjectionSpec {
    entries: Vec<ProjectionEntry>,
}

impl ProjectionSpec {
    /// An empty projection, selecting every column
    pub fn new() -> Self {
        Self::default()
    }

    /// A projection of plain columns
    pub fn columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: columns
                .into_iter()
                .map(|c| ProjectionEntry::Column(c.into()))
                .collect(),
        }
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.entries.push(ProjectionEntry::Column(column.into()));
        self
    }

    pub fn relation(mut self, name: impl Into<String>, fields: ProjectionSpec) -> Self {
        self.entries.push(ProjectionEntry::Relation {
            name: name.into(),
            fields,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ProjectionEntry] {
        &self.entries
    }

    /// Splits into plain columns and relation entries
    pub fn split(&self) -> (Vec<&str>, Vec<(&str, &ProjectionSpec)>) {
        let mut columns = Vec::new();
        let mut relations = Vec::new();
        for entry in &self.entries {
            match entry {
                ProjectionEntry::Column(c) => columns.push(c.as_str()),
                ProjectionEntry::Relation { name, fields } => relations.push((name.as_str(), fields)),
            }
        }
        (columns, relations)
    }

    fn parse_into(&mut self, value: Value) -> Result<(), QueryError> {
        match value {
            Value::Null => Ok(()),
            Value::String(column) => {
                self.entries.push(ProjectionEntry::Column(column));
                Ok(())
            }
            Value::Array(items) => {
                for item in items {
                    self.parse_into(item)?;
                }
                Ok(())
            }
            Value::Object(map) => {
                for (key, nested) in map {
                    match nested {
                        // positional entries serialized as {"0": "name"}
                        Value::String(column) if key.parse::<u64>().is_ok() => {
                            self.entries.push(ProjectionEntry::Column(column));
                        }
                        nested => {
                            let fields = ProjectionSpec::try_from(nested)?;
                            self.entries.push(ProjectionEntry::Relation { name: key, fields });
                        }
                    }
                }
                Ok(())
            }
            other => Err(QueryError::invalid_filter(format!(
                "projection entries must be column names or relation objects, got {}",
                other
            ))),
        }
    }
}

impl TryFrom<Value> for ProjectionSpec {
    type Error = QueryError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let mut spec = ProjectionSpec::new();
        spec.parse_into(value)?;
        Ok(spec)
    }
}

impl From<ProjectionSpec> for Value {
    fn from(spec: ProjectionSpec) -> Self {
        Value::Array(
            spec.entries
                .into_iter()
                .map(|entry| match entry {
                    ProjectionEntry::Column(c) => Value::String(c),
                    ProjectionEntry::Relation { name, fields } => {
                        let mut map = serde_json::Map::new();
                        map.insert(name, Value::from(fields));
                        Value::Object(map)
                    }
                })
                .collect(),
        )
    }
}

/// A relation whose metadata has been resolved
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRelation {
    pub name: String,
    pub descriptor: RelationDescriptor,
    pub related: Arc<ModelMeta>,
    /// `None` selects every column of the related model
    pub projection: Option<ResolvedProjection>,
}

/// A fully resolved projection tree
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProjection {
    /// Final column list, join keys included
    pub columns: Vec<String>,
    pub relations: Vec<ResolvedRelation>,
}

impl ResolvedProjection {
    /// Resolves `fields` against `model`
    ///
    /// Returns `Ok(None)` for an empty projection. For every relation the
    /// model's local join key is added to the column list; a non-empty nested
    /// projection gets the relation's foreign key appended before it is
    /// resolved against the related model.
    ///
    /// # Errors
    ///
    /// `RelationNotFound` when any relation, at any depth, is not declared.
    pub fn resolve<R: RelationResolver + ?Sized>(
        fields: &ProjectionSpec,
        model: &ModelMeta,
        resolver: &R,
    ) -> Result<Option<Self>, QueryError> {
        if fields.is_empty() {
            return Ok(None);
        }

        let (plain, relation_entries) = fields.split();
        let mut relations = Vec::with_capacity(relation_entries.len());
        let mut join_keys = Vec::with_capacity(relation_entries.len());

        for (name, nested) in relation_entries {
            let (descriptor, related) = resolver.resolve_relation(model, name)?;

            let projection = if nested.is_empty() {
                None
            } else {
                let nested = nested.clone().column(descriptor.foreign_key.clone());
                Self::resolve(&nested, &related, resolver)?
            };

            join_keys.push(descriptor.local_key.clone());
            relations.push(ResolvedRelation {
                name: name.to_string(),
                descriptor,
                related,
                projection,
            });
        }

        Ok(Some(Self {
            columns: merge_columns(&plain, &join_keys),
            relations,
        }))
    }

    /// Registers eager loads and the column projection on `builder`
    pub fn apply<B: QueryBuilder + ?Sized>(&self, builder: &mut B) {
        for relation in &self.relations {
            let nested =
                builder.with_relation(&relation.name, &relation.descriptor, relation.related.clone());
            if let Some(projection) = &relation.projection {
                projection.apply(nested);
            }
        }
        builder.select(&self.columns);
    }
}

fn merge_columns(plain: &[&str], join_keys: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(plain.len() + join_keys.len());
    for column in plain.iter().copied().chain(join_keys.iter().map(String::as_str)) {
        if !merged.iter().any(|c| c == column) {
            merged.push(column.to_string());
        }
    }

    if merged.iter().any(|c| c == WILDCARD) {
        // the wildcard already carries every join key
        merged.retain(|c| c == WILDCARD || plain.contains(&c.as_str()));
    }
    merged
}
