//! Model metadata and relation registry
//!
//! Models are registered up front with their table, primary key and the
//! relations they expose. The registry checks at construction time that every
//! relation points at a registered model, so projection resolution only has
//! to look names up.
//!
//! # Join keys
//!
//! Every relation carries a pair of columns:
//!
//! - `local_key` lives on the model declaring the relation and must be
//!   selected on the parent rows.
//! - `foreign_key` lives on the related model and must be selected on the
//!   eagerly loaded rows.
//!
//! For `BelongsTo` the local key is the referencing column (`posts.author_id`)
//! and the foreign key is the owner key (`users.id`). For `HasOne`/`HasMany`
//! the local key is the parent's key (`users.id`) and the foreign key is the
//! back-reference on the children (`tags.owner_id`).
//!
//! # Example
//!
//! ```rust
//! use query_kernel::relation::{ModelMeta, ModelRegistry};
//!
//! let registry = ModelRegistry::new([
//!     ModelMeta::new("user", "users").has_many("tags", "tag", "id", "owner_id"),
//!     ModelMeta::new("tag", "tags").belongs_to("owner", "user", "owner_id", "id"),
//! ])
//! .unwrap();
//!
//! assert!(registry.get("tag").is_some());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::ports::RelationResolver;

/// Cardinality and ownership of a relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// To-one, the current model holds the reference
    BelongsTo,
    /// To-one, the related model holds the reference
    HasOne,
    /// To-many, the related models hold the reference
    HasMany,
}

impl RelationKind {
    /// True when the relation loads at most one related row per parent
    pub fn is_to_one(&self) -> bool {
        !matches!(self, RelationKind::HasMany)
    }
}

/// Typed description of one relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDescriptor {
    pub kind: RelationKind,
    /// Registry name of the related model
    pub related: String,
    /// Join column on the declaring model
    pub local_key: String,
    /// Join column on the related model
    pub foreign_key: String,
}

/// Metadata for one model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelMeta {
    name: String,
    table: String,
    primary_key: String,
    relations: HashMap<String, RelationDescriptor>,
}

impl ModelMeta {
    /// Creates model metadata with an `id` primary key and no relations
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            primary_key: "id".to_string(),
            relations: HashMap::new(),
        }
    }

    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    /// Declares a relation with an explicit descriptor
    pub fn relation(mut self, name: impl Into<String>, descriptor: RelationDescriptor) -> Self {
        self.relations.insert(name.into(), descriptor);
        self
    }

    /// Declares a to-one relation where this model holds `local_key`
    /// referencing `owner_key` on `related`
    pub fn belongs_to(
        self,
        name: impl Into<String>,
        related: impl Into<String>,
        local_key: impl Into<String>,
        owner_key: impl Into<String>,
    ) -> Self {
        self.relation(
            name,
            RelationDescriptor {
                kind: RelationKind::BelongsTo,
                related: related.into(),
                local_key: local_key.into(),
                foreign_key: owner_key.into(),
            },
        )
    }

    /// Declares a to-one relation where `related.foreign_key` references `local_key`
    pub fn has_one(
        self,
        name: impl Into<String>,
        related: impl Into<String>,
        local_key: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.relation(
            name,
            RelationDescriptor {
                kind: RelationKind::HasOne,
                related: related.into(),
                local_key: local_key.into(),
                foreign_key: foreign_key.into(),
            },
        )
    }

    /// Declares a to-many relation where `related.foreign_key` references `local_key`
    pub fn has_many(
        self,
        name: impl Into<String>,
        related: impl Into<String>,
        local_key: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.relation(
            name,
            RelationDescriptor {
                kind: RelationKind::HasMany,
                related: related.into(),
                local_key: local_key.into(),
                foreign_key: foreign_key.into(),
            },
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn primary_key_name(&self) -> &str {
        &self.primary_key
    }

    pub fn get_relation(&self, name: &str) -> Option<&RelationDescriptor> {
        self.relations.get(name)
    }

    pub fn relations(&self) -> impl Iterator<Item = (&str, &RelationDescriptor)> {
        self.relations.iter().map(|(name, rel)| (name.as_str(), rel))
    }
}

/// Registry of all known models, keyed by model name
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<String, Arc<ModelMeta>>,
}

impl ModelRegistry {
    /// Builds a registry and validates relation targets
    ///
    /// # Errors
    ///
    /// Returns `QueryError::UnknownModel` if a relation names a model that is
    /// not part of `models`, and `QueryError::Configuration` on duplicate names.
    pub fn new(models: impl IntoIterator<Item = ModelMeta>) -> Result<Self, QueryError> {
        let mut map = HashMap::new();
        for model in models {
            let name = model.name.clone();
            if map.insert(name.clone(), Arc::new(model)).is_some() {
                return Err(QueryError::Configuration(format!(
                    "model '{}' registered twice",
                    name
                )));
            }
        }

        for model in map.values() {
            for (relation, descriptor) in model.relations() {
                if !map.contains_key(&descriptor.related) {
                    return Err(QueryError::UnknownModel(format!(
                        "{} (target of {}.{})",
                        descriptor.related, model.name, relation
                    )));
                }
            }
        }

        Ok(Self { models: map })
    }

    pub fn get(&self, name: &str) -> Option<Arc<ModelMeta>> {
        self.models.get(name).cloned()
    }

    /// Looks a model up, failing with `UnknownModel`
    pub fn require(&self, name: &str) -> Result<Arc<ModelMeta>, QueryError> {
        self.get(name)
            .ok_or_else(|| QueryError::UnknownModel(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl RelationResolver for ModelRegistry {
    fn model(&self, name: &str) -> Option<Arc<ModelMeta>> {
        self.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_dangling_relation() {
        let err = ModelRegistry::new([ModelMeta::new("user", "users").has_many(
            "tags", "tag", "id", "owner_id",
        )])
        .unwrap_err();

        assert!(matches!(err, QueryError::UnknownModel(msg) if msg.contains("user.tags")));
    }

    #[test]
    fn test_rejects_duplicate_model() {
        let err = ModelRegistry::new([
            ModelMeta::new("user", "users"),
            ModelMeta::new("user", "people"),
        ])
        .unwrap_err();

        assert!(matches!(err, QueryError::Configuration(_)));
    }

    #[test]
    fn test_belongs_to_keys() {
        let post = ModelMeta::new("post", "posts").belongs_to("author", "user", "author_id", "id");
        let rel = post.get_relation("author").unwrap();

        assert_eq!(rel.kind, RelationKind::BelongsTo);
        assert_eq!(rel.local_key, "author_id");
        assert_eq!(rel.foreign_key, "id");
        assert!(rel.kind.is_to_one());
    }
}
