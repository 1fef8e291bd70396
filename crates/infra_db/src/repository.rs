//! Filter-driven repository
//!
//! A [`Repository`] binds one registered model to a connection pool and a
//! [`QueryFilterTranslator`]. Every read and bulk write goes through
//! `build_query`, so callers describe what they want with a filter map and a
//! projection instead of writing SQL.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{Repository, RecordStore};
//! use query_kernel::{FilterSpec, ProjectionSpec};
//! use serde_json::json;
//!
//! let users = Repository::new(pool, registry, "user")?;
//! let page = users
//!     .fetch_page(
//!         &json!({ "age:gte": 18, "order": "id desc" }).into(),
//!         &ProjectionSpec::columns(["name"]).relation("tags", ProjectionSpec::columns(["label"])),
//!         PageRequest::new(10, 2),
//!     )
//!     .await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use query_kernel::{
    FilterSpec, ModelMeta, ModelRegistry, Page, PageDefaults, PageRequest, PageWindow,
    Paginator, ProjectionSpec, QueryFilterTranslator, TranslatorOptions,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, instrument};

use crate::builder::PgQueryBuilder;
use crate::config::RepositoryConfig;
use crate::error::DatabaseError;
use crate::execute::Record;

/// Result of [`RecordStore::save`]
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// No id was given; the row was inserted
    Created(Record),
    /// An id was given; this many rows were updated
    Updated(u64),
}

/// CRUD operations driven by filter maps
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// First row matching `filters`, or `None`
    async fn fetch_one(
        &self,
        filters: &FilterSpec,
        fields: &ProjectionSpec,
    ) -> Result<Option<Record>, DatabaseError>;

    /// Every row matching `filters`, in query order
    async fn fetch_all(
        &self,
        filters: &FilterSpec,
        fields: &ProjectionSpec,
    ) -> Result<Vec<Record>, DatabaseError>;

    /// One page of rows plus the total match count
    ///
    /// A request without a page size uses the configured default.
    async fn fetch_page(
        &self,
        filters: &FilterSpec,
        fields: &ProjectionSpec,
        request: PageRequest,
    ) -> Result<Page<Record>, DatabaseError>;

    /// One page with navigation metadata
    async fn paginate(
        &self,
        filters: &FilterSpec,
        fields: &ProjectionSpec,
        request: PageRequest,
    ) -> Result<Paginator<Record>, DatabaseError>;

    /// Inserts `data` and returns the stored row
    async fn create(&self, data: &Record) -> Result<Record, DatabaseError>;

    /// Sets `data` on every row matching `filters`
    async fn update(&self, filters: &FilterSpec, data: &Record) -> Result<u64, DatabaseError>;

    /// Deletes every row matching `filters`
    async fn delete(&self, filters: &FilterSpec) -> Result<u64, DatabaseError>;

    /// Updates by primary key when `id` is truthy, inserts otherwise
    async fn save(&self, data: &Record, id: Option<Value>) -> Result<SaveOutcome, DatabaseError>;
}

/// Repository over one model of a [`ModelRegistry`]
#[derive(Debug, Clone)]
pub struct Repository {
    pool: PgPool,
    model: Arc<ModelMeta>,
    translator: QueryFilterTranslator<ModelRegistry>,
    pagination: PageDefaults,
}

impl Repository {
    /// Creates a repository for the registered model `model`
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Query` with `UnknownModel` if `model` is not
    /// registered.
    pub fn new(
        pool: PgPool,
        registry: Arc<ModelRegistry>,
        model: &str,
    ) -> Result<Self, DatabaseError> {
        Self::with_options(pool, registry, model, TranslatorOptions::default(), PageDefaults::default())
    }

    /// Creates a repository using the translator and pagination sections of `config`
    pub fn from_config(
        pool: PgPool,
        registry: Arc<ModelRegistry>,
        model: &str,
        config: &RepositoryConfig,
    ) -> Result<Self, DatabaseError> {
        Self::with_options(pool, registry, model, config.translator, config.pagination)
    }

    pub fn with_options(
        pool: PgPool,
        registry: Arc<ModelRegistry>,
        model: &str,
        options: TranslatorOptions,
        pagination: PageDefaults,
    ) -> Result<Self, DatabaseError> {
        let model = registry.require(model)?;
        Ok(Self {
            pool,
            model,
            translator: QueryFilterTranslator::with_options(registry, options),
            pagination,
        })
    }

    pub fn model(&self) -> &ModelMeta {
        &self.model
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// An unconfigured query on this repository's model
    pub fn query(&self) -> PgQueryBuilder {
        PgQueryBuilder::new(self.model.clone())
    }

    /// Translates `filters` and `fields` into a configured, unexecuted query
    pub fn build_query(
        &self,
        filters: &FilterSpec,
        fields: &ProjectionSpec,
    ) -> Result<PgQueryBuilder, DatabaseError> {
        Ok(self.translator.build_query(self.query(), filters, fields)?)
    }

    /// Resolves `request` against the configured page size and maximum
    pub fn page_window(&self, request: PageRequest) -> PageWindow {
        request.resolve(&self.pagination)
    }

    /// [`RecordStore::fetch_one`] deserialized into `T`
    pub async fn fetch_one_as<T: DeserializeOwned>(
        &self,
        filters: &FilterSpec,
        fields: &ProjectionSpec,
    ) -> Result<Option<T>, DatabaseError> {
        self.fetch_one(filters, fields)
            .await?
            .map(|record| serde_json::from_value(Value::Object(record)))
            .transpose()
            .map_err(DatabaseError::from)
    }

    /// [`RecordStore::fetch_all`] deserialized into `T`
    pub async fn fetch_all_as<T: DeserializeOwned>(
        &self,
        filters: &FilterSpec,
        fields: &ProjectionSpec,
    ) -> Result<Vec<T>, DatabaseError> {
        self.fetch_all(filters, fields)
            .await?
            .into_iter()
            .map(|record| serde_json::from_value(Value::Object(record)).map_err(DatabaseError::from))
            .collect()
    }
}

#[async_trait]
impl RecordStore for Repository {
    #[instrument(skip(self, filters, fields), fields(model = self.model.name()))]
    async fn fetch_one(
        &self,
        filters: &FilterSpec,
        fields: &ProjectionSpec,
    ) -> Result<Option<Record>, DatabaseError> {
        self.build_query(filters, fields)?.first(&self.pool).await
    }

    #[instrument(skip(self, filters, fields), fields(model = self.model.name()))]
    async fn fetch_all(
        &self,
        filters: &FilterSpec,
        fields: &ProjectionSpec,
    ) -> Result<Vec<Record>, DatabaseError> {
        self.build_query(filters, fields)?.get(&self.pool).await
    }

    #[instrument(
        skip(self, filters, fields),
        fields(model = self.model.name(), page = request.page, page_size = request.page_size)
    )]
    async fn fetch_page(
        &self,
        filters: &FilterSpec,
        fields: &ProjectionSpec,
        request: PageRequest,
    ) -> Result<Page<Record>, DatabaseError> {
        let window = self.page_window(request);
        self.build_query(filters, fields)?
            .paginate(&self.pool, window)
            .await
    }

    #[instrument(skip(self, filters, fields), fields(model = self.model.name()))]
    async fn paginate(
        &self,
        filters: &FilterSpec,
        fields: &ProjectionSpec,
        request: PageRequest,
    ) -> Result<Paginator<Record>, DatabaseError> {
        let window = self.page_window(request);
        let page = self.fetch_page(filters, fields, request).await?;
        Ok(Paginator::new(page, window))
    }

    #[instrument(skip(self, data), fields(model = self.model.name(), columns = data.len()))]
    async fn create(&self, data: &Record) -> Result<Record, DatabaseError> {
        let mut sql = PgQueryBuilder::insert_sql(&self.model, data);
        debug!(sql = sql.sql(), "Inserting row");

        let Json(row): Json<Value> = sql.build_query_scalar().fetch_one(&self.pool).await?;
        match row {
            Value::Object(record) => Ok(record),
            other => Err(DatabaseError::Serialization(format!(
                "insert returned a non-object row: {}",
                other
            ))),
        }
    }

    #[instrument(skip(self, filters, data), fields(model = self.model.name()))]
    async fn update(&self, filters: &FilterSpec, data: &Record) -> Result<u64, DatabaseError> {
        self.build_query(filters, &ProjectionSpec::new())?
            .update(&self.pool, data)
            .await
    }

    #[instrument(skip(self, filters), fields(model = self.model.name()))]
    async fn delete(&self, filters: &FilterSpec) -> Result<u64, DatabaseError> {
        self.build_query(filters, &ProjectionSpec::new())?
            .delete(&self.pool)
            .await
    }

    #[instrument(skip(self, data, id), fields(model = self.model.name()))]
    async fn save(&self, data: &Record, id: Option<Value>) -> Result<SaveOutcome, DatabaseError> {
        match save_target(id) {
            Some(filters) => {
                let affected = self.update(&filters, data).await?;
                Ok(SaveOutcome::Updated(affected))
            }
            None => Ok(SaveOutcome::Created(self.create(data).await?)),
        }
    }
}

/// Filter a `save` updates through, or `None` to insert
///
/// A scalar id is a primary key lookup; an object id is a filter map.
fn save_target(id: Option<Value>) -> Option<FilterSpec> {
    id.filter(is_truthy).map(FilterSpec::from)
}

/// Whether an id counts as "supplied": not null, zero, empty, `"0"` or `false`
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!("0")));
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&json!(false)));
        assert!(is_truthy(&json!(5)));
        assert!(is_truthy(&json!("abc")));
        assert!(is_truthy(&json!(-1)));
    }

    #[test]
    fn test_save_target() {
        assert_eq!(save_target(None), None);
        assert_eq!(save_target(Some(json!(0))), None);
        assert_eq!(save_target(Some(json!(5))), Some(FilterSpec::PrimaryKey(json!(5))));
        assert_eq!(save_target(Some(json!("5"))), Some(FilterSpec::PrimaryKey(json!("5"))));

        let Some(FilterSpec::Conditions(map)) = save_target(Some(json!({ "email": "a@example.com" })))
        else {
            panic!("an object id should become a filter map");
        };
        assert_eq!(map.get("email"), Some(&json!("a@example.com")));
    }
}
