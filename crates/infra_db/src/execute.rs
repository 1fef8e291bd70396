//! Terminal executors for [`PgQueryBuilder`]
//!
//! Fetches run the rendered select, then resolve every registered eager load
//! with one `IN` query per relation and stitch the children onto their
//! parents under the relation name.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;

use query_kernel::{Page, PageWindow, QueryBuilder};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::debug;

use crate::builder::{EagerLoad, PgQueryBuilder};
use crate::error::DatabaseError;

/// A row as a JSON object keyed by column name
pub type Record = Map<String, Value>;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

impl PgQueryBuilder {
    /// First matching row, or `None`
    pub async fn first(&self, pool: &PgPool) -> Result<Option<Record>, DatabaseError> {
        let mut query = self.clone();
        query.limit(1);
        Ok(query.get(pool).await?.into_iter().next())
    }

    /// All matching rows with eager loads attached, in builder order
    pub fn get<'a>(&'a self, pool: &'a PgPool) -> BoxFuture<'a, Result<Vec<Record>, DatabaseError>> {
        Box::pin(async move {
            let mut sql = self.select_sql()?;
            debug!(table = self.model_meta().table(), sql = sql.sql(), "Fetching rows");

            let rows: Vec<Json<Value>> = sql.build_query_scalar().fetch_all(pool).await?;
            let mut records = rows
                .into_iter()
                .map(|Json(value)| into_record(value))
                .collect::<Result<Vec<_>, _>>()?;

            for load in self.eager_loads() {
                load_relation(pool, load, &mut records).await?;
            }

            Ok(records)
        })
    }

    /// Number of matching rows, ignoring order, limit and offset
    pub async fn count(&self, pool: &PgPool) -> Result<u64, DatabaseError> {
        let mut sql = self.count_sql()?;
        debug!(table = self.model_meta().table(), sql = sql.sql(), "Counting rows");

        let count: i64 = sql.build_query_scalar().fetch_one(pool).await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Copy of this query narrowed to one page
    pub fn page_query(&self, window: PageWindow) -> PgQueryBuilder {
        let mut query = self.clone();
        query.offset(window.offset());
        query.limit(window.limit());
        query
    }

    /// Total match count plus one page of rows
    ///
    /// The count runs on this query, the rows on [`Self::page_query`], so the
    /// page window never affects the total.
    pub async fn paginate(
        &self,
        pool: &PgPool,
        window: PageWindow,
    ) -> Result<Page<Record>, DatabaseError> {
        let total = self.count(pool).await?;
        let rows = self.page_query(window).get(pool).await?;

        Ok(Page { total, rows })
    }

    /// Sets `data` on every matching row, returning the affected count
    pub async fn update(&self, pool: &PgPool, data: &Record) -> Result<u64, DatabaseError> {
        let Some(mut sql) = self.update_sql(data)? else {
            return Ok(0);
        };
        debug!(table = self.model_meta().table(), sql = sql.sql(), "Updating rows");

        let result = sql.build().execute(pool).await?;
        Ok(result.rows_affected())
    }

    /// Deletes every matching row, returning the affected count
    pub async fn delete(&self, pool: &PgPool) -> Result<u64, DatabaseError> {
        let mut sql = self.delete_sql()?;
        debug!(table = self.model_meta().table(), sql = sql.sql(), "Deleting rows");

        let result = sql.build().execute(pool).await?;
        Ok(result.rows_affected())
    }
}

fn into_record(value: Value) -> Result<Record, DatabaseError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(DatabaseError::Serialization(format!(
            "expected a JSON object per row, got {}",
            other
        ))),
    }
}

/// JSON values of different types never join, so the rendered text is a
/// sufficient grouping key.
fn join_key(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

async fn load_relation(
    pool: &PgPool,
    load: &EagerLoad,
    parents: &mut [Record],
) -> Result<(), DatabaseError> {
    let local_key = &load.relation.local_key;
    let foreign_key = &load.relation.foreign_key;

    let mut seen = HashSet::new();
    let keys: Vec<Value> = parents
        .iter()
        .filter_map(|row| row.get(local_key))
        .filter(|value| join_key(value).is_some_and(|k| seen.insert(k)))
        .cloned()
        .collect();

    let children = if keys.is_empty() {
        Vec::new()
    } else {
        let mut query = load.query.clone();
        query.where_in(foreign_key, keys);
        query.get(pool).await?
    };

    debug!(
        relation = load.name.as_str(),
        parents = parents.len(),
        children = children.len(),
        "Loaded relation"
    );

    attach_children(load, parents, children);
    Ok(())
}

/// Stitches `children` onto `parents` under the relation name
///
/// To-many relations attach an array, to-one relations the first match or
/// `null`.
pub(crate) fn attach_children(load: &EagerLoad, parents: &mut [Record], children: Vec<Record>) {
    let mut grouped: HashMap<String, Vec<Record>> = HashMap::new();
    for child in children {
        if let Some(key) = child.get(&load.relation.foreign_key).and_then(join_key) {
            grouped.entry(key).or_default().push(child);
        }
    }

    let to_one = load.relation.kind.is_to_one();
    for parent in parents.iter_mut() {
        let matches = parent
            .get(&load.relation.local_key)
            .and_then(join_key)
            .and_then(|key| grouped.get(&key))
            .cloned()
            .unwrap_or_default();

        let attached = if to_one {
            matches.into_iter().next().map(Value::Object).unwrap_or(Value::Null)
        } else {
            Value::Array(matches.into_iter().map(Value::Object).collect())
        };
        parent.insert(load.name.clone(), attached);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use query_kernel::{
        FilterSpec, ModelMeta, ModelRegistry, PageDefaults, PageRequest, ProjectionSpec,
        QueryFilterTranslator, RelationDescriptor, RelationKind,
    };
    use serde_json::json;

    fn record(value: Value) -> Record {
        into_record(value).unwrap()
    }

    fn load(kind: RelationKind, local_key: &str, foreign_key: &str) -> EagerLoad {
        EagerLoad {
            name: "rel".to_string(),
            relation: RelationDescriptor {
                kind,
                related: "child".to_string(),
                local_key: local_key.to_string(),
                foreign_key: foreign_key.to_string(),
            },
            query: PgQueryBuilder::new(Arc::new(ModelMeta::new("child", "children"))),
        }
    }

    #[test]
    fn test_has_many_attaches_arrays() {
        let mut parents = vec![record(json!({ "id": 1 })), record(json!({ "id": 2 }))];
        let children = vec![
            record(json!({ "owner_id": 1, "label": "a" })),
            record(json!({ "owner_id": 1, "label": "b" })),
        ];

        attach_children(&load(RelationKind::HasMany, "id", "owner_id"), &mut parents, children);

        assert_eq!(parents[0]["rel"].as_array().unwrap().len(), 2);
        assert_eq!(parents[1]["rel"], json!([]));
    }

    #[test]
    fn test_belongs_to_attaches_object_or_null() {
        let mut parents = vec![
            record(json!({ "id": 10, "author_id": 1 })),
            record(json!({ "id": 11, "author_id": null })),
        ];
        let children = vec![record(json!({ "id": 1, "name": "ann" }))];

        attach_children(&load(RelationKind::BelongsTo, "author_id", "id"), &mut parents, children);

        assert_eq!(parents[0]["rel"], json!({ "id": 1, "name": "ann" }));
        assert_eq!(parents[1]["rel"], Value::Null);
    }

    #[test]
    fn test_keys_of_different_types_do_not_join() {
        let mut parents = vec![record(json!({ "id": 1 }))];
        let children = vec![record(json!({ "owner_id": "1" }))];

        attach_children(&load(RelationKind::HasOne, "id", "owner_id"), &mut parents, children);

        assert_eq!(parents[0]["rel"], Value::Null);
    }

    #[test]
    fn test_page_query_windows_rows_but_not_count() {
        let registry = Arc::new(ModelRegistry::new([ModelMeta::new("user", "users")]).unwrap());
        let model = registry.get("user").unwrap();
        let query = QueryFilterTranslator::new(registry)
            .build_query(
                PgQueryBuilder::new(model),
                &FilterSpec::from(json!({ "age:gt": 30, "limit": 3, "offset": 1 })),
                &ProjectionSpec::new(),
            )
            .unwrap();

        let window = PageRequest::new(10, 2).resolve(&PageDefaults::default());
        assert_eq!((window.offset(), window.limit()), (10, 10));

        let page = query.page_query(window);
        assert_eq!((page.limit, page.offset), (Some(10), Some(10)));
        assert_eq!(
            page.select_sql().unwrap().sql(),
            "SELECT row_to_json(q) FROM (SELECT * FROM \"users\" WHERE \"age\" > $1 \
             LIMIT $2 OFFSET $3) AS q"
        );
        assert_eq!(
            page.count_sql().unwrap().sql(),
            "SELECT COUNT(*) FROM \"users\" WHERE \"age\" > $1"
        );
        assert_eq!(
            query.count_sql().unwrap().sql(),
            "SELECT COUNT(*) FROM \"users\" WHERE \"age\" > $1"
        );
    }

    #[test]
    fn test_non_object_row_rejected() {
        assert!(into_record(json!([1])).is_err());
    }
}
