//! Pre-built Test Fixtures
//!
//! The fixture registry mirrors `migrations/0001_fixture_schema.sql`:
//!
//! ```text
//! users ─┬─< tags          (tags.owner_id)
//!        ├── profiles      (profiles.user_id)
//!        └─< posts ─< comments
//! ```

use std::sync::Arc;

use infra_db::Record;
use once_cell::sync::Lazy;
use query_kernel::{ModelMeta, ModelRegistry};
use serde_json::{json, Value};

static REGISTRY: Lazy<Arc<ModelRegistry>> = Lazy::new(|| {
    Arc::new(
        ModelRegistry::new([
            ModelMeta::new("user", "users")
                .has_many("tags", "tag", "id", "owner_id")
                .has_one("profile", "profile", "id", "user_id")
                .has_many("posts", "post", "id", "author_id"),
            ModelMeta::new("profile", "profiles")
                .primary_key("user_id")
                .belongs_to("user", "user", "user_id", "id"),
            ModelMeta::new("tag", "tags").belongs_to("owner", "user", "owner_id", "id"),
            ModelMeta::new("post", "posts")
                .belongs_to("author", "user", "author_id", "id")
                .has_many("comments", "comment", "id", "post_id"),
            ModelMeta::new("comment", "comments").belongs_to("post", "post", "post_id", "id"),
        ])
        .expect("fixture registry is consistent"),
    )
});

/// Registry matching the fixture schema
pub fn fixture_registry() -> Arc<ModelRegistry> {
    REGISTRY.clone()
}

/// Builds a record from a JSON object literal
///
/// # Panics
///
/// Panics if `value` is not an object
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("record fixture must be an object, got {}", other),
    }
}

/// Fixture rows for users
pub struct UserFixtures;

impl UserFixtures {
    pub fn alice() -> Record {
        record(json!({ "name": "alice", "email": "alice@example.com", "age": 34, "status": "active" }))
    }

    pub fn bob() -> Record {
        record(json!({ "name": "bob", "email": "bob@example.com", "age": 19, "status": "active" }))
    }

    pub fn carol() -> Record {
        record(json!({ "name": "carol", "email": "carol@example.com", "age": 52, "status": "suspended" }))
    }

    /// Twelve numbered users for pagination tests
    pub fn numbered(count: usize) -> Vec<Record> {
        (1..=count)
            .map(|i| {
                record(json!({
                    "name": format!("user{:02}", i),
                    "email": format!("user{:02}@example.com", i),
                    "age": 20 + i as i64,
                }))
            })
            .collect()
    }
}
