//! Shared helpers for query_kernel integration tests

#![allow(dead_code)]

use std::sync::Arc;

use query_kernel::{
    Direction, ModelMeta, ModelRegistry, QueryBuilder, QueryFilterTranslator, RelationDescriptor,
};
use serde_json::Value;

/// A builder call, recorded in issue order
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    WhereEq(String, Value),
    WhereCompare(String, String, Value),
    WhereIn(String, Vec<Value>),
    WhereNotIn(String, Vec<Value>),
    WhereBetween(String, Value, Value),
    WhereNotBetween(String, Value, Value),
    OrderBy(String, Direction),
    Limit(u64),
    Offset(u64),
    GroupBy(Vec<String>),
    Select(Vec<String>),
    With(String),
}

/// Builder that records every call instead of rendering SQL
#[derive(Debug, Clone)]
pub struct RecordingBuilder {
    pub model: Arc<ModelMeta>,
    pub calls: Vec<Call>,
    pub relations: Vec<(String, RecordingBuilder)>,
}

impl RecordingBuilder {
    pub fn new(model: Arc<ModelMeta>) -> Self {
        Self {
            model,
            calls: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn relation(&self, name: &str) -> Option<&RecordingBuilder> {
        self.relations
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, b)| b)
    }

    pub fn selected(&self) -> Option<&[String]> {
        self.calls.iter().rev().find_map(|c| match c {
            Call::Select(cols) => Some(cols.as_slice()),
            _ => None,
        })
    }

    pub fn predicates(&self) -> Vec<&Call> {
        self.calls
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    Call::WhereEq(..)
                        | Call::WhereCompare(..)
                        | Call::WhereIn(..)
                        | Call::WhereNotIn(..)
                        | Call::WhereBetween(..)
                        | Call::WhereNotBetween(..)
                )
            })
            .collect()
    }
}

impl QueryBuilder for RecordingBuilder {
    fn model(&self) -> &ModelMeta {
        &self.model
    }

    fn where_eq(&mut self, column: &str, value: Value) {
        self.calls.push(Call::WhereEq(column.to_string(), value));
    }

    fn where_compare(&mut self, column: &str, operator: &str, value: Value) {
        self.calls
            .push(Call::WhereCompare(column.to_string(), operator.to_string(), value));
    }

    fn where_in(&mut self, column: &str, values: Vec<Value>) {
        self.calls.push(Call::WhereIn(column.to_string(), values));
    }

    fn where_not_in(&mut self, column: &str, values: Vec<Value>) {
        self.calls.push(Call::WhereNotIn(column.to_string(), values));
    }

    fn where_between(&mut self, column: &str, low: Value, high: Value) {
        self.calls.push(Call::WhereBetween(column.to_string(), low, high));
    }

    fn where_not_between(&mut self, column: &str, low: Value, high: Value) {
        self.calls.push(Call::WhereNotBetween(column.to_string(), low, high));
    }

    fn order_by(&mut self, column: &str, direction: Direction) {
        self.calls.push(Call::OrderBy(column.to_string(), direction));
    }

    fn limit(&mut self, limit: u64) {
        self.calls.push(Call::Limit(limit));
    }

    fn offset(&mut self, offset: u64) {
        self.calls.push(Call::Offset(offset));
    }

    fn group_by(&mut self, columns: &[String]) {
        self.calls.push(Call::GroupBy(columns.to_vec()));
    }

    fn select(&mut self, columns: &[String]) {
        self.calls.push(Call::Select(columns.to_vec()));
    }

    fn with_relation(
        &mut self,
        name: &str,
        _relation: &RelationDescriptor,
        related: Arc<ModelMeta>,
    ) -> &mut Self {
        self.calls.push(Call::With(name.to_string()));
        self.relations
            .push((name.to_string(), RecordingBuilder::new(related)));
        let last = self.relations.len() - 1;
        &mut self.relations[last].1
    }
}

/// users ─< tags, users ─ profile, users ─< posts ─< comments
pub fn registry() -> Arc<ModelRegistry> {
    Arc::new(
        ModelRegistry::new([
            ModelMeta::new("user", "users")
                .has_many("tags", "tag", "id", "owner_id")
                .has_one("profile", "profile", "id", "user_id")
                .has_many("posts", "post", "id", "author_id"),
            ModelMeta::new("tag", "tags").belongs_to("owner", "user", "owner_id", "id"),
            ModelMeta::new("profile", "profiles").primary_key("user_id"),
            ModelMeta::new("post", "posts")
                .belongs_to("author", "user", "author_id", "id")
                .has_many("comments", "comment", "id", "post_id"),
            ModelMeta::new("comment", "comments"),
        ])
        .expect("fixture registry is valid"),
    )
}

pub fn translator() -> QueryFilterTranslator {
    QueryFilterTranslator::new(registry())
}

pub fn builder_for(model: &str) -> RecordingBuilder {
    RecordingBuilder::new(registry().get(model).expect("model registered"))
}
