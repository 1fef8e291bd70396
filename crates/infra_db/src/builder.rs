//! PostgreSQL implementation of the query builder port
//!
//! [`PgQueryBuilder`] accumulates predicates, shape directives, a projection
//! and eager loads, and renders them into SQLx query builders. Rows are read
//! back through `row_to_json`, so the builder never needs a Rust type per
//! table.

use std::sync::Arc;

use query_kernel::{
    Direction, ModelMeta, OrderClause, Predicate, QueryBuilder, RelationDescriptor,
};
use serde_json::{Map, Value};

use crate::error::DatabaseError;
use crate::sql::{column_list, push_column_value, push_column_values, quote_ident, render_operator, PgSql};

/// A relation registered for eager loading, with its own nested query
#[derive(Debug, Clone)]
pub struct EagerLoad {
    pub name: String,
    pub relation: RelationDescriptor,
    pub query: PgQueryBuilder,
}

/// Query under construction for one model
#[derive(Debug, Clone)]
pub struct PgQueryBuilder {
    model: Arc<ModelMeta>,
    columns: Vec<String>,
    predicates: Vec<Predicate>,
    orders: Vec<OrderClause>,
    groups: Vec<String>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
    eager: Vec<EagerLoad>,
}

impl PgQueryBuilder {
    pub fn new(model: Arc<ModelMeta>) -> Self {
        Self {
            model,
            columns: Vec::new(),
            predicates: Vec::new(),
            orders: Vec::new(),
            groups: Vec::new(),
            limit: None,
            offset: None,
            eager: Vec::new(),
        }
    }

    pub fn model_meta(&self) -> &Arc<ModelMeta> {
        &self.model
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn eager_loads(&self) -> &[EagerLoad] {
        &self.eager
    }

    /// True if ordering or windowing narrows which rows are affected
    pub fn has_window(&self) -> bool {
        !self.orders.is_empty() || self.limit.is_some() || self.offset.is_some()
    }

    fn table(&self) -> String {
        quote_ident(self.model.table())
    }

    /// `SELECT <columns> FROM <table> WHERE ... GROUP BY ... ORDER BY ... LIMIT ... OFFSET ...`
    pub fn push_select(&self, sql: &mut PgSql) -> Result<(), DatabaseError> {
        sql.push("SELECT ");
        sql.push(column_list(&self.columns));
        sql.push(" FROM ");
        sql.push(self.table());
        self.push_where(sql)?;
        self.push_group(sql);
        self.push_window(sql);
        Ok(())
    }

    /// Query returning one JSON object per row, in builder order
    pub fn select_sql(&self) -> Result<PgSql, DatabaseError> {
        let mut sql = PgSql::new("SELECT row_to_json(q) FROM (");
        self.push_select(&mut sql)?;
        sql.push(") AS q");
        Ok(sql)
    }

    /// Query counting matching rows, ignoring order, limit and offset
    pub fn count_sql(&self) -> Result<PgSql, DatabaseError> {
        let mut sql = PgSql::new("");
        if self.groups.is_empty() {
            sql.push("SELECT COUNT(*) FROM ");
            sql.push(self.table());
            self.push_where(&mut sql)?;
        } else {
            sql.push("SELECT COUNT(*) FROM (SELECT 1 FROM ");
            sql.push(self.table());
            self.push_where(&mut sql)?;
            self.push_group(&mut sql);
            sql.push(") AS q");
        }
        Ok(sql)
    }

    /// Bulk update of every matching row
    ///
    /// Returns `None` when `data` is empty, since there is nothing to set.
    pub fn update_sql(&self, data: &Map<String, Value>) -> Result<Option<PgSql>, DatabaseError> {
        if data.is_empty() {
            return Ok(None);
        }

        let mut sql = PgSql::new("UPDATE ");
        sql.push(self.table());
        sql.push(" SET ");
        for (i, (column, value)) in data.iter().enumerate() {
            if i > 0 {
                sql.push(", ");
            }
            sql.push(quote_ident(column));
            sql.push(" = ");
            push_column_value(&mut sql, self.model.table(), column, value);
        }
        self.push_target(&mut sql)?;
        Ok(Some(sql))
    }

    /// Bulk delete of every matching row
    pub fn delete_sql(&self) -> Result<PgSql, DatabaseError> {
        let mut sql = PgSql::new("DELETE FROM ");
        sql.push(self.table());
        self.push_target(&mut sql)?;
        Ok(sql)
    }

    /// Insert returning the stored row as JSON
    pub fn insert_sql(model: &ModelMeta, data: &Map<String, Value>) -> PgSql {
        let mut sql = PgSql::new("INSERT INTO ");
        sql.push(quote_ident(model.table()));
        sql.push(" AS \"inserted\"");

        if data.is_empty() {
            sql.push(" DEFAULT VALUES");
        } else {
            let columns: Vec<String> = data.keys().cloned().collect();
            sql.push(" (");
            sql.push(column_list(&columns));
            sql.push(") VALUES (");
            for (i, (column, value)) in data.iter().enumerate() {
                if i > 0 {
                    sql.push(", ");
                }
                push_column_value(&mut sql, model.table(), column, value);
            }
            sql.push(")");
        }

        sql.push(" RETURNING row_to_json(\"inserted\".*)");
        sql
    }

    /// WHERE clause for a mutation
    ///
    /// PostgreSQL has no `UPDATE ... LIMIT`, so a windowed query narrows the
    /// target through a primary key subquery. Grouping is ignored: a mutation
    /// always targets individual rows.
    fn push_target(&self, sql: &mut PgSql) -> Result<(), DatabaseError> {
        if !self.has_window() {
            return self.push_where(sql);
        }

        let key = quote_ident(self.model.primary_key_name());
        sql.push(" WHERE ");
        sql.push(key.as_str());
        sql.push(" IN (SELECT ");
        sql.push(key.as_str());
        sql.push(" FROM ");
        sql.push(self.table());
        self.push_where(sql)?;
        self.push_window(sql);
        sql.push(")");
        Ok(())
    }

    fn push_where(&self, sql: &mut PgSql) -> Result<(), DatabaseError> {
        let table = self.model.table();
        for (i, predicate) in self.predicates.iter().enumerate() {
            sql.push(if i == 0 { " WHERE " } else { " AND " });
            push_predicate(sql, table, predicate)?;
        }
        Ok(())
    }

    fn push_group(&self, sql: &mut PgSql) {
        if !self.groups.is_empty() {
            sql.push(" GROUP BY ");
            sql.push(column_list(&self.groups));
        }
    }

    fn push_window(&self, sql: &mut PgSql) {
        for (i, clause) in self.orders.iter().enumerate() {
            sql.push(if i == 0 { " ORDER BY " } else { ", " });
            sql.push(quote_ident(&clause.column));
            sql.push(" ");
            sql.push(clause.direction.as_sql());
        }
        if let Some(limit) = self.limit {
            sql.push(" LIMIT ");
            sql.push_bind(limit_to_i64(limit));
        }
        if let Some(offset) = self.offset {
            sql.push(" OFFSET ");
            sql.push_bind(limit_to_i64(offset));
        }
    }
}

fn limit_to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn push_predicate(sql: &mut PgSql, table: &str, predicate: &Predicate) -> Result<(), DatabaseError> {
    match predicate {
        Predicate::Eq { column, value } => push_comparison(sql, table, column, "=", value),
        Predicate::Compare {
            column,
            operator,
            value,
        } => push_comparison(sql, table, column, operator, value),
        Predicate::In { column, values } => {
            push_membership(sql, table, column, values, false);
            Ok(())
        }
        Predicate::NotIn { column, values } => {
            push_membership(sql, table, column, values, true);
            Ok(())
        }
        Predicate::Between { column, low, high } => {
            push_range(sql, table, column, low, high, false);
            Ok(())
        }
        Predicate::NotBetween { column, low, high } => {
            push_range(sql, table, column, low, high, true);
            Ok(())
        }
    }
}

fn push_comparison(
    sql: &mut PgSql,
    table: &str,
    column: &str,
    operator: &str,
    value: &Value,
) -> Result<(), DatabaseError> {
    let operator = render_operator(operator)?;
    sql.push(quote_ident(column));

    if value.is_null() {
        match operator.as_str() {
            "=" => {
                sql.push(" IS NULL");
                return Ok(());
            }
            "!=" | "<>" => {
                sql.push(" IS NOT NULL");
                return Ok(());
            }
            _ => {}
        }
    }

    sql.push(" ");
    sql.push(operator);
    sql.push(" ");
    push_column_value(sql, table, column, value);
    Ok(())
}

fn push_membership(sql: &mut PgSql, table: &str, column: &str, values: &[Value], negated: bool) {
    if values.is_empty() {
        sql.push(if negated { "TRUE" } else { "FALSE" });
        return;
    }
    sql.push(quote_ident(column));
    sql.push(if negated { " NOT IN (" } else { " IN (" });
    push_column_values(sql, table, column, values);
    sql.push(")");
}

fn push_range(sql: &mut PgSql, table: &str, column: &str, low: &Value, high: &Value, negated: bool) {
    sql.push(quote_ident(column));
    sql.push(if negated { " NOT BETWEEN " } else { " BETWEEN " });
    push_column_value(sql, table, column, low);
    sql.push(" AND ");
    push_column_value(sql, table, column, high);
}

impl QueryBuilder for PgQueryBuilder {
    fn model(&self) -> &ModelMeta {
        &self.model
    }

    fn where_eq(&mut self, column: &str, value: Value) {
        self.predicates.push(Predicate::Eq {
            column: column.to_string(),
            value,
        });
    }

    fn where_compare(&mut self, column: &str, operator: &str, value: Value) {
        self.predicates.push(Predicate::Compare {
            column: column.to_string(),
            operator: operator.to_string(),
            value,
        });
    }

    fn where_in(&mut self, column: &str, values: Vec<Value>) {
        self.predicates.push(Predicate::In {
            column: column.to_string(),
            values,
        });
    }

    fn where_not_in(&mut self, column: &str, values: Vec<Value>) {
        self.predicates.push(Predicate::NotIn {
            column: column.to_string(),
            values,
        });
    }

    fn where_between(&mut self, column: &str, low: Value, high: Value) {
        self.predicates.push(Predicate::Between {
            column: column.to_string(),
            low,
            high,
        });
    }

    fn where_not_between(&mut self, column: &str, low: Value, high: Value) {
        self.predicates.push(Predicate::NotBetween {
            column: column.to_string(),
            low,
            high,
        });
    }

    fn order_by(&mut self, column: &str, direction: Direction) {
        self.orders.push(OrderClause::new(column, direction));
    }

    fn limit(&mut self, limit: u64) {
        self.limit = Some(limit);
    }

    fn offset(&mut self, offset: u64) {
        self.offset = Some(offset);
    }

    fn group_by(&mut self, columns: &[String]) {
        self.groups.extend(columns.iter().cloned());
    }

    fn select(&mut self, columns: &[String]) {
        self.columns = columns.to_vec();
    }

    /// A relation registered twice keeps only the latest configuration
    fn with_relation(
        &mut self,
        name: &str,
        relation: &RelationDescriptor,
        related: Arc<ModelMeta>,
    ) -> &mut Self {
        self.eager.retain(|load| load.name != name);
        self.eager.push(EagerLoad {
            name: name.to_string(),
            relation: relation.clone(),
            query: PgQueryBuilder::new(related),
        });
        let last = self.eager.len() - 1;
        &mut self.eager[last].query
    }
}
