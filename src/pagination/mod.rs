//! Paginated query assembly.
//!
//! Converts validated filter + page input into a bounded, explicitly
//! ordered fetch plus an independent count query, and assembles the
//! `{items, total, page, limit, total_pages}` descriptor. Ordering always
//! carries an `id` tie-break so pagination stays deterministic when the
//! sort column has duplicate values.

use serde::Serialize;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{FromRow, PgPool, Row};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::database::manager::DatabaseError;
use crate::error::ApiError;
use crate::validation::{params_to_value, Field, Schema};

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    #[error("Invalid column name: {0}")]
    InvalidColumn(String),
}

/// Validated page request. `limit` above the configured maximum is
/// silently capped rather than rejected; negative or zero values are
/// validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub page: i64,
    pub limit: i64,
    pub search: Option<String>,
}

impl PageQuery {
    /// Parse `page`, `limit`, and `search` from string query parameters.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ApiError> {
        let cfg = &config::config().pagination;
        let valid = Schema::new()
            .field(Field::integer("page").min(1).default(1))
            .field(Field::integer("limit").min(1).default(cfg.default_limit))
            .field(Field::text("search").min_len(1).max_len(200))
            .validate(&params_to_value(params))?;

        Ok(Self {
            page: valid.i64("page"),
            limit: clamp_limit(valid.i64("limit"), cfg.max_limit),
            search: valid.opt_str("search").map(str::to_string),
        })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

fn clamp_limit(limit: i64, max: i64) -> i64 {
    if limit > max {
        tracing::debug!("Capping requested limit {} to configured max {}", limit, max);
        max
    } else {
        limit
    }
}

/// Pagination descriptor returned by every listing operation
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T: Serialize> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl<T: Serialize> Paginated<T> {
    pub fn assemble(items: Vec<T>, total: i64, page: &PageQuery) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + page.limit - 1) / page.limit
        };
        Self {
            items,
            total,
            page: page.page,
            limit: page.limit,
            total_pages,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Typed bind parameter for assembled queries
#[derive(Debug, Clone)]
pub enum Param {
    Text(String),
    Int(i64),
    Bool(bool),
    Uuid(Uuid),
}

/// Builder for a bounded, ordered SELECT plus its count twin.
///
/// Conditions combine conjunctively. Each condition fragment uses the
/// `$?` placeholder, renumbered at assembly time; fragments are built by
/// this module (or by services from constant SQL), never from client
/// input. Identifiers are validated the same way for both queries.
pub struct PagedQuery {
    table: String,
    columns: Vec<String>,
    conditions: Vec<String>,
    params: Vec<Param>,
    order: Option<(String, SortDirection)>,
}

impl PagedQuery {
    pub fn new(table: impl Into<String>) -> Result<Self, QueryError> {
        let table = table.into();
        validate_identifier(&table).map_err(QueryError::InvalidTableName)?;
        Ok(Self {
            table,
            columns: vec![],
            conditions: vec![],
            params: vec![],
            order: None,
        })
    }

    pub fn select(mut self, columns: &[&str]) -> Result<Self, QueryError> {
        for column in columns {
            validate_identifier(column).map_err(QueryError::InvalidColumn)?;
        }
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        Ok(self)
    }

    /// Equality filter on a named column
    pub fn filter_eq(self, column: &str, value: Param) -> Result<Self, QueryError> {
        validate_identifier(column).map_err(QueryError::InvalidColumn)?;
        Ok(self.condition(format!("\"{}\" = $?", column), value))
    }

    /// Membership filter through a join table:
    /// `"<own_key>" IN (SELECT <select_col> FROM <join_table> WHERE <where_col> = $?)`
    pub fn filter_via(
        self,
        own_key: &str,
        join_table: &str,
        select_col: &str,
        where_col: &str,
        value: Param,
    ) -> Result<Self, QueryError> {
        validate_identifier(own_key).map_err(QueryError::InvalidColumn)?;
        validate_identifier(join_table).map_err(QueryError::InvalidTableName)?;
        validate_identifier(select_col).map_err(QueryError::InvalidColumn)?;
        validate_identifier(where_col).map_err(QueryError::InvalidColumn)?;
        Ok(self.condition(
            format!(
                "\"{}\" IN (SELECT \"{}\" FROM \"{}\" WHERE \"{}\" = $?)",
                own_key, select_col, join_table, where_col
            ),
            value,
        ))
    }

    /// Case-insensitive substring search over the designated text columns
    pub fn search(self, columns: &[&str], term: &str) -> Result<Self, QueryError> {
        for column in columns {
            validate_identifier(column).map_err(QueryError::InvalidColumn)?;
        }
        let fragment = columns
            .iter()
            .map(|c| format!("\"{}\" ILIKE $?", c))
            .collect::<Vec<_>>()
            .join(" OR ");
        let pattern = format!("%{}%", escape_like(term));
        Ok(self.condition(format!("({})", fragment), Param::Text(pattern)))
    }

    /// Filter rows where a nullable column is (or is not) NULL
    pub fn filter_null(mut self, column: &str, is_null: bool) -> Result<Self, QueryError> {
        validate_identifier(column).map_err(QueryError::InvalidColumn)?;
        let op = if is_null { "IS NULL" } else { "IS NOT NULL" };
        self.conditions.push(format!("\"{}\" {}", column, op));
        Ok(self)
    }

    pub fn order_by(mut self, column: &str, direction: SortDirection) -> Result<Self, QueryError> {
        validate_identifier(column).map_err(QueryError::InvalidColumn)?;
        self.order = Some((column.to_string(), direction));
        Ok(self)
    }

    fn condition(mut self, fragment: String, param: Param) -> Self {
        let index = self.params.len() + 1;
        self.conditions.push(fragment.replace("$?", &format!("${}", index)));
        self.params.push(param);
        self
    }

    fn select_clause(&self) -> String {
        if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns
                .iter()
                .map(|c| format!("\"{}\"", c))
                .collect::<Vec<_>>()
                .join(", ")
        }
    }

    fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    fn order_clause(&self) -> String {
        match &self.order {
            Some((column, direction)) if column != "id" => {
                format!("ORDER BY \"{}\" {}, \"id\" ASC", column, direction.to_sql())
            }
            Some((_, direction)) => format!("ORDER BY \"id\" {}", direction.to_sql()),
            // Never rely on implicit storage order
            None => "ORDER BY \"id\" ASC".to_string(),
        }
    }

    pub fn to_sql(&self, page: &PageQuery) -> String {
        [
            format!("SELECT {}", self.select_clause()),
            format!("FROM \"{}\"", self.table),
            self.where_clause(),
            self.order_clause(),
            format!("LIMIT {} OFFSET {}", page.limit, page.offset()),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }

    pub fn to_count_sql(&self) -> String {
        [
            format!("SELECT COUNT(*) AS count FROM \"{}\"", self.table),
            self.where_clause(),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }

    /// Run the count and item queries and assemble the page descriptor
    pub async fn fetch_paginated<T>(
        &self,
        pool: &PgPool,
        page: &PageQuery,
    ) -> Result<Paginated<T>, DatabaseError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin + Serialize,
    {
        let count_sql = self.to_count_sql();
        let mut count_query = sqlx::query(&count_sql);
        for param in &self.params {
            count_query = bind_param(count_query, param);
        }
        let total: i64 = count_query.fetch_one(pool).await?.try_get("count")?;

        let items_sql = self.to_sql(page);
        let mut items_query = sqlx::query_as::<_, T>(&items_sql);
        for param in &self.params {
            items_query = bind_param_as(items_query, param);
        }
        let items = items_query.fetch_all(pool).await?;

        Ok(Paginated::assemble(items, total, page))
    }
}

/// Escape LIKE wildcards in user-supplied search terms
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

fn validate_identifier(name: &str) -> Result<(), String> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(name.to_string())
    }
}

fn bind_param<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    param: &'q Param,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match param {
        Param::Text(s) => q.bind(s.as_str()),
        Param::Int(i) => q.bind(*i),
        Param::Bool(b) => q.bind(*b),
        Param::Uuid(u) => q.bind(*u),
    }
}

fn bind_param_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    param: &'q Param,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match param {
        Param::Text(s) => q.bind(s.as_str()),
        Param::Int(i) => q.bind(*i),
        Param::Bool(b) => q.bind(*b),
        Param::Uuid(u) => q.bind(*u),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(page: i64, limit: i64) -> PageQuery {
        PageQuery { page, limit, search: None }
    }

    #[test]
    fn offset_follows_page_and_limit() {
        assert_eq!(page(1, 20).offset(), 0);
        assert_eq!(page(3, 20).offset(), 40);
    }

    #[test]
    fn oversized_limit_is_capped_not_rejected() {
        assert_eq!(clamp_limit(5000, 100), 100);
        assert_eq!(clamp_limit(50, 100), 50);
    }

    #[test]
    fn from_params_rejects_negative_limit_naming_field() {
        let mut params = HashMap::new();
        params.insert("limit".to_string(), "-5".to_string());
        let err = PageQuery::from_params(&params).unwrap_err();
        assert_eq!(err.status_code(), 400);
        let body = err.to_json();
        assert!(body["field_errors"]["limit"].is_string());
    }

    #[test]
    fn from_params_applies_defaults_and_coerces_strings() {
        let mut params = HashMap::new();
        params.insert("page".to_string(), "2".to_string());
        let parsed = PageQuery::from_params(&params).unwrap();
        assert_eq!(parsed.page, 2);
        assert_eq!(parsed.limit, 20);
        assert_eq!(parsed.search, None);
    }

    #[test]
    fn total_pages_rounds_up() {
        let descriptor = Paginated::assemble(vec![1, 2, 3], 41, &page(1, 20));
        assert_eq!(descriptor.total_pages, 3);

        let empty: Paginated<i32> = Paginated::assemble(vec![], 0, &page(1, 20));
        assert_eq!(empty.total_pages, 0);
        assert!(empty.items.is_empty());
    }

    #[test]
    fn page_beyond_end_is_empty_not_an_error() {
        let descriptor: Paginated<i32> = Paginated::assemble(vec![], 41, &page(9, 20));
        assert_eq!(descriptor.total_pages, 3);
        assert!(descriptor.items.is_empty());
    }

    #[test]
    fn generated_sql_orders_with_id_tiebreak() {
        let q = PagedQuery::new("series")
            .unwrap()
            .order_by("title", SortDirection::Asc)
            .unwrap();
        let sql = q.to_sql(&page(2, 10));
        assert!(sql.contains("ORDER BY \"title\" ASC, \"id\" ASC"));
        assert!(sql.ends_with("LIMIT 10 OFFSET 10"));
    }

    #[test]
    fn missing_order_defaults_to_id_never_implicit() {
        let q = PagedQuery::new("genres").unwrap();
        assert!(q.to_sql(&page(1, 20)).contains("ORDER BY \"id\" ASC"));
    }

    #[test]
    fn filters_combine_conjunctively_with_numbered_params() {
        let q = PagedQuery::new("series")
            .unwrap()
            .filter_eq("kind", Param::Text("anime".to_string()))
            .unwrap()
            .search(&["title"], "ghost")
            .unwrap();
        let sql = q.to_sql(&page(1, 20));
        assert!(sql.contains("\"kind\" = $1 AND (\"title\" ILIKE $2)"));

        let count = q.to_count_sql();
        assert!(count.contains("\"kind\" = $1 AND (\"title\" ILIKE $2)"));
        assert!(count.starts_with("SELECT COUNT(*)"));
    }

    #[test]
    fn search_escapes_like_wildcards() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
    }

    #[test]
    fn join_table_filter_shapes_a_subquery() {
        let genre = Uuid::new_v4();
        let q = PagedQuery::new("series")
            .unwrap()
            .filter_via("id", "series_genres", "series_id", "genre_id", Param::Uuid(genre))
            .unwrap();
        let sql = q.to_count_sql();
        assert!(sql.contains("\"id\" IN (SELECT \"series_id\" FROM \"series_genres\" WHERE \"genre_id\" = $1)"));
    }

    #[test]
    fn identifiers_are_validated() {
        assert!(PagedQuery::new("users; DROP TABLE users").is_err());
        assert!(PagedQuery::new("users").unwrap().filter_null("1col", true).is_err());
    }
}
