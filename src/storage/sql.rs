// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! SQL record store.
//!
//! Runs the list engine's page and aggregate queries against MySQL or
//! SQLite through sqlx's `Any` driver. Filters are rendered for the
//! connection's dialect as a parameterized WHERE clause; every
//! user-supplied value is bound.
//!
//! ```sql
//! -- page
//! SELECT id, tail, date FROM flights WHERE (tail LIKE ? ESCAPE '\' ...)
//!   ORDER BY date DESC, id ASC LIMIT ? OFFSET ?
//! -- section count / titles / rows per section
//! SELECT COUNT(DISTINCT COALESCE(CAST(strftime('%Y', date) AS CHAR), '')) AS cnt ...
//! SELECT COALESCE(CAST(strftime('%Y', date) AS CHAR), '') AS section_title ...
//!   GROUP BY section_title ORDER BY MAX(date) DESC
//! SELECT COUNT(*) AS cnt FROM flights WHERE ... AND COALESCE(...) = ?
//! ```
//!
//! ## Section Values
//!
//! The section expression is always compared, counted and grouped as
//! text, with NULL folded to `""`. A numeric expression (`id / 10`,
//! `YEAR(date)`) then matches its bound title, and rows whose expression
//! is NULL form one section titled `""` that every aggregate agrees on.
//!
//! ## Page Order
//!
//! The configured order, or the section value when there is none, followed
//! by the primary key so equal sort keys never straddle a page boundary in
//! different orders.
//!
//! ## sqlx Any Driver Quirks
//!
//! MySQL TEXT columns come back as bytes through the `Any` driver, so text
//! reads try `String` first and fall back to UTF-8 decoding `Vec<u8>`.
//! [`text_column`] does this for record decoders too.

use async_trait::async_trait;
use sqlx::any::{AnyArguments, AnyPoolOptions, AnyRow};
use sqlx::query::Query;
use sqlx::{Any, AnyPool, Row};
use std::marker::PhantomData;
use std::sync::Once;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::traits::{RecordStore, SectionKey, StoreError, StoreQuery};
use crate::config::{Direction, ListConfig};
use crate::metrics::{self, LatencyTimer};
use crate::resilience::retry::{retry, RetryConfig};
use crate::schema::Record;
use crate::search::{SqlDialect, SqlParam, SqlTranslator};

// SQLx `Any` driver requires runtime installation
static INSTALL_DRIVERS: Once = Once::new();

fn install_drivers() {
    INSTALL_DRIVERS.call_once(|| {
        sqlx::any::install_default_drivers();
    });
}

/// A record that can be decoded from a SQL row.
pub trait SqlRecord: Record {
    fn from_row(row: &AnyRow) -> Result<Self, StoreError>;
}

/// Read a text column, accepting the byte form MySQL returns via `Any`.
pub fn text_column(row: &AnyRow, column: &str) -> Result<Option<String>, StoreError> {
    if let Ok(value) = row.try_get::<Option<String>, _>(column) {
        return Ok(value);
    }
    match row.try_get::<Option<Vec<u8>>, _>(column) {
        Ok(Some(bytes)) => String::from_utf8(bytes).map(Some).map_err(|e| StoreError::Decode {
            column: column.to_string(),
            reason: e.to_string(),
        }),
        Ok(None) => Ok(None),
        Err(e) => Err(StoreError::Decode {
            column: column.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Read an integer column.
pub fn int_column(row: &AnyRow, column: &str) -> Result<Option<i64>, StoreError> {
    row.try_get::<Option<i64>, _>(column).map_err(|e| StoreError::Decode {
        column: column.to_string(),
        reason: e.to_string(),
    })
}

fn title_column(row: &AnyRow) -> Result<String, StoreError> {
    Ok(text_column(row, "section_title")?.unwrap_or_default())
}

/// The section expression as text with NULL folded to `""`.
fn section_value(expr: &str) -> String {
    format!("COALESCE(CAST({} AS CHAR), '')", expr)
}

/// `WHERE ...` (with a leading space) plus its params, optionally
/// narrowed to one section.
fn where_clause(
    dialect: SqlDialect,
    query: &StoreQuery<'_>,
    section: Option<SectionKey<'_>>,
) -> (String, Vec<SqlParam>) {
    let mut parts = Vec::new();
    let mut params = Vec::new();

    if let Some(filter) = query.filter {
        let sql = SqlTranslator::translate_for(&filter.predicate, dialect);
        parts.push(sql.clause);
        params.extend(sql.params);
    }
    if let Some(key) = section {
        parts.push(format!("{} = ?", section_value(key.expr)));
        params.push(SqlParam::Text(key.title.to_string()));
    }

    if parts.is_empty() {
        (String::new(), params)
    } else {
        (format!(" WHERE {}", parts.join(" AND ")), params)
    }
}

/// ` ORDER BY ...` for pages, empty when nothing orders the rows.
fn order_clause(query: &StoreQuery<'_>) -> String {
    let mut terms = Vec::new();
    match (query.order, query.section) {
        (Some(order), _) => terms.push(order.to_sql()),
        (None, Some(expr)) => terms.push(format!("{} ASC", section_value(expr))),
        (None, None) => {}
    }
    if let Some(key) = query.key {
        if query.order.map_or(true, |o| o.field != key) {
            terms.push(format!("{} ASC", key));
        }
    }

    if terms.is_empty() {
        String::new()
    } else {
        format!(" ORDER BY {}", terms.join(", "))
    }
}

/// Page query without its trailing `LIMIT ? OFFSET ?` binds.
fn page_sql(dialect: SqlDialect, query: &StoreQuery<'_>) -> (String, Vec<SqlParam>) {
    let (where_sql, params) = where_clause(dialect, query, None);
    let sql = format!(
        "SELECT {} FROM {}{}{} LIMIT ? OFFSET ?",
        query.columns.join(", "),
        query.table,
        where_sql,
        order_clause(query)
    );
    (sql, params)
}

fn count_distinct_sql(dialect: SqlDialect, query: &StoreQuery<'_>, expr: &str) -> (String, Vec<SqlParam>) {
    let (where_sql, params) = where_clause(dialect, query, None);
    let sql = format!(
        "SELECT COUNT(DISTINCT {}) AS cnt FROM {}{}",
        section_value(expr),
        query.table,
        where_sql
    );
    (sql, params)
}

fn section_titles_sql(dialect: SqlDialect, query: &StoreQuery<'_>, expr: &str) -> (String, Vec<SqlParam>) {
    let (where_sql, params) = where_clause(dialect, query, None);
    // Group order follows the row order: a descending list puts the
    // section holding the largest key first.
    let order_sql = match query.order {
        Some(o) if o.direction == Direction::Descending => format!("MAX({}) DESC", o.field),
        Some(o) => format!("MIN({}) ASC", o.field),
        None => "section_title ASC".to_string(),
    };
    let sql = format!(
        "SELECT {} AS section_title FROM {}{} GROUP BY section_title ORDER BY {}",
        section_value(expr),
        query.table,
        where_sql,
        order_sql
    );
    (sql, params)
}

pub struct SqlStore<R> {
    pool: AnyPool,
    dialect: SqlDialect,
    _record: PhantomData<fn() -> R>,
}

impl<R: SqlRecord> SqlStore<R> {
    /// Connect using `config.sql_url`, retrying briefly so a bad URL fails fast.
    pub async fn connect(config: &ListConfig) -> Result<Self, StoreError> {
        let url = config
            .sql_url
            .as_deref()
            .ok_or_else(|| StoreError::Connection("sql_url not configured".into()))?;
        install_drivers();

        let pool = retry("sql_connect", &RetryConfig::startup(), || async {
            AnyPoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
                .idle_timeout(Duration::from_secs(300))
                .connect(url)
                .await
                .map_err(|e| StoreError::Connection(e.to_string()))
        })
        .await?;

        let store = Self::from_pool(pool);
        info!(
            max_connections = config.max_connections,
            dialect = ?store.dialect,
            "SQL store connected"
        );
        Ok(store)
    }

    /// Wrap an existing pool. The SQL dialect follows the pool's URL scheme.
    pub fn from_pool(pool: AnyPool) -> Self {
        install_drivers();
        let dialect = SqlDialect::from_url(pool.connect_options().database_url.as_str());
        Self {
            pool,
            dialect,
            _record: PhantomData,
        }
    }

    /// Get a clone of the connection pool.
    pub fn pool(&self) -> AnyPool {
        self.pool.clone()
    }

    /// Dialect filters are rendered in
    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    fn bind_all<'q>(
        mut q: Query<'q, Any, AnyArguments<'q>>,
        params: &'q [SqlParam],
    ) -> Query<'q, Any, AnyArguments<'q>> {
        for param in params {
            q = match param {
                SqlParam::Text(s) => q.bind(s.as_str()),
                SqlParam::Numeric(n) => q.bind(*n),
                SqlParam::Boolean(b) => q.bind(*b),
                SqlParam::Null => q.bind(None::<String>),
            };
        }
        q
    }

    async fn scalar_count(&self, sql: &str, params: &[SqlParam], op: &'static str) -> Result<u64, StoreError> {
        let result = {
            let _timer = LatencyTimer::new(op);
            Self::bind_all(sqlx::query(sql), params)
                .fetch_one(&self.pool)
                .await
        };

        let row = result.map_err(|e| {
            warn!(op, error = %e, "SQL aggregate failed");
            metrics::record_store_error(op);
            StoreError::Backend(e.to_string())
        })?;
        let cnt: i64 = row.try_get("cnt").map_err(|e| StoreError::Decode {
            column: "cnt".into(),
            reason: e.to_string(),
        })?;
        Ok(cnt.max(0) as u64)
    }
}

#[async_trait]
impl<R: SqlRecord> RecordStore<R> for SqlStore<R> {
    #[instrument(skip(self, query), fields(table = query.table))]
    async fn fetch_page(&self, query: &StoreQuery<'_>, offset: u64, limit: u64) -> Result<Vec<R>, StoreError> {
        let (sql, params) = page_sql(self.dialect, query);

        let result = {
            let _timer = LatencyTimer::new("fetch_page");
            Self::bind_all(sqlx::query(&sql), &params)
                .bind(limit as i64)
                .bind(offset as i64)
                .fetch_all(&self.pool)
                .await
        };

        let rows = result.map_err(|e| {
            warn!(error = %e, "SQL page fetch failed");
            metrics::record_store_error("fetch_page");
            StoreError::Backend(e.to_string())
        })?;
        debug!(rows = rows.len(), offset, limit, "Fetched page");

        rows.iter().map(R::from_row).collect()
    }

    #[instrument(skip(self, query, section), fields(table = query.table))]
    async fn count(&self, query: &StoreQuery<'_>, section: Option<SectionKey<'_>>) -> Result<u64, StoreError> {
        let (where_sql, params) = where_clause(self.dialect, query, section);
        let sql = format!("SELECT COUNT(*) AS cnt FROM {}{}", query.table, where_sql);
        self.scalar_count(&sql, &params, "count").await
    }

    #[instrument(skip(self, query), fields(table = query.table))]
    async fn count_distinct(&self, query: &StoreQuery<'_>, expr: &str) -> Result<u64, StoreError> {
        let (sql, params) = count_distinct_sql(self.dialect, query, expr);
        self.scalar_count(&sql, &params, "count_distinct").await
    }

    #[instrument(skip(self, query), fields(table = query.table))]
    async fn section_titles(&self, query: &StoreQuery<'_>, expr: &str) -> Result<Vec<String>, StoreError> {
        let (sql, params) = section_titles_sql(self.dialect, query, expr);

        let result = {
            let _timer = LatencyTimer::new("section_titles");
            Self::bind_all(sqlx::query(&sql), &params)
                .fetch_all(&self.pool)
                .await
        };

        let rows = result.map_err(|e| {
            warn!(error = %e, "SQL section title query failed");
            metrics::record_store_error("section_titles");
            StoreError::Backend(e.to_string())
        })?;
        rows.iter().map(title_column).collect()
    }
}
