// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! SQL Translator
//!
//! Renders a [`Predicate`] tree to a parameterized WHERE clause.
//! User input only ever reaches the store as a bound parameter.
//!
//! # SQL Syntax Generated
//!
//! ```sql
//! tail LIKE ? ESCAPE '\'                      -- Like, param '%N12\_3%'
//! tail LIKE ? ESCAPE '\\'                     -- Like on MySQL
//! landings = ?                                -- Exact
//! cross_country = ?                           -- IsTrue, param TRUE
//! (a LIKE ? ESCAPE '\' OR b = ?)              -- Or
//! ((...) AND (...))                           -- And
//! ```

use super::query_builder::Predicate;
use crate::schema::FieldValue;

/// SQL query translator for predicate trees
pub struct SqlTranslator;

/// Backend flavor the WHERE clause is rendered for.
///
/// Only the LIKE escape literal differs: MySQL treats `\` inside a string
/// literal as an escape (unless `NO_BACKSLASH_ESCAPES` is set), so the
/// single backslash must be written `'\\'` there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqlDialect {
    #[default]
    Sqlite,
    MySql,
}

impl SqlDialect {
    /// Dialect for a connection URL (`mysql://`, `mariadb://`, `sqlite:`).
    pub fn from_url(url: &str) -> Self {
        let scheme = url.split(':').next().unwrap_or_default().to_ascii_lowercase();
        match scheme.as_str() {
            "mysql" | "mariadb" => SqlDialect::MySql,
            _ => SqlDialect::Sqlite,
        }
    }

    fn like_escape(self) -> &'static str {
        match self {
            SqlDialect::Sqlite => "ESCAPE '\\'",
            SqlDialect::MySql => "ESCAPE '\\\\'",
        }
    }
}

/// SQL WHERE clause with parameterized placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    /// The WHERE clause (without "WHERE" keyword)
    pub clause: String,
    /// The parameter values in placeholder order
    pub params: Vec<SqlParam>,
}

/// SQL parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Numeric(f64),
    Boolean(bool),
    Null,
}

impl From<&FieldValue> for SqlParam {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Null => SqlParam::Null,
            FieldValue::Text(s) => SqlParam::Text(s.clone()),
            FieldValue::Boolean(b) => SqlParam::Boolean(*b),
            FieldValue::Numeric(n) => SqlParam::Numeric(*n),
        }
    }
}

/// Escape LIKE metacharacters (`\`, `%`, `_`) with a backslash.
///
/// The rendered clause declares `\` as its escape character, so the
/// returned text matches literally.
pub fn escape_like(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len() + 4);
    for c in literal.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl SqlTranslator {
    /// Translate a predicate to a parameterized WHERE clause in the
    /// default (SQLite) dialect.
    ///
    /// Uses `?` placeholders; params are collected in tree-walk order.
    pub fn translate(predicate: &Predicate) -> SqlQuery {
        Self::translate_for(predicate, SqlDialect::default())
    }

    /// Translate for a specific backend.
    pub fn translate_for(predicate: &Predicate, dialect: SqlDialect) -> SqlQuery {
        let mut params = Vec::new();
        let clause = Self::translate_node(predicate, dialect, &mut params);
        SqlQuery { clause, params }
    }

    /// Translate with values inlined.
    ///
    /// Warning: only for log output, never for execution.
    pub fn translate_inline(predicate: &Predicate) -> String {
        let SqlQuery { clause, params } = Self::translate(predicate);

        let mut result = String::with_capacity(clause.len());
        let mut params = params.into_iter();
        for c in clause.chars() {
            if c != '?' {
                result.push(c);
                continue;
            }
            match params.next() {
                Some(SqlParam::Text(s)) => result.push_str(&format!("'{}'", s.replace('\'', "''"))),
                Some(SqlParam::Numeric(n)) => result.push_str(&n.to_string()),
                Some(SqlParam::Boolean(b)) => result.push_str(if b { "TRUE" } else { "FALSE" }),
                Some(SqlParam::Null) => result.push_str("NULL"),
                None => result.push('?'),
            }
        }
        result
    }

    fn translate_node(node: &Predicate, dialect: SqlDialect, params: &mut Vec<SqlParam>) -> String {
        match node {
            Predicate::And(nodes) => Self::join(nodes, " AND ", "1=1", dialect, params),
            Predicate::Or(nodes) => Self::join(nodes, " OR ", "1=0", dialect, params),
            Predicate::Like { field, pattern } => {
                params.push(SqlParam::Text(format!("%{}%", escape_like(pattern))));
                format!("{} LIKE ? {}", field, dialect.like_escape())
            }
            Predicate::Exact { field, value } => {
                params.push(SqlParam::from(value));
                format!("{} = ?", field)
            }
            Predicate::IsTrue(field) => {
                params.push(SqlParam::Boolean(true));
                format!("{} = ?", field)
            }
        }
    }

    fn join(nodes: &[Predicate], op: &str, empty: &str, dialect: SqlDialect, params: &mut Vec<SqlParam>) -> String {
        let parts: Vec<String> = nodes
            .iter()
            .map(|n| Self::translate_node(n, dialect, params))
            .collect();
        match parts.len() {
            0 => empty.to_string(),
            1 => parts[0].clone(),
            _ => format!("({})", parts.join(op)),
        }
    }
}
