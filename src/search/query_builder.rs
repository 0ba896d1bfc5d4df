// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query Builder - predicate AST compiled from search text
//!
//! Search text is compiled into conjunctive normal form: one `Or` clause
//! per token, all clauses AND'ed together.
//!
//! ```text
//! "tail:N123 xc"
//!     ↓ tokenize
//! [Field{tail, N123}, Term{xc}]
//!     ↓ compile
//! And[
//!   Or[Like(tail, N123)],
//!   Or[IsTrue(cross_country), Like(tail, xc), Like(route, xc)],
//! ]
//! ```
//!
//! # Example
//!
//! ```rust
//! use list_window::catalog::FieldCatalog;
//! use list_window::schema::RecordSchema;
//! use list_window::search::{compile, Predicate};
//!
//! let catalog = FieldCatalog::build(
//!     &RecordSchema::new("aircraft").primary_key("id").text("tail"),
//! );
//!
//! let predicate = compile("tail:N12345", &catalog).unwrap();
//! assert_eq!(
//!     predicate,
//!     Predicate::And(vec![Predicate::Or(vec![Predicate::like("tail", "N12345")])])
//! );
//! assert!(compile("   ", &catalog).is_none());
//! ```

use serde::{Deserialize, Serialize};

use super::sql_translator::{SqlQuery, SqlTranslator};
use super::tokenizer::{tokenize, Token};
use crate::catalog::FieldCatalog;
use crate::schema::FieldValue;

/// Filter predicate AST
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// All children must match
    And(Vec<Predicate>),
    /// Any child may match
    Or(Vec<Predicate>),
    /// Case-insensitive substring match. `pattern` is the raw user literal.
    Like { field: String, pattern: String },
    /// Field equals value
    Exact { field: String, value: FieldValue },
    /// Boolean field is set
    IsTrue(String),
}

impl Predicate {
    /// Substring match atom
    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Predicate::Like {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    /// Equality atom
    pub fn exact(field: impl Into<String>, value: FieldValue) -> Self {
        Predicate::Exact {
            field: field.into(),
            value,
        }
    }

    /// Boolean atom
    pub fn is_true(field: impl Into<String>) -> Self {
        Predicate::IsTrue(field.into())
    }

    /// Evaluate against a record's field values. Unknown fields never match.
    pub fn matches(&self, value_of: &dyn Fn(&str) -> Option<FieldValue>) -> bool {
        match self {
            Predicate::And(children) => children.iter().all(|c| c.matches(value_of)),
            Predicate::Or(children) => children.iter().any(|c| c.matches(value_of)),
            Predicate::Like { field, pattern } => value_of(field)
                .filter(|v| *v != FieldValue::Null)
                .map(|v| v.as_text().to_lowercase().contains(&pattern.to_lowercase()))
                .unwrap_or(false),
            Predicate::Exact { field, value } => value_of(field).as_ref() == Some(value),
            Predicate::IsTrue(field) => value_of(field).map(|v| v.is_truthy()).unwrap_or(false),
        }
    }
}

/// Compile search text into a predicate.
///
/// Returns `None` when the text carries no constraint, which means the
/// dataset is unfiltered. Malformed input never fails: tokens that cannot
/// be resolved simply contribute nothing.
pub fn compile(text: &str, catalog: &FieldCatalog) -> Option<Predicate> {
    let clauses: Vec<Predicate> = tokenize(text)
        .into_iter()
        .filter_map(|token| clause_for(token, catalog))
        .collect();

    if clauses.is_empty() {
        None
    } else {
        Some(Predicate::And(clauses))
    }
}

fn clause_for(token: Token, catalog: &FieldCatalog) -> Option<Predicate> {
    let atoms: Vec<Predicate> = match token {
        Token::Field { alias, value } => {
            if value.is_empty() {
                return None;
            }
            catalog
                .resolve(&alias)
                .iter()
                .map(|field| Predicate::like(field.as_str(), value.as_str()))
                .collect()
        }
        Token::Term { text, quoted } => {
            if text.is_empty() {
                return None;
            }
            let flags = (!quoted)
                .then(|| catalog.boolean_fields_for(&text))
                .into_iter()
                .flatten()
                .map(|field| Predicate::is_true(field.as_str()));
            let scan = catalog
                .text_fields()
                .map(|field| Predicate::like(field.as_str(), text.as_str()));
            flags.chain(scan).collect()
        }
    };

    (!atoms.is_empty()).then_some(Predicate::Or(atoms))
}

/// A compiled filter: the predicate plus its parameterized SQL rendering.
///
/// Filters compare by their rendering, so two search strings that compile
/// to the same WHERE clause and parameters are the same filter.
#[derive(Debug, Clone)]
pub struct Filter {
    pub predicate: Predicate,
    pub sql: SqlQuery,
}

impl Filter {
    /// Compile search text; `None` when it carries no constraint.
    pub fn compile(text: &str, catalog: &FieldCatalog) -> Option<Self> {
        compile(text, catalog).map(Self::from_predicate)
    }

    /// Wrap an already-built predicate.
    pub fn from_predicate(predicate: Predicate) -> Self {
        let sql = SqlTranslator::translate(&predicate);
        Self { predicate, sql }
    }
}

impl PartialEq for Filter {
    fn eq(&self, other: &Self) -> bool {
        self.sql == other.sql
    }
}
