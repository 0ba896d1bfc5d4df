// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Declarative record schemas.
//!
//! A record type describes its persisted fields once, up front, and the
//! [`FieldCatalog`](crate::catalog::FieldCatalog) is derived from that
//! description. Nothing is discovered at runtime.
//!
//! # Example
//!
//! ```rust
//! use list_window::schema::{RecordSchema, ValueKind};
//!
//! let schema = RecordSchema::new("flights")
//!     .primary_key("id")
//!     .text("tail")
//!     .text_aliased("route", &["via"])
//!     .boolean_aliased("cross_country", &["xc"])
//!     .numeric("total_time")
//!     .ignored("photo_cache");
//!
//! assert_eq!(schema.table, "flights");
//! assert_eq!(schema.field("route").unwrap().aliases, vec!["via".to_string()]);
//! assert_eq!(schema.field("total_time").unwrap().kind, ValueKind::Numeric);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Kind of value a field holds, as far as searching is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Text,
    Boolean,
    Numeric,
    Other,
}

/// A single field value reported by a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Null,
    Text(String),
    Boolean(bool),
    Numeric(f64),
}

impl FieldValue {
    /// Text rendering used for substring matching and section titles.
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::Boolean(b) => if *b { "1" } else { "0" }.to_string(),
            FieldValue::Numeric(n) => n.to_string(),
        }
    }

    /// SQL truthiness: non-zero numbers and `true` are true.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Boolean(b) => *b,
            FieldValue::Numeric(n) => *n != 0.0,
            FieldValue::Text(_) | FieldValue::Null => false,
        }
    }

    /// Total order matching how a SQL store sorts mixed values:
    /// nulls first, then numbers and booleans, then text.
    pub fn sort_cmp(&self, other: &FieldValue) -> Ordering {
        fn rank(v: &FieldValue) -> u8 {
            match v {
                FieldValue::Null => 0,
                FieldValue::Boolean(_) | FieldValue::Numeric(_) => 1,
                FieldValue::Text(_) => 2,
            }
        }
        fn number(v: &FieldValue) -> f64 {
            match v {
                FieldValue::Boolean(b) => f64::from(u8::from(*b)),
                FieldValue::Numeric(n) => *n,
                _ => 0.0,
            }
        }

        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            _ if rank(self) == 1 && rank(other) == 1 => number(self).total_cmp(&number(other)),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

/// One persisted field of a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub kind: ValueKind,
    /// Searchable names. Empty means the field answers to its own name.
    pub aliases: Vec<String>,
    pub primary_key: bool,
    /// Not persisted and never searched.
    pub ignored: bool,
}

impl FieldDef {
    fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            aliases: Vec::new(),
            primary_key: false,
            ignored: false,
        }
    }

    /// True when the field takes part in alias and free-text search.
    pub fn is_searchable(&self) -> bool {
        !self.primary_key && !self.ignored
    }
}

/// Declarative description of a record type's table and fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    /// Table or view the records live in
    pub table: String,
    /// Fields in declaration order
    pub fields: Vec<FieldDef>,
}

impl RecordSchema {
    /// Start a schema for the given table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: Vec::new(),
        }
    }

    /// Declare the primary key column.
    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        let mut field = FieldDef::new(name, ValueKind::Other);
        field.primary_key = true;
        self.fields.push(field);
        self
    }

    /// Add a text field searchable by its own name.
    pub fn text(self, name: impl Into<String>) -> Self {
        self.push(name, ValueKind::Text, &[])
    }

    /// Add a text field searchable by the given aliases.
    pub fn text_aliased(self, name: impl Into<String>, aliases: &[&str]) -> Self {
        self.push(name, ValueKind::Text, aliases)
    }

    /// Add a boolean field.
    pub fn boolean(self, name: impl Into<String>) -> Self {
        self.push(name, ValueKind::Boolean, &[])
    }

    /// Add a boolean field answering to the given aliases.
    pub fn boolean_aliased(self, name: impl Into<String>, aliases: &[&str]) -> Self {
        self.push(name, ValueKind::Boolean, aliases)
    }

    /// Add a numeric field.
    pub fn numeric(self, name: impl Into<String>) -> Self {
        self.push(name, ValueKind::Numeric, &[])
    }

    /// Add a field of some other kind (dates, blobs).
    pub fn other(self, name: impl Into<String>) -> Self {
        self.push(name, ValueKind::Other, &[])
    }

    /// Add a field that is neither persisted nor searched.
    pub fn ignored(mut self, name: impl Into<String>) -> Self {
        let mut field = FieldDef::new(name, ValueKind::Other);
        field.ignored = true;
        self.fields.push(field);
        self
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn push(mut self, name: impl Into<String>, kind: ValueKind, aliases: &[&str]) -> Self {
        let mut field = FieldDef::new(name, kind);
        field.aliases = aliases.iter().map(|a| (*a).to_string()).collect();
        self.fields.push(field);
        self
    }
}

/// A record type the list engine can page over.
///
/// The engine never looks inside a record beyond what [`Record::schema`]
/// declares. [`Record::value`] is only consulted by stores that evaluate
/// filters in process, such as [`MemoryStore`](crate::storage::memory::MemoryStore).
pub trait Record: Clone + Send + Sync + 'static {
    fn schema() -> RecordSchema;

    /// Current value of a named field, `None` if the field is unknown.
    fn value(&self, field: &str) -> Option<FieldValue>;
}
