// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Field Catalog
//!
//! Alias and value-kind tables derived once from a [`RecordSchema`].
//!
//! ```text
//! alias (lowercase)  →  [field, field, ...]   declaration order
//! field              →  ValueKind
//! ```
//!
//! Several fields may share one alias (three "visited airport" columns all
//! answering to `via`); they are OR'ed together at query time.

use std::collections::HashMap;

use crate::schema::{FieldDef, Record, RecordSchema, ValueKind};

/// Searchable view of a record type's fields.
#[derive(Debug, Clone)]
pub struct FieldCatalog {
    table: String,
    /// Lowercased alias → candidate field names
    aliases: HashMap<String, Vec<String>>,
    /// Field name → value kind (searchable fields only)
    kinds: HashMap<String, ValueKind>,
    /// Searchable fields in declaration order
    searchable: Vec<String>,
    /// Columns to select: primary key first, then persisted fields
    columns: Vec<String>,
    primary_key: Option<String>,
}

impl FieldCatalog {
    /// Build the catalog for a record type.
    pub fn for_record<R: Record>() -> Self {
        Self::build(&R::schema())
    }

    /// Build the catalog from a schema description.
    pub fn build(schema: &RecordSchema) -> Self {
        let mut aliases: HashMap<String, Vec<String>> = HashMap::new();
        let mut kinds = HashMap::new();
        let mut searchable = Vec::new();

        for field in schema.fields.iter().filter(|f| f.is_searchable()) {
            for alias in Self::aliases_of(field) {
                let candidates = aliases.entry(alias.to_lowercase()).or_default();
                if !candidates.contains(&field.name) {
                    candidates.push(field.name.clone());
                }
            }
            kinds.insert(field.name.clone(), field.kind);
            searchable.push(field.name.clone());
        }

        let mut columns: Vec<String> = schema
            .fields
            .iter()
            .filter(|f| f.primary_key)
            .map(|f| f.name.clone())
            .collect();
        let primary_key = columns.first().cloned();
        columns.extend(searchable.iter().cloned());

        Self {
            table: schema.table.clone(),
            aliases,
            kinds,
            searchable,
            columns,
            primary_key,
        }
    }

    fn aliases_of(field: &FieldDef) -> Vec<&str> {
        if field.aliases.is_empty() {
            vec![field.name.as_str()]
        } else {
            field.aliases.iter().map(String::as_str).collect()
        }
    }

    /// Table or view name
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Columns to select when loading records
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Primary key column, if the schema declares one
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    /// Fields an alias resolves to (case-insensitive). Empty if unknown.
    pub fn resolve(&self, alias: &str) -> &[String] {
        self.aliases
            .get(&alias.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Value kind of a searchable field
    pub fn kind(&self, field: &str) -> Option<ValueKind> {
        self.kinds.get(field).copied()
    }

    /// Boolean fields an alias resolves to.
    pub fn boolean_fields_for(&self, alias: &str) -> impl Iterator<Item = &String> {
        self.resolve(alias)
            .iter()
            .filter(|f| self.kind(f) == Some(ValueKind::Boolean))
    }

    /// Text fields in declaration order, scanned by free-text terms.
    pub fn text_fields(&self) -> impl Iterator<Item = &String> {
        self.searchable
            .iter()
            .filter(|f| self.kind(f) == Some(ValueKind::Text))
    }

    /// True when no field can be searched at all.
    pub fn is_empty(&self) -> bool {
        self.searchable.is_empty()
    }
}
