// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! List Model
//!
//! The object a list control holds. Owns the store handle, the field
//! catalog, the current filter, the section index and the window, and
//! keeps all of them describing the same filtered, ordered sequence.
//!
//! # Architecture
//!
//! ```text
//! set_search_text(text)
//!       │
//!       ├─→ compile → Filter (predicate + WHERE clause)
//!       │        │
//!       │        └─→ Same rendering as before? Nothing to do
//!       │
//!       └─→ refresh(): clear window, invalidate sections
//!
//! get_item(section, row)
//!       │
//!       ├─→ SectionIndex: row count check, (section, row) → flat
//!       │
//!       └─→ Window: hit, or one fetch from the store
//! ```
//!
//! Every public operation either answers from cache or performs the store
//! round trips it needs, in order, before returning. Methods take
//! `&mut self`, so one model has one caller at a time.

use tracing::{debug, info};

use crate::catalog::FieldCatalog;
use crate::config::{ListConfig, OrderSpec};
use crate::metrics;
use crate::schema::{Record, RecordSchema};
use crate::search::{Filter, SqlTranslator};
use crate::sections::SectionIndex;
use crate::storage::traits::{RecordStore, StoreError, StoreQuery};
use crate::window::{Window, WindowStats};

/// What every store request is built from. Kept apart from the caches so
/// a query can borrow it while the caches are updated.
struct QueryState {
    catalog: FieldCatalog,
    filter: Option<Filter>,
    order: Option<OrderSpec>,
    section: Option<String>,
}

impl QueryState {
    fn query(&self) -> StoreQuery<'_> {
        StoreQuery {
            table: self.catalog.table(),
            columns: self.catalog.columns(),
            filter: self.filter.as_ref(),
            order: self.order.as_ref(),
            section: self.section.as_deref(),
            key: self.catalog.primary_key(),
        }
    }
}

/// Windowed, searchable, sectioned view over a record store.
pub struct ListModel<R, S> {
    store: S,
    state: QueryState,
    search_text: String,
    sections: SectionIndex,
    window: Window<R>,
}

impl<R: Record, S: RecordStore<R>> ListModel<R, S> {
    /// Create a model over `store` using the record type's own schema.
    pub fn new(store: S, config: &ListConfig) -> Self {
        Self::with_schema(store, config, &R::schema())
    }

    /// Create a model using an explicit schema (e.g. a view over the
    /// record type's table).
    pub fn with_schema(store: S, config: &ListConfig, schema: &RecordSchema) -> Self {
        let catalog = FieldCatalog::build(schema);
        info!(
            table = catalog.table(),
            columns = catalog.columns().len(),
            page_size = config.page_size,
            sectioned = config.section_expression.is_some(),
            "List model created"
        );
        Self {
            store,
            state: QueryState {
                catalog,
                filter: None,
                order: config.order.clone(),
                section: config.section_expression.clone(),
            },
            search_text: String::new(),
            sections: SectionIndex::new(config.section_expression.clone()),
            window: Window::new(config.page_size),
        }
    }

    /// Replace the search text.
    ///
    /// Returns `true` if the compiled filter changed and the model was
    /// refreshed. Text compiling to the same filter as before keeps every
    /// cache intact.
    pub fn set_search_text(&mut self, text: &str) -> bool {
        self.search_text = text.to_string();
        let filter = Filter::compile(text, &self.state.catalog);
        if filter == self.state.filter {
            return false;
        }

        debug!(
            filter = %filter
                .as_ref()
                .map(|f| SqlTranslator::translate_inline(&f.predicate))
                .unwrap_or_default(),
            "Search filter changed"
        );
        self.state.filter = filter;
        self.refresh();
        true
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    /// The active filter, `None` when unfiltered.
    pub fn filter(&self) -> Option<&Filter> {
        self.state.filter.as_ref()
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.state.catalog
    }

    /// Number of sections among matching rows.
    pub async fn section_count(&mut self) -> Result<u64, StoreError> {
        self.sections.count(&self.store, &self.state.query()).await
    }

    /// Title of one section, `None` past the last section.
    pub async fn section_title(&mut self, section: usize) -> Result<Option<String>, StoreError> {
        self.sections.title(&self.store, &self.state.query(), section).await
    }

    /// All section titles in row order.
    pub async fn section_titles(&mut self) -> Result<Vec<String>, StoreError> {
        Ok(self.sections.titles(&self.store, &self.state.query()).await?.to_vec())
    }

    /// Rows in one section, `None` past the last section.
    pub async fn row_count(&mut self, section: usize) -> Result<Option<u64>, StoreError> {
        self.sections.row_count(&self.store, &self.state.query(), section).await
    }

    /// Record at `(section, row)`, `None` if that address holds no row.
    pub async fn get_item(&mut self, section: usize, row: u64) -> Result<Option<R>, StoreError> {
        let query = self.state.query();
        match self.sections.row_count(&self.store, &query, section).await? {
            Some(rows) if row < rows => {}
            _ => return Ok(None),
        }
        let Some(flat) = self.sections.to_flat_index(&self.store, &query, section, row).await? else {
            return Ok(None);
        };
        self.window.get(&self.store, &query, flat).await
    }

    /// Record at a flat index over the filtered, ordered sequence.
    pub async fn get_flat(&mut self, flat: u64) -> Result<Option<R>, StoreError> {
        self.window.get(&self.store, &self.state.query(), flat).await
    }

    /// `(section, row)` address of a flat index, `None` past the last row.
    pub async fn locate(&mut self, flat: u64) -> Result<Option<(usize, u64)>, StoreError> {
        self.sections.locate(&self.store, &self.state.query(), flat).await
    }

    /// Forget cached rows and section state.
    ///
    /// Call after rows were inserted, updated or deleted behind the model's
    /// back; the store pushes no invalidation.
    pub fn refresh(&mut self) {
        debug!(
            cached = self.window.len(),
            offset = self.window.offset(),
            "Refreshing list model"
        );
        self.window.clear();
        self.sections.invalidate();
        metrics::record_refresh();
    }

    pub fn window_stats(&self) -> WindowStats {
        self.window.stats()
    }

    /// Flat indices the window currently holds
    pub fn window_range(&self) -> std::ops::Range<u64> {
        self.window.range()
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
