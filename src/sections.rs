// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Section Index
//!
//! Partitions the filtered row sequence into sections by a store expression
//! (e.g. the year of a date) and maps `(section, row)` addresses to flat
//! indices over that sequence.
//!
//! ```text
//! titles      ["2024", "2023", "2022"]
//! row counts  [   5  ,    0  ,    7  ]     lazily, one query per section
//! flat        0..5    (empty)  5..12
//!
//! (2, 3) → 5 + 0 + 3 = 8
//! ```
//!
//! Everything is computed on first use and cached until invalidated.
//! Without a section expression the dataset is one unnamed section; if no
//! row matches there are no sections at all.

use tracing::debug;

use crate::metrics;
use crate::storage::traits::{RecordStore, SectionKey, StoreError, StoreQuery};

/// Lazily filled section state for one filter/order.
#[derive(Debug, Clone, Default)]
pub struct SectionIndex {
    expression: Option<String>,
    count: Option<u64>,
    titles: Option<Vec<String>>,
    /// Parallel to `titles`
    row_counts: Vec<Option<u64>>,
}

impl SectionIndex {
    pub fn new(expression: Option<String>) -> Self {
        Self {
            expression,
            ..Default::default()
        }
    }

    pub fn expression(&self) -> Option<&str> {
        self.expression.as_deref()
    }

    /// Drop the cached section count.
    pub fn invalidate_count(&mut self) {
        self.count = None;
    }

    /// Drop cached titles and the row counts indexed by them.
    pub fn invalidate_titles(&mut self) {
        self.titles = None;
        self.row_counts.clear();
    }

    /// Drop everything.
    pub fn invalidate(&mut self) {
        self.invalidate_count();
        self.invalidate_titles();
    }

    /// Number of sections among matching rows.
    pub async fn count<R, S>(&mut self, store: &S, query: &StoreQuery<'_>) -> Result<u64, StoreError>
    where
        R: Send,
        S: RecordStore<R> + ?Sized,
    {
        if let Some(count) = self.count {
            return Ok(count);
        }

        let count = match self.expression.clone() {
            Some(expr) => {
                metrics::record_section_query("count_distinct");
                store.count_distinct(query, &expr).await?
            }
            None => {
                let total = self.unsectioned_total(store, query).await?;
                u64::from(total > 0)
            }
        };
        debug!(count, "Section count computed");
        self.count = Some(count);
        Ok(count)
    }

    /// Section titles in row order.
    pub async fn titles<R, S>(&mut self, store: &S, query: &StoreQuery<'_>) -> Result<&[String], StoreError>
    where
        R: Send,
        S: RecordStore<R> + ?Sized,
    {
        if self.titles.is_none() {
            let titles = match self.expression.clone() {
                Some(expr) => {
                    metrics::record_section_query("section_titles");
                    let titles = store.section_titles(query, &expr).await?;
                    self.row_counts = vec![None; titles.len()];
                    titles
                }
                None => {
                    let total = self.unsectioned_total(store, query).await?;
                    if total > 0 { vec![String::new()] } else { Vec::new() }
                }
            };
            debug!(sections = titles.len(), "Section titles computed");
            self.titles = Some(titles);
        }
        Ok(self.titles.as_deref().unwrap_or_default())
    }

    /// Title of one section, `None` past the last section.
    pub async fn title<R, S>(&mut self, store: &S, query: &StoreQuery<'_>, section: usize) -> Result<Option<String>, StoreError>
    where
        R: Send,
        S: RecordStore<R> + ?Sized,
    {
        Ok(self.titles(store, query).await?.get(section).cloned())
    }

    /// Rows in one section, `None` past the last section.
    pub async fn row_count<R, S>(&mut self, store: &S, query: &StoreQuery<'_>, section: usize) -> Result<Option<u64>, StoreError>
    where
        R: Send,
        S: RecordStore<R> + ?Sized,
    {
        let Some(title) = self.titles(store, query).await?.get(section).cloned() else {
            return Ok(None);
        };
        if let Some(Some(n)) = self.row_counts.get(section) {
            return Ok(Some(*n));
        }

        metrics::record_section_query("count");
        let key = self.expression.as_deref().map(|expr| SectionKey { expr, title: &title });
        let n = store.count(query, key).await?;
        debug!(section, rows = n, "Section row count computed");
        self.set_row_count(section, n);
        Ok(Some(n))
    }

    /// Flat index of `(section, row)`: rows in earlier sections plus `row`.
    pub async fn to_flat_index<R, S>(
        &mut self,
        store: &S,
        query: &StoreQuery<'_>,
        section: usize,
        row: u64,
    ) -> Result<Option<u64>, StoreError>
    where
        R: Send,
        S: RecordStore<R> + ?Sized,
    {
        if section >= self.titles(store, query).await?.len() {
            return Ok(None);
        }
        let mut flat = row;
        for earlier in 0..section {
            flat += self.row_count(store, query, earlier).await?.unwrap_or(0);
        }
        Ok(Some(flat))
    }

    /// Inverse of [`to_flat_index`](Self::to_flat_index): the section and
    /// row holding `flat`, `None` past the last row.
    pub async fn locate<R, S>(&mut self, store: &S, query: &StoreQuery<'_>, flat: u64) -> Result<Option<(usize, u64)>, StoreError>
    where
        R: Send,
        S: RecordStore<R> + ?Sized,
    {
        let sections = self.titles(store, query).await?.len();
        let mut start = 0;
        for section in 0..sections {
            let rows = self.row_count(store, query, section).await?.unwrap_or(0);
            if flat < start + rows {
                return Ok(Some((section, flat - start)));
            }
            start += rows;
        }
        Ok(None)
    }

    async fn unsectioned_total<R, S>(&mut self, store: &S, query: &StoreQuery<'_>) -> Result<u64, StoreError>
    where
        R: Send,
        S: RecordStore<R> + ?Sized,
    {
        if let Some(Some(n)) = self.row_counts.first() {
            return Ok(*n);
        }
        metrics::record_section_query("count");
        let total = store.count(query, None).await?;
        self.set_row_count(0, total);
        Ok(total)
    }

    fn set_row_count(&mut self, section: usize, n: u64) {
        if self.row_counts.len() <= section {
            self.row_counts.resize(section + 1, None);
        }
        self.row_counts[section] = Some(n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Direction, OrderSpec};
    use crate::schema::{FieldValue, Record, RecordSchema};
    use crate::search::{Filter, Predicate};
    use crate::storage::memory::MemoryStore;

    #[derive(Debug, Clone)]
    struct Flight {
        id: i64,
        year: i64,
        tail: String,
    }

    impl Record for Flight {
        fn schema() -> RecordSchema {
            RecordSchema::new("flights").primary_key("id").numeric("year").text("tail")
        }

        fn value(&self, field: &str) -> Option<FieldValue> {
            match field {
                "id" => Some(FieldValue::Numeric(self.id as f64)),
                "year" => Some(FieldValue::Numeric(self.year as f64)),
                "tail" => Some(FieldValue::Text(self.tail.clone())),
                _ => None,
            }
        }
    }

    /// 2024 x5, 2022 x7, newest first
    fn store() -> MemoryStore<Flight> {
        let mut rows = Vec::new();
        for i in 0..5 {
            rows.push(Flight { id: i, year: 2024, tail: format!("N{}", i) });
        }
        for i in 5..12 {
            rows.push(Flight { id: i, year: 2022, tail: format!("C-G{}", i) });
        }
        MemoryStore::new(rows).with_expression("year", |f: &Flight| f.year.to_string())
    }

    fn columns() -> Vec<String> {
        vec!["id".into(), "year".into(), "tail".into()]
    }

    #[tokio::test]
    async fn test_counts_and_titles() {
        let store = store();
        let cols = columns();
        let order = OrderSpec::new("year", Direction::Descending);
        let query = StoreQuery { table: "flights", columns: &cols, filter: None, order: Some(&order), section: None, key: None };
        let mut index = SectionIndex::new(Some("year".into()));

        assert_eq!(index.count(&store, &query).await.unwrap(), 2);
        assert_eq!(index.titles(&store, &query).await.unwrap(), &["2024", "2022"]);
        assert_eq!(index.row_count(&store, &query, 0).await.unwrap(), Some(5));
        assert_eq!(index.row_count(&store, &query, 1).await.unwrap(), Some(7));
        assert_eq!(index.row_count(&store, &query, 2).await.unwrap(), None);
        assert_eq!(index.title(&store, &query, 1).await.unwrap().as_deref(), Some("2022"));
    }

    #[tokio::test]
    async fn test_values_cached_until_invalidated() {
        let store = store();
        let cols = columns();
        let query = StoreQuery { table: "flights", columns: &cols, filter: None, order: None, section: None, key: None };
        let mut index = SectionIndex::new(Some("year".into()));

        index.count(&store, &query).await.unwrap();
        index.titles(&store, &query).await.unwrap();
        index.row_count(&store, &query, 0).await.unwrap();
        let trips = store.round_trips();

        index.count(&store, &query).await.unwrap();
        index.titles(&store, &query).await.unwrap();
        index.row_count(&store, &query, 0).await.unwrap();
        assert_eq!(store.round_trips(), trips);

        // Titles reset drops row counts too, but not the section count
        index.invalidate_titles();
        index.count(&store, &query).await.unwrap();
        assert_eq!(store.round_trips(), trips);
        index.row_count(&store, &query, 0).await.unwrap();
        assert_eq!(store.round_trips(), trips + 2);
    }

    #[tokio::test]
    async fn test_row_counts_are_lazy() {
        let store = store();
        let cols = columns();
        let query = StoreQuery { table: "flights", columns: &cols, filter: None, order: None, section: None, key: None };
        let mut index = SectionIndex::new(Some("year".into()));

        index.titles(&store, &query).await.unwrap();
        let trips = store.round_trips();
        index.row_count(&store, &query, 1).await.unwrap();
        // Only the touched section was counted
        assert_eq!(store.round_trips(), trips + 1);
    }

    #[tokio::test]
    async fn test_flat_index_round_trip() {
        let store = store();
        let cols = columns();
        let order = OrderSpec::new("year", Direction::Descending);
        let query = StoreQuery { table: "flights", columns: &cols, filter: None, order: Some(&order), section: None, key: None };
        let mut index = SectionIndex::new(Some("year".into()));

        assert_eq!(index.to_flat_index(&store, &query, 1, 3).await.unwrap(), Some(8));
        assert_eq!(index.to_flat_index(&store, &query, 5, 0).await.unwrap(), None);

        for flat in 0..12 {
            let (section, row) = index.locate(&store, &query, flat).await.unwrap().unwrap();
            assert_eq!(index.to_flat_index(&store, &query, section, row).await.unwrap(), Some(flat));
        }
        assert_eq!(index.locate(&store, &query, 12).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_filter_narrows_sections() {
        let store = store();
        let cols = columns();
        let filter = Filter::from_predicate(Predicate::like("tail", "C-G"));
        let query = StoreQuery { table: "flights", columns: &cols, filter: Some(&filter), order: None, section: None, key: None };
        let mut index = SectionIndex::new(Some("year".into()));

        assert_eq!(index.count(&store, &query).await.unwrap(), 1);
        assert_eq!(index.titles(&store, &query).await.unwrap(), &["2022"]);
        assert_eq!(index.row_count(&store, &query, 0).await.unwrap(), Some(7));
    }

    #[tokio::test]
    async fn test_unsectioned_single_section() {
        let store = store();
        let cols = columns();
        let query = StoreQuery { table: "flights", columns: &cols, filter: None, order: None, section: None, key: None };
        let mut index = SectionIndex::new(None);

        assert_eq!(index.count(&store, &query).await.unwrap(), 1);
        assert_eq!(index.titles(&store, &query).await.unwrap(), &[""]);
        assert_eq!(index.row_count(&store, &query, 0).await.unwrap(), Some(12));
        assert_eq!(index.row_count(&store, &query, 1).await.unwrap(), None);
        // One count(*) served all three
        assert_eq!(store.round_trips(), 1);
    }

    #[tokio::test]
    async fn test_unsectioned_empty_has_no_sections() {
        let store: MemoryStore<Flight> = MemoryStore::default();
        let cols = columns();
        let query = StoreQuery { table: "flights", columns: &cols, filter: None, order: None, section: None, key: None };
        let mut index = SectionIndex::new(None);

        assert_eq!(index.count(&store, &query).await.unwrap(), 0);
        assert!(index.titles(&store, &query).await.unwrap().is_empty());
        assert_eq!(index.row_count(&store, &query, 0).await.unwrap(), None);
        assert_eq!(index.to_flat_index(&store, &query, 0, 0).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_query_leaves_state_unset() {
        let store = store();
        let cols = columns();
        let query = StoreQuery { table: "flights", columns: &cols, filter: None, order: None, section: None, key: None };
        let mut index = SectionIndex::new(Some("year".into()));

        store.fail_next();
        assert!(index.count(&store, &query).await.is_err());
        assert_eq!(index.count(&store, &query).await.unwrap(), 2);
    }
}
