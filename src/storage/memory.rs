// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! In-process record store.
//!
//! Evaluates [`Predicate`](crate::search::Predicate) trees directly against
//! [`Record::value`], so list behavior can be exercised without a database.
//! Also counts round trips and can be told to fail the next one.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use super::traits::{RecordStore, SectionKey, StoreError, StoreQuery};
use crate::config::Direction;
use crate::schema::{FieldValue, Record};

type Expression<R> = Arc<dyn Fn(&R) -> String + Send + Sync>;

pub struct MemoryStore<R: Record> {
    rows: RwLock<Vec<R>>,
    expressions: HashMap<String, Expression<R>>,
    round_trips: AtomicU64,
    page_fetches: AtomicU64,
    fail_next: AtomicBool,
}

impl<R: Record> MemoryStore<R> {
    #[must_use]
    pub fn new(rows: Vec<R>) -> Self {
        Self {
            rows: RwLock::new(rows),
            expressions: HashMap::new(),
            round_trips: AtomicU64::new(0),
            page_fetches: AtomicU64::new(0),
            fail_next: AtomicBool::new(false),
        }
    }

    /// Teach the store how to evaluate a section expression.
    #[must_use]
    pub fn with_expression(
        mut self,
        expr: impl Into<String>,
        eval: impl Fn(&R) -> String + Send + Sync + 'static,
    ) -> Self {
        self.expressions.insert(expr.into(), Arc::new(eval));
        self
    }

    /// Append a row
    pub fn insert(&self, row: R) {
        self.rows.write().push(row);
    }

    /// Remove rows matching `pred`, returning how many went
    pub fn remove_where(&self, pred: impl Fn(&R) -> bool) -> usize {
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|r| !pred(r));
        before - rows.len()
    }

    /// Get current row count
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// Total round trips served (pages and aggregates)
    pub fn round_trips(&self) -> u64 {
        self.round_trips.load(Ordering::Relaxed)
    }

    /// Page fetches served
    pub fn page_fetches(&self) -> u64 {
        self.page_fetches.load(Ordering::Relaxed)
    }

    /// Make the next round trip fail with a backend error.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::Relaxed);
    }

    fn begin(&self) -> Result<(), StoreError> {
        self.round_trips.fetch_add(1, Ordering::Relaxed);
        if self.fail_next.swap(false, Ordering::Relaxed) {
            return Err(StoreError::Backend("injected failure".into()));
        }
        Ok(())
    }

    fn expression(&self, expr: &str) -> Result<&Expression<R>, StoreError> {
        self.expressions
            .get(expr)
            .ok_or_else(|| StoreError::UnknownExpression(expr.to_string()))
    }

    /// Matching rows in query order.
    fn select(&self, query: &StoreQuery<'_>) -> Vec<R> {
        let mut rows: Vec<R> = self
            .rows
            .read()
            .iter()
            .filter(|row| match query.filter {
                Some(filter) => filter.predicate.matches(&|field| row.value(field)),
                None => true,
            })
            .cloned()
            .collect();

        // Same precedence as the SQL store: explicit order, else section
        // value, then the primary key. Stable, so remaining ties keep
        // insertion order.
        let section = match (query.order, query.section) {
            (None, Some(expr)) => self.expressions.get(expr).cloned(),
            _ => None,
        };
        if query.order.is_some() || section.is_some() {
            let value = |r: &R, field: &str| r.value(field).unwrap_or(FieldValue::Null);
            rows.sort_by(|a, b| {
                let primary = match (query.order, &section) {
                    (Some(order), _) => match order.direction {
                        Direction::Ascending => value(a, &order.field).sort_cmp(&value(b, &order.field)),
                        Direction::Descending => value(b, &order.field).sort_cmp(&value(a, &order.field)),
                    },
                    (None, Some(eval)) => eval(a).cmp(&eval(b)),
                    (None, None) => std::cmp::Ordering::Equal,
                };
                primary.then_with(|| match query.key {
                    Some(key) => value(a, key).sort_cmp(&value(b, key)),
                    None => std::cmp::Ordering::Equal,
                })
            });
        }
        rows
    }
}

impl<R: Record> Default for MemoryStore<R> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for MemoryStore<R> {
    async fn fetch_page(&self, query: &StoreQuery<'_>, offset: u64, limit: u64) -> Result<Vec<R>, StoreError> {
        self.begin()?;
        self.page_fetches.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .select(query)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self, query: &StoreQuery<'_>, section: Option<SectionKey<'_>>) -> Result<u64, StoreError> {
        self.begin()?;
        let rows = self.select(query);
        let n = match section {
            Some(key) => {
                let eval = self.expression(key.expr)?;
                rows.iter().filter(|r| eval(*r) == key.title).count()
            }
            None => rows.len(),
        };
        Ok(n as u64)
    }

    async fn count_distinct(&self, query: &StoreQuery<'_>, expr: &str) -> Result<u64, StoreError> {
        self.begin()?;
        let eval = self.expression(expr)?;
        let mut seen: Vec<String> = Vec::new();
        for row in self.select(query) {
            let title = eval(&row);
            if !seen.contains(&title) {
                seen.push(title);
            }
        }
        Ok(seen.len() as u64)
    }

    async fn section_titles(&self, query: &StoreQuery<'_>, expr: &str) -> Result<Vec<String>, StoreError> {
        self.begin()?;
        let eval = self.expression(expr)?;
        let mut titles: Vec<String> = Vec::new();
        for row in self.select(query) {
            let title = eval(&row);
            if !titles.contains(&title) {
                titles.push(title);
            }
        }
        Ok(titles)
    }
}
