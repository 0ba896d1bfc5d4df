// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::OrderSpec;
use crate::search::Filter;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store connection error: {0}")]
    Connection(String),
    #[error("Store backend error: {0}")]
    Backend(String),
    #[error("Failed to decode column '{column}': {reason}")]
    Decode { column: String, reason: String },
    #[error("Unknown section expression: {0}")]
    UnknownExpression(String),
}

/// The filtered, ordered row sequence a request addresses.
///
/// Page queries and aggregate queries built from the same `StoreQuery`
/// see the same rows in the same order.
#[derive(Debug, Clone, Copy)]
pub struct StoreQuery<'a> {
    /// Table or view name
    pub table: &'a str,
    /// Columns to load for each record
    pub columns: &'a [String],
    /// `None` means unfiltered
    pub filter: Option<&'a Filter>,
    pub order: Option<&'a OrderSpec>,
    /// Section expression; orders pages when `order` is `None`
    pub section: Option<&'a str>,
    /// Primary key column, the final tiebreaker of every page order
    pub key: Option<&'a str>,
}

/// Restricts an aggregate to rows whose section expression equals `title`.
#[derive(Debug, Clone, Copy)]
pub struct SectionKey<'a> {
    pub expr: &'a str,
    pub title: &'a str,
}

/// Backing store the list engine pages over.
///
/// Every method is exactly one round trip. Implementations must return
/// rows in a stable order for identical filter and order.
#[async_trait]
pub trait RecordStore<R: Send>: Send + Sync {
    /// Rows `[offset, offset + limit)` of the filtered, ordered sequence.
    /// Returns fewer rows (possibly none) past the end.
    async fn fetch_page(&self, query: &StoreQuery<'_>, offset: u64, limit: u64) -> Result<Vec<R>, StoreError>;

    /// Number of matching rows, optionally within one section.
    async fn count(&self, query: &StoreQuery<'_>, section: Option<SectionKey<'_>>) -> Result<u64, StoreError>;

    /// Number of distinct section-expression values among matching rows.
    async fn count_distinct(&self, query: &StoreQuery<'_>, expr: &str) -> Result<u64, StoreError>;

    /// Distinct section-expression values in the order the rows appear.
    async fn section_titles(&self, query: &StoreQuery<'_>, expr: &str) -> Result<Vec<String>, StoreError>;
}
