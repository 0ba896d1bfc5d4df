// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Windowed Cache
//!
//! Holds a contiguous slice of the filtered, ordered row sequence and moves
//! it in the direction the caller is reading. At most two pages are held.
//!
//! ```text
//!                offset              offset + len
//!                  │                      │
//!  ... ──── [offset-1] [ items ........ ] [offset+len] ──── ...
//!              │                               │
//!        Backward: fetch up to one       Forward: trim head to one
//!        page ending at offset,          page, fetch one page at
//!        prepend, trim tail              the end, append
//!
//!  anywhere else → Reseek: drop items, fetch two pages from the
//!                  page boundary at or below the index
//! ```
//!
//! Each miss costs exactly one store round trip. Window state is only
//! touched once that round trip succeeds; after a failure the next miss
//! reseeks rather than extending a window it can no longer vouch for.

use std::collections::VecDeque;
use std::ops::Range;
use tracing::{debug, warn};

use crate::metrics;
use crate::storage::traits::{RecordStore, StoreError, StoreQuery};

/// Window counters since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowStats {
    /// Lookups answered from the window
    pub hits: u64,
    /// Lookups that needed a fetch
    pub misses: u64,
    /// Successful fetches
    pub fetches: u64,
    /// Failed fetches
    pub failures: u64,
}

impl WindowStats {
    /// Hit rate (0.0 - 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Plan {
    Backward { start: u64, limit: u64 },
    Forward { trim: u64, start: u64, limit: u64 },
    Reseek { start: u64, limit: u64 },
}

impl Plan {
    fn range(self) -> (u64, u64) {
        match self {
            Plan::Backward { start, limit }
            | Plan::Forward { start, limit, .. }
            | Plan::Reseek { start, limit } => (start, limit),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Plan::Backward { .. } => "backward",
            Plan::Forward { .. } => "forward",
            Plan::Reseek { .. } => "reseek",
        }
    }
}

/// Sliding cache over a store's row sequence.
#[derive(Debug, Clone)]
pub struct Window<R> {
    items: VecDeque<R>,
    /// Flat index of `items[0]`
    offset: u64,
    page_size: u64,
    /// Last fetch failed; adjacency is not trusted until a reseek
    stale: bool,
    stats: WindowStats,
}

impl<R: Clone + Send> Window<R> {
    /// Create an empty window. `page_size` is at least 1.
    pub fn new(page_size: usize) -> Self {
        Self {
            items: VecDeque::new(),
            offset: 0,
            page_size: page_size.max(1) as u64,
            stale: false,
            stats: WindowStats::default(),
        }
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Flat index of the first cached row
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Flat indices currently cached
    pub fn range(&self) -> Range<u64> {
        self.offset..self.end()
    }

    /// Cached rows in order
    pub fn items(&self) -> impl Iterator<Item = &R> {
        self.items.iter()
    }

    pub fn stats(&self) -> WindowStats {
        self.stats
    }

    /// Drop all cached rows.
    pub fn clear(&mut self) {
        self.items.clear();
        self.offset = 0;
        self.stale = false;
    }

    /// Row at `flat`, fetching from the store on a miss.
    ///
    /// `None` when `flat` is past the end of the sequence.
    pub async fn get<S>(&mut self, store: &S, query: &StoreQuery<'_>, flat: u64) -> Result<Option<R>, StoreError>
    where
        S: RecordStore<R> + ?Sized,
    {
        if self.range().contains(&flat) {
            self.stats.hits += 1;
            metrics::record_window_hit();
            return Ok(self.cached(flat));
        }

        self.stats.misses += 1;
        let plan = self.plan(flat);
        let (start, limit) = plan.range();

        let rows = match store.fetch_page(query, start, limit).await {
            Ok(rows) => rows,
            Err(e) => {
                self.stats.failures += 1;
                self.stale = true;
                warn!(path = plan.name(), start, limit, error = %e, "Window fetch failed");
                metrics::record_store_error("fetch_page");
                return Err(e);
            }
        };

        self.stats.fetches += 1;
        metrics::record_window_fetch(plan.name(), rows.len());
        self.apply(plan, rows);
        self.stale = false;
        debug!(
            path = plan.name(),
            flat,
            start,
            limit,
            offset = self.offset,
            len = self.items.len(),
            "Window moved"
        );

        Ok(self.cached(flat))
    }

    fn end(&self) -> u64 {
        self.offset + self.items.len() as u64
    }

    fn cached(&self, flat: u64) -> Option<R> {
        let idx = usize::try_from(flat.checked_sub(self.offset)?).ok()?;
        self.items.get(idx).cloned()
    }

    fn plan(&self, flat: u64) -> Plan {
        let page = self.page_size;
        let len = self.items.len() as u64;

        if !self.stale && self.offset > 0 && flat == self.offset - 1 {
            return Plan::Backward {
                start: self.offset.saturating_sub(page),
                limit: page.min(self.offset),
            };
        }
        if !self.stale && flat == self.end() {
            return Plan::Forward {
                trim: len.saturating_sub(page),
                start: flat,
                limit: if flat == 0 { 2 * page } else { page },
            };
        }
        Plan::Reseek {
            start: flat / page * page,
            limit: 2 * page,
        }
    }

    fn apply(&mut self, plan: Plan, rows: Vec<R>) {
        let max = 2 * self.page_size as usize;

        match plan {
            Plan::Backward { start, limit } if rows.len() as u64 == limit => {
                for row in rows.into_iter().rev() {
                    self.items.push_front(row);
                }
                self.offset = start;
                self.items.truncate(max);
            }
            Plan::Forward { trim, .. } => {
                self.items.drain(..trim as usize);
                self.offset += trim;
                self.items.extend(rows);
            }
            // Short backward page: the sequence shifted under us, so the
            // rows no longer abut the window. Keep only what was fetched.
            Plan::Backward { start, .. } | Plan::Reseek { start, .. } => {
                self.items = rows.into();
                self.offset = start;
                self.items.truncate(max);
            }
        }
    }
}
