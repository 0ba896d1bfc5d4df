// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for the list engine.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The host application is responsible for choosing the exporter.
//!
//! # Metric Naming Convention
//! - `list_window_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `path`: hit, backward, forward, reseek
//! - `operation`: fetch_page, count, count_distinct, section_titles

use metrics::{counter, histogram};
use std::time::{Duration, Instant};

/// Record a `get` served from the window without a fetch
pub fn record_window_hit() {
    counter!("list_window_window_hits_total").increment(1);
}

/// Record a window miss and the path taken to fill it
pub fn record_window_fetch(path: &'static str, rows: usize) {
    counter!("list_window_window_fetches_total", "path" => path).increment(1);
    histogram!("list_window_fetch_rows", "path" => path).record(rows as f64);
}

/// Record a section-index query
pub fn record_section_query(operation: &'static str) {
    counter!("list_window_section_queries_total", "operation" => operation).increment(1);
}

/// Record a refresh (window and section state dropped)
pub fn record_refresh() {
    counter!("list_window_refreshes_total").increment(1);
}

/// Record a failed store round trip
pub fn record_store_error(operation: &str) {
    counter!(
        "list_window_store_errors_total",
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Record store round-trip latency
pub fn record_store_latency(operation: &str, duration: Duration) {
    histogram!(
        "list_window_store_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Timer that records store latency when dropped
pub struct LatencyTimer {
    operation: &'static str,
    start: Instant,
}

impl LatencyTimer {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_store_latency(self.operation, self.start.elapsed());
    }
}
