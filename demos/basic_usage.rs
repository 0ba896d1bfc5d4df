// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Basic list-window usage example.
//!
//! Demonstrates:
//! 1. Connecting to an in-memory SQLite logbook
//! 2. Listing flights newest first, one section per year
//! 3. Scrolling through a section
//! 4. Searching by alias and by free text
//! 5. Displaying metrics
//!
//! # Run
//!
//! ```bash
//! cargo run --example basic_usage
//! ```

use list_window::storage::sql::{int_column, text_column};
use list_window::{
    Direction, FieldValue, ListConfig, ListModel, OrderSpec, Record, RecordSchema, SqlRecord,
    SqlStore, StoreError,
};
use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use sqlx::any::AnyRow;

#[derive(Debug, Clone)]
struct Flight {
    id: i64,
    tail: String,
    route: String,
    date: String,
}

impl Record for Flight {
    fn schema() -> RecordSchema {
        RecordSchema::new("flights")
            .primary_key("id")
            .text("tail")
            .text_aliased("route", &["via", "route"])
            .other("date")
    }

    fn value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "tail" => Some(FieldValue::Text(self.tail.clone())),
            "route" => Some(FieldValue::Text(self.route.clone())),
            "date" => Some(FieldValue::Text(self.date.clone())),
            _ => None,
        }
    }
}

impl SqlRecord for Flight {
    fn from_row(row: &AnyRow) -> Result<Self, StoreError> {
        Ok(Flight {
            id: int_column(row, "id")?.unwrap_or_default(),
            tail: text_column(row, "tail")?.unwrap_or_default(),
            route: text_column(row, "route")?.unwrap_or_default(),
            date: text_column(row, "date")?.unwrap_or_default(),
        })
    }
}

const TAILS: [&str; 3] = ["N12345", "C-GABC", "N734SP"];
const ROUTES: [&str; 4] = ["KSEA KPAE", "KBFI KSEA KOLM", "CYVR KBLI", "KPAE KAWO"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder.install().expect("failed to install metrics recorder");

    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    // ─────────────────────────────────────────────────────────────────────────
    // 1. Connect and seed
    // ─────────────────────────────────────────────────────────────────────────
    let config = ListConfig {
        page_size: 8,
        order: Some(OrderSpec::new("date", Direction::Descending)),
        section_expression: Some("strftime('%Y', date)".into()),
        sql_url: Some("sqlite::memory:".into()),
        max_connections: 1,
        ..Default::default()
    };
    let store = SqlStore::<Flight>::connect(&config).await?;
    let pool = store.pool();

    sqlx::query("CREATE TABLE flights (id INTEGER PRIMARY KEY, tail TEXT, route TEXT, date TEXT)")
        .execute(&pool)
        .await?;
    for i in 0..60_i64 {
        let date = format!("{}-{:02}-{:02}", 2021 + i / 20, 1 + (i % 20) / 2, 1 + i % 28);
        sqlx::query("INSERT INTO flights (id, tail, route, date) VALUES (?, ?, ?, ?)")
            .bind(i + 1)
            .bind(TAILS[i as usize % TAILS.len()])
            .bind(ROUTES[i as usize % ROUTES.len()])
            .bind(date)
            .execute(&pool)
            .await?;
    }

    let mut model = ListModel::new(store, &config);

    // ─────────────────────────────────────────────────────────────────────────
    // 2. Sections
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📚 Logbook");
    for section in 0..model.section_count().await? as usize {
        let title = model.section_title(section).await?.unwrap_or_default();
        let rows = model.row_count(section).await?.unwrap_or(0);
        println!("   {}: {} flights", title, rows);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 3. Scroll the newest year
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📜 Newest year");
    let rows = model.row_count(0).await?.unwrap_or(0);
    for row in 0..rows {
        if let Some(flight) = model.get_item(0, row).await? {
            println!("   {:>3}  {}  {:<8} {}", flight.id, flight.date, flight.tail, flight.route);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 4. Search
    // ─────────────────────────────────────────────────────────────────────────
    for text in ["via:KSEA", "C-G", "N734SP via:KPAE"] {
        model.set_search_text(text);
        let mut total = 0;
        for section in 0..model.section_count().await? as usize {
            total += model.row_count(section).await?.unwrap_or(0);
        }
        println!("\n🔍 {:<18} {} flights", text, total);
        if let Some(filter) = model.filter() {
            println!("   WHERE {}", filter.sql.clause);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 5. Metrics
    // ─────────────────────────────────────────────────────────────────────────
    let stats = model.window_stats();
    println!(
        "\n📊 Window: {} hits, {} misses, hit rate {:.0}%",
        stats.hits,
        stats.misses,
        stats.hit_rate() * 100.0
    );
    dump_metrics(&snapshotter);

    Ok(())
}

fn dump_metrics(snapshotter: &Snapshotter) {
    let mut counters = Vec::new();
    let mut histograms = Vec::new();

    for (composite_key, _, _, value) in snapshotter.snapshot().into_vec() {
        let (_, key) = composite_key.into_parts();
        let labels: Vec<_> = key.labels().map(|l| format!("{}={}", l.key(), l.value())).collect();
        let label_str = if labels.is_empty() { String::new() } else { format!("{{{}}}", labels.join(",")) };
        let name = format!("{}{}", key.name(), label_str);

        match value {
            DebugValue::Counter(v) => counters.push((name, v)),
            DebugValue::Gauge(_) => {}
            DebugValue::Histogram(samples) => {
                let count = samples.len();
                let sum: f64 = samples.iter().map(|v| v.into_inner()).sum();
                histograms.push((name, count, sum));
            }
        }
    }
    counters.sort();
    histograms.sort_by(|a, b| a.0.cmp(&b.0));

    println!("   ┌─ Counters");
    for (name, value) in &counters {
        println!("   │  └─ {} = {}", name, value);
    }
    println!("   └─ Histograms");
    for (name, count, sum) in &histograms {
        println!("      └─ {} count={} sum={:.4}", name, count, sum);
    }
}
