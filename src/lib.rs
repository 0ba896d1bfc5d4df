// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! # List Window
//!
//! A windowed, searchable, sectioned list cache that sits between a list
//! control and a SQL-queryable record store.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        ListModel                            │
//! │  • set_search_text() / refresh()                           │
//! │  • section_count(), section_title(), row_count()           │
//! │  • get_item(section, row)                                  │
//! └─────────────────────────────────────────────────────────────┘
//!          │                    │                    │
//!          ▼                    ▼                    ▼
//! ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────┐
//! │  Search         │  │  SectionIndex   │  │  Window         │
//! │  text → Filter  │  │  count, titles  │  │  ≤ 2 pages of   │
//! │  (And of Ors)   │  │  rows/section   │  │  cached rows    │
//! └─────────────────┘  └─────────────────┘  └─────────────────┘
//!          │                    │                    │
//!          └────────────────────┼────────────────────┘
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   RecordStore (trait)                       │
//! │  • SqlStore: MySQL / SQLite via sqlx                       │
//! │  • MemoryStore: in-process                                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use list_window::{
//!     Direction, FieldValue, ListConfig, ListModel, OrderSpec, Record, RecordSchema,
//!     SqlRecord, SqlStore, StoreError,
//! };
//! use list_window::storage::sql::text_column;
//! use sqlx::any::AnyRow;
//!
//! #[derive(Clone)]
//! struct Flight { id: i64, tail: String, date: String }
//!
//! impl Record for Flight {
//!     fn schema() -> RecordSchema {
//!         RecordSchema::new("flights").primary_key("id").text("tail").other("date")
//!     }
//!     fn value(&self, field: &str) -> Option<FieldValue> {
//!         match field {
//!             "tail" => Some(FieldValue::Text(self.tail.clone())),
//!             "date" => Some(FieldValue::Text(self.date.clone())),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! impl SqlRecord for Flight {
//!     fn from_row(row: &AnyRow) -> Result<Self, StoreError> {
//!         Ok(Flight {
//!             id: list_window::storage::sql::int_column(row, "id")?.unwrap_or_default(),
//!             tail: text_column(row, "tail")?.unwrap_or_default(),
//!             date: text_column(row, "date")?.unwrap_or_default(),
//!         })
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), StoreError> {
//!     let config = ListConfig {
//!         sql_url: Some("sqlite:logbook.db".into()),
//!         order: Some(OrderSpec::new("date", Direction::Descending)),
//!         section_expression: Some("strftime('%Y', date)".into()),
//!         ..Default::default()
//!     };
//!
//!     let store = SqlStore::<Flight>::connect(&config).await?;
//!     let mut model = ListModel::new(store, &config);
//!
//!     model.set_search_text("tail:N12345");
//!     for section in 0..model.section_count().await? as usize {
//!         let title = model.section_title(section).await?.unwrap_or_default();
//!         let rows = model.row_count(section).await?.unwrap_or(0);
//!         println!("{title}: {rows} flights");
//!         if let Some(first) = model.get_item(section, 0).await? {
//!             println!("  latest: {}", first.date);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`model`]: The [`ListModel`] facade
//! - [`schema`] / [`catalog`]: Record field declarations and the alias table
//! - [`search`]: Search text → predicate → parameterized WHERE clause
//! - [`sections`]: Section counts, titles and flat index mapping
//! - [`window`]: The sliding row cache
//! - [`storage`]: Backing stores (SQL, Memory)
//! - [`resilience`]: Connection retry

pub mod config;
pub mod schema;
pub mod catalog;
pub mod search;
pub mod sections;
pub mod window;
pub mod model;
pub mod storage;
pub mod resilience;
pub mod metrics;

pub use config::{Direction, ListConfig, OrderSpec};
pub use model::ListModel;
pub use schema::{FieldDef, FieldValue, Record, RecordSchema, ValueKind};
pub use catalog::FieldCatalog;
pub use search::{Filter, Predicate, SqlDialect};
pub use sections::SectionIndex;
pub use window::{Window, WindowStats};
pub use storage::traits::{RecordStore, SectionKey, StoreError, StoreQuery};
pub use storage::memory::MemoryStore;
pub use storage::sql::{SqlRecord, SqlStore};
pub use resilience::retry::RetryConfig;
pub use metrics::LatencyTimer;
