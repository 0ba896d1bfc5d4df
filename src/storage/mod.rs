// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Backing stores the list engine pages over.
//!
//! - [`sql::SqlStore`]: MySQL / SQLite via sqlx
//! - [`memory::MemoryStore`]: in-process, for tests and small datasets

pub mod memory;
pub mod sql;
pub mod traits;
