// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search text compilation
//!
//! Turns what a user types into the list's search box into a filter the
//! backing store can execute.
//!
//! # Architecture
//!
//! ```text
//! search text
//!     ↓  tokenize
//! [Token]  (bare terms, "quoted terms", alias:value)
//!     ↓  compile (FieldCatalog)
//! Predicate (And of Ors)
//!     ↓  SqlTranslator
//! WHERE clause + positional params
//! ```
//!
//! # Query Language
//!
//! ```text
//! N12345              - Free text across every text field
//! "red barn"          - Quoted free text (spaces kept, never an alias)
//! xc                  - Also matches boolean fields aliased `xc`
//! tail:N12345         - Substring match on the fields behind alias `tail`
//! via:"KSEA"          - Quoted alias value
//! a b                 - Every token must match (AND)
//! ```

mod query_builder;
mod sql_translator;
mod tokenizer;

pub use query_builder::{compile, Filter, Predicate};
pub use sql_translator::{escape_like, SqlDialect, SqlParam, SqlQuery, SqlTranslator};
pub use tokenizer::{tokenize, Token};
