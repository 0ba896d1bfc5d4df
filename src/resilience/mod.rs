// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Connection resilience.
//!
//! Only establishing a store connection is retried. Page and aggregate
//! queries fail straight back to the caller so the list window never
//! applies a half-finished update.

pub mod retry;
