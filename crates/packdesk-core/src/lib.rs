// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Packdesk order back-office.
//!
//! This crate provides the collaborator trait definitions, the error type,
//! and the domain types used throughout the Packdesk workspace. Store
//! backends implement the traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::PackdeskError;
pub use types::{
    ChangeBatch, ChangeKind, ChangeRecord, CustomerMetricsRecord, CustomerWithMetrics,
    HealthStatus, Order, PurchaseFrequency, Segment,
};

// Re-export all collaborator traits at crate root.
pub use traits::{Clock, MetricsCache, OrderStore, StoreAdapter, SystemClock};
