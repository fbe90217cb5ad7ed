// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! Stores extend the [`StoreAdapter`] base trait and use `#[async_trait]`
//! for dynamic dispatch compatibility.

pub mod adapter;
pub mod cache;
pub mod clock;
pub mod orders;

pub use adapter::StoreAdapter;
pub use cache::MetricsCache;
pub use clock::{Clock, SystemClock};
pub use orders::OrderStore;
