// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Customer metrics for the Packdesk back-office.
//!
//! This crate provides:
//! - **Aggregation**: order history to a full [`CustomerMetricsRecord`](packdesk_core::CustomerMetricsRecord)
//! - **Maintainer**: change-record batches to per-customer cache recomputes
//! - **Stream consumer**: batching of the in-process change feed
//! - **Reader**: cache-first reads with a live aggregation fallback

pub mod aggregate;
pub mod maintainer;
pub mod reader;
pub mod recording;
pub mod stream;

pub use aggregate::{build_all_records, build_metrics_record, compute_customer};
pub use maintainer::{BatchReport, FailedCustomer, MetricsMaintainer, RefreshOutcome};
pub use reader::{CustomerFilter, CustomerReader, ReadOutcome, ReaderOptions};
pub use recording::register_metrics;
pub use stream::{ConsumerStats, StreamConsumer};
