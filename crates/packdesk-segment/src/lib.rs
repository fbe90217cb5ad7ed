// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Customer segmentation for the Packdesk back-office.
//!
//! [`classify`] turns a customer's order count, lifetime spend and first/last
//! order timestamps into a lifecycle [`Segment`](packdesk_core::Segment), the
//! number of whole days since the last order, and a
//! [`PurchaseFrequency`](packdesk_core::PurchaseFrequency) bucket. It is pure
//! and total: the same inputs and the same "now" always give the same answer.
//!
//! Every code path that needs a classification (the cache maintainer and the
//! read-path fallback) calls this one implementation.

pub mod classifier;

pub use classifier::{
    Segmentation, classify, frequency_bucket, purchase_frequency, whole_days_between,
    DORMANT_AFTER_DAYS, MONTHLY_MAX_GAP_DAYS, NEW_WITHIN_DAYS, QUARTERLY_MAX_GAP_DAYS,
    VIP_SPEND_THRESHOLD, WEEKLY_MAX_GAP_DAYS,
};
