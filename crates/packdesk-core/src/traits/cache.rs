// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Customer metrics cache trait.

use async_trait::async_trait;

use crate::error::PackdeskError;
use crate::traits::adapter::StoreAdapter;
use crate::types::CustomerMetricsRecord;

/// Cache collection of denormalized customer metrics, keyed by contact ID.
///
/// Expiry is the store's job: records whose `ttl` has passed must never be
/// returned by `get_metrics` or `scan_metrics`, whether or not
/// `purge_expired` has physically removed them yet.
#[async_trait]
pub trait MetricsCache: StoreAdapter {
    /// Live record for a customer, if any.
    async fn get_metrics(
        &self,
        contact_id: &str,
    ) -> Result<Option<CustomerMetricsRecord>, PackdeskError>;

    /// Upsert by full replacement.
    async fn put_metrics(&self, record: &CustomerMetricsRecord) -> Result<(), PackdeskError>;

    /// Every live record.
    async fn scan_metrics(&self) -> Result<Vec<CustomerMetricsRecord>, PackdeskError>;

    /// Physically remove expired records, returning how many were removed.
    async fn purge_expired(&self) -> Result<u64, PackdeskError>;
}
