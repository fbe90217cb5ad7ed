// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metrics cache maintainer.
//!
//! Turns batches of order change records into full per-customer recomputes
//! written to the metrics cache. Records are handled sequentially; a failure
//! for one customer is logged and the batch carries on.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use packdesk_core::{
    ChangeRecord, Clock, CustomerMetricsRecord, MetricsCache, OrderStore, PackdeskError,
};

use crate::aggregate::compute_customer;
use crate::recording;

/// Result of refreshing one customer.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// A new record was computed and written.
    Written(CustomerMetricsRecord),
    /// The customer has no orders; the cache was left untouched.
    NoOrders,
}

/// A customer whose recompute or write failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedCustomer {
    #[serde(rename = "contactID")]
    pub contact_id: String,
    pub error: String,
}

/// Per-batch accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// Customers whose record was written, in processing order.
    #[serde(rename = "processedCustomers")]
    pub processed: Vec<String>,
    /// Records with no usable contact ID.
    pub skipped_malformed: usize,
    /// Records for a customer already handled earlier in the batch.
    pub skipped_duplicate: usize,
    /// Customers with no remaining orders.
    pub skipped_empty: usize,
    pub failed: Vec<FailedCustomer>,
}

impl BatchReport {
    /// One-line summary, e.g. `Processed 3 customers`.
    pub fn message(&self) -> String {
        format!("Processed {} customers", self.processed.len())
    }
}

/// Recomputes customer metrics from the authoritative order store.
pub struct MetricsMaintainer {
    orders: Arc<dyn OrderStore>,
    cache: Arc<dyn MetricsCache>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl MetricsMaintainer {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        cache: Arc<dyn MetricsCache>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            orders,
            cache,
            clock,
            ttl,
        }
    }

    /// Process one batch of change records.
    ///
    /// A customer enters the de-duplication set once its refresh completes,
    /// whether a record was written or the customer had no orders. Failures
    /// are not marked, so a later record for the same customer retries.
    pub async fn process_batch(&self, records: &[ChangeRecord]) -> BatchReport {
        let mut report = BatchReport::default();
        let mut done: HashSet<String> = HashSet::new();

        for (index, record) in records.iter().enumerate() {
            let Some(contact_id) = record.contact_id() else {
                warn!(
                    index,
                    event = %record.kind,
                    event_id = ?record.event_id,
                    "skipping change record without a contact ID"
                );
                report.skipped_malformed += 1;
                recording::record_stream_record("malformed");
                continue;
            };

            if done.contains(&contact_id) {
                debug!(contact_id = %contact_id, "already refreshed in this batch");
                report.skipped_duplicate += 1;
                recording::record_stream_record("duplicate");
                continue;
            }

            match self.refresh(&contact_id).await {
                Ok(RefreshOutcome::Written(_)) => {
                    recording::record_stream_record("processed");
                    report.processed.push(contact_id.clone());
                    done.insert(contact_id);
                }
                Ok(RefreshOutcome::NoOrders) => {
                    recording::record_stream_record("empty");
                    report.skipped_empty += 1;
                    done.insert(contact_id);
                }
                Err(e) => {
                    error!(
                        contact_id = %contact_id,
                        event = %record.kind,
                        event_id = ?record.event_id,
                        error = %e,
                        "failed to refresh customer metrics"
                    );
                    recording::record_stream_record("failed");
                    report.failed.push(FailedCustomer {
                        contact_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            records = records.len(),
            processed = report.processed.len(),
            duplicates = report.skipped_duplicate,
            empty = report.skipped_empty,
            malformed = report.skipped_malformed,
            failed = report.failed.len(),
            "change batch processed"
        );
        report
    }

    /// Recompute one customer from their full order history and write the
    /// result. A customer with no orders is skipped and any existing cache
    /// record is left to expire.
    pub async fn refresh(&self, contact_id: &str) -> Result<RefreshOutcome, PackdeskError> {
        let now = self.clock.now();
        let computed = match compute_customer(self.orders.as_ref(), contact_id, now, self.ttl).await
        {
            Ok(computed) => computed,
            Err(e) => {
                recording::record_recompute("failed");
                return Err(e);
            }
        };

        let Some(record) = computed else {
            debug!(contact_id, "no orders found, skipping cache update");
            recording::record_recompute("no_orders");
            return Ok(RefreshOutcome::NoOrders);
        };

        if let Err(e) = self.cache.put_metrics(&record).await {
            recording::record_recompute("failed");
            return Err(e);
        }

        debug!(
            contact_id,
            segment = %record.segment,
            orders = record.order_count,
            "customer metrics written"
        );
        recording::record_recompute("written");
        Ok(RefreshOutcome::Written(record))
    }
}
