// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cache-aware read path for customers.
//!
//! Every read tries the metrics cache first and falls back to aggregating
//! the order store on a miss or a cache failure. Both paths go through the
//! same aggregation and reshaping, so the output is identical either way;
//! only [`ReadOutcome::cache_hit`] tells them apart.

use std::sync::Arc;
use std::time::{Duration, Instant};

use packdesk_config::{CacheConfig, GatewayConfig};
use packdesk_core::{
    Clock, CustomerMetricsRecord, CustomerWithMetrics, MetricsCache, Order, OrderStore,
    PackdeskError, Segment,
};
use tracing::{debug, warn};

use crate::aggregate::{build_all_records, compute_customer, sort_newest_first};
use crate::recording;

/// Tunables for [`CustomerReader`].
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Write the computed record back after a single-customer miss.
    pub populate_on_miss: bool,
    /// Lifetime given to records computed on the read path.
    pub ttl: chrono::Duration,
    /// Reads slower than this are logged.
    pub slow_query: Duration,
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default(), &GatewayConfig::default())
    }
}

impl ReaderOptions {
    pub fn from_config(cache: &CacheConfig, gateway: &GatewayConfig) -> Self {
        Self {
            populate_on_miss: cache.populate_on_miss,
            ttl: cache.ttl(),
            slow_query: gateway.slow_query(),
            default_limit: gateway.default_list_limit,
            max_limit: gateway.max_list_limit,
        }
    }

    /// Effective limit: the default when absent or zero, capped at the maximum.
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        match requested {
            None | Some(0) => self.default_limit,
            Some(n) => n,
        }
        .min(self.max_limit)
    }
}

/// Filters for [`CustomerReader::list_customers`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerFilter {
    pub limit: Option<usize>,
    /// Case-insensitive substring over name, email and company.
    pub search: Option<String>,
    pub segment: Option<Segment>,
}

impl CustomerFilter {
    fn matches(&self, record: &CustomerMetricsRecord) -> bool {
        if let Some(segment) = self.segment
            && record.segment != segment
        {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                [&record.name, &record.email, &record.company]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            }
            _ => true,
        }
    }
}

/// A read result with its diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOutcome<T> {
    pub data: T,
    /// `Some(true)` when served from the cache. `None` for reads that never consult it.
    pub cache_hit: Option<bool>,
    /// Matches before the limit was applied, for list reads.
    pub total: Option<usize>,
    pub elapsed: Duration,
}

/// Read-through access to customer metrics.
pub struct CustomerReader {
    orders: Arc<dyn OrderStore>,
    cache: Option<Arc<dyn MetricsCache>>,
    clock: Arc<dyn Clock>,
    options: ReaderOptions,
}

impl CustomerReader {
    /// `cache` is `None` when the cache collection is not configured; every
    /// read then aggregates from orders.
    pub fn new(
        orders: Arc<dyn OrderStore>,
        cache: Option<Arc<dyn MetricsCache>>,
        clock: Arc<dyn Clock>,
        options: ReaderOptions,
    ) -> Self {
        Self {
            orders,
            cache,
            clock,
            options,
        }
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// One customer with metrics. A customer with no orders is not found.
    pub async fn get_customer(
        &self,
        contact_id: &str,
    ) -> Result<ReadOutcome<CustomerWithMetrics>, PackdeskError> {
        let started = Instant::now();

        if let Some(cache) = &self.cache {
            match cache.get_metrics(contact_id).await {
                Ok(Some(record)) => {
                    debug!(contact_id, "cache hit");
                    recording::record_cache_lookup(true);
                    return Ok(self.finish(
                        "get_customer",
                        started,
                        CustomerWithMetrics::from(&record),
                        Some(true),
                        None,
                    ));
                }
                Ok(None) => debug!(contact_id, "cache miss"),
                Err(e) => warn!(contact_id, error = %e, "cache lookup failed, using orders"),
            }
            recording::record_cache_lookup(false);
        }

        let now = self.clock.now();
        let record = compute_customer(self.orders.as_ref(), contact_id, now, self.options.ttl)
            .await?
            .ok_or_else(|| PackdeskError::CustomerNotFound {
                contact_id: contact_id.to_string(),
            })?;

        if let Some(cache) = &self.cache
            && self.options.populate_on_miss
            && let Err(e) = cache.put_metrics(&record).await
        {
            warn!(contact_id, error = %e, "failed to populate cache after miss");
        }

        Ok(self.finish(
            "get_customer",
            started,
            CustomerWithMetrics::from(&record),
            self.cache.as_ref().map(|_| false),
            None,
        ))
    }

    /// Customers matching `filter`, highest lifetime spend first.
    ///
    /// The cache serves the list only when a scan succeeds and returns at
    /// least one live record. Otherwise every order is scanned and grouped.
    pub async fn list_customers(
        &self,
        filter: &CustomerFilter,
    ) -> Result<ReadOutcome<Vec<CustomerWithMetrics>>, PackdeskError> {
        let started = Instant::now();

        let cached = match &self.cache {
            Some(cache) => match cache.scan_metrics().await {
                Ok(records) if !records.is_empty() => Some(records),
                Ok(_) => {
                    debug!("cache empty, aggregating orders");
                    None
                }
                Err(e) => {
                    warn!(error = %e, "cache scan failed, aggregating orders");
                    None
                }
            },
            None => None,
        };
        if self.cache.is_some() {
            recording::record_cache_lookup(cached.is_some());
        }

        let cache_hit = self.cache.as_ref().map(|_| cached.is_some());
        let records = match cached {
            Some(records) => records,
            None => {
                let orders = self.orders.all_orders().await?;
                build_all_records(orders, self.clock.now(), self.options.ttl)
            }
        };

        let mut matching: Vec<CustomerMetricsRecord> =
            records.into_iter().filter(|r| filter.matches(r)).collect();
        matching.sort_by(|a, b| {
            b.total_spend
                .total_cmp(&a.total_spend)
                .then_with(|| a.contact_id.cmp(&b.contact_id))
        });
        let total = matching.len();
        matching.truncate(self.options.effective_limit(filter.limit));

        let data = matching.iter().map(CustomerWithMetrics::from).collect();
        Ok(self.finish("list_customers", started, data, cache_hit, Some(total)))
    }

    /// A customer's orders, newest first.
    pub async fn customer_orders(
        &self,
        contact_id: &str,
        limit: Option<usize>,
    ) -> Result<ReadOutcome<Vec<Order>>, PackdeskError> {
        let started = Instant::now();
        let mut orders = self.orders.orders_for_customer(contact_id).await?;
        if orders.is_empty() {
            return Err(PackdeskError::CustomerNotFound {
                contact_id: contact_id.to_string(),
            });
        }

        sort_newest_first(&mut orders);
        let total = orders.len();
        orders.truncate(self.options.effective_limit(limit));
        Ok(self.finish("customer_orders", started, orders, None, Some(total)))
    }

    fn finish<T>(
        &self,
        endpoint: &'static str,
        started: Instant,
        data: T,
        cache_hit: Option<bool>,
        total: Option<usize>,
    ) -> ReadOutcome<T> {
        let elapsed = started.elapsed();
        recording::record_read_latency(endpoint, elapsed);
        if elapsed > self.options.slow_query {
            warn!(
                endpoint,
                elapsed_ms = elapsed.as_millis() as u64,
                "slow query"
            );
        }
        ReadOutcome {
            data,
            cache_hit,
            total,
            elapsed,
        }
    }
}
