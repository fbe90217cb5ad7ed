// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory order store and metrics cache for deterministic testing.
//!
//! `MemoryStore` implements both [`OrderStore`] and [`MetricsCache`], honours
//! cache TTLs against an injected [`Clock`], and can be told to fail specific
//! operations so error paths are testable without a broken database.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use packdesk_core::{
    Clock, CustomerMetricsRecord, HealthStatus, MetricsCache, Order, OrderStore, PackdeskError,
    StoreAdapter,
};

use crate::clock::FixedClock;

#[derive(Default)]
struct Failures {
    /// Contact IDs whose order reads fail.
    order_reads: HashSet<String>,
    /// Contact IDs whose cache writes fail.
    cache_writes: HashSet<String>,
    cache_reads: bool,
    order_scans: bool,
}

/// Call counters, for asserting which path a read took.
#[derive(Debug, Default)]
pub struct CallCounts {
    pub orders_for_customer: AtomicUsize,
    pub all_orders: AtomicUsize,
    pub get_metrics: AtomicUsize,
    pub put_metrics: AtomicUsize,
    pub scan_metrics: AtomicUsize,
}

impl CallCounts {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

fn injected(what: &str) -> PackdeskError {
    PackdeskError::storage(std::io::Error::other(format!("injected failure: {what}")))
}

/// In-memory orders collection plus metrics cache.
pub struct MemoryStore {
    orders: Mutex<BTreeMap<String, Order>>,
    metrics: Mutex<BTreeMap<String, CustomerMetricsRecord>>,
    failures: Mutex<Failures>,
    clock: Arc<dyn Clock>,
    pub calls: CallCounts,
}

impl MemoryStore {
    /// Empty store whose cache expiry follows `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            orders: Mutex::new(BTreeMap::new()),
            metrics: Mutex::new(BTreeMap::new()),
            failures: Mutex::new(Failures::default()),
            clock,
            calls: CallCounts::default(),
        }
    }

    /// Store pre-loaded with `orders`.
    pub async fn with_orders(clock: Arc<dyn Clock>, orders: Vec<Order>) -> Self {
        let store = Self::new(clock);
        {
            let mut map = store.orders.lock().await;
            for order in orders {
                map.insert(order.order_id.clone(), order);
            }
        }
        store
    }

    /// Put a cache record directly, bypassing failure injection and counters.
    pub async fn seed_metrics(&self, record: CustomerMetricsRecord) {
        self.metrics
            .lock()
            .await
            .insert(record.contact_id.clone(), record);
    }

    /// Raw cache contents, expired records included.
    pub async fn raw_metrics(&self, contact_id: &str) -> Option<CustomerMetricsRecord> {
        self.metrics.lock().await.get(contact_id).cloned()
    }

    pub async fn metrics_len(&self) -> usize {
        self.metrics.lock().await.len()
    }

    pub async fn fail_order_reads_for(&self, contact_id: &str) {
        self.failures
            .lock()
            .await
            .order_reads
            .insert(contact_id.to_string());
    }

    pub async fn fail_cache_writes_for(&self, contact_id: &str) {
        self.failures
            .lock()
            .await
            .cache_writes
            .insert(contact_id.to_string());
    }

    pub async fn fail_cache_reads(&self, fail: bool) {
        self.failures.lock().await.cache_reads = fail;
    }

    pub async fn fail_order_scans(&self, fail: bool) {
        self.failures.lock().await.order_scans = fail;
    }

    /// Clear every injected failure.
    pub async fn heal(&self) {
        *self.failures.lock().await = Failures::default();
    }

    fn now_epoch(&self) -> i64 {
        self.clock.now().timestamp()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Arc::new(FixedClock::default()))
    }
}

#[async_trait]
impl StoreAdapter for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> Result<HealthStatus, PackdeskError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn put_order(&self, order: &Order) -> Result<(), PackdeskError> {
        self.orders
            .lock()
            .await
            .insert(order.order_id.clone(), order.clone());
        Ok(())
    }

    async fn delete_order(&self, order_id: &str) -> Result<Option<Order>, PackdeskError> {
        Ok(self.orders.lock().await.remove(order_id))
    }

    async fn get_order(&self, order_id: &str) -> Result<Option<Order>, PackdeskError> {
        Ok(self.orders.lock().await.get(order_id).cloned())
    }

    async fn orders_for_customer(&self, contact_id: &str) -> Result<Vec<Order>, PackdeskError> {
        self.calls.orders_for_customer.fetch_add(1, Ordering::SeqCst);
        if self.failures.lock().await.order_reads.contains(contact_id) {
            return Err(injected("orders_for_customer"));
        }
        Ok(self
            .orders
            .lock()
            .await
            .values()
            .filter(|o| o.contact_id.as_deref() == Some(contact_id))
            .cloned()
            .collect())
    }

    async fn all_orders(&self) -> Result<Vec<Order>, PackdeskError> {
        self.calls.all_orders.fetch_add(1, Ordering::SeqCst);
        if self.failures.lock().await.order_scans {
            return Err(injected("all_orders"));
        }
        Ok(self.orders.lock().await.values().cloned().collect())
    }
}

#[async_trait]
impl MetricsCache for MemoryStore {
    async fn get_metrics(
        &self,
        contact_id: &str,
    ) -> Result<Option<CustomerMetricsRecord>, PackdeskError> {
        self.calls.get_metrics.fetch_add(1, Ordering::SeqCst);
        if self.failures.lock().await.cache_reads {
            return Err(injected("get_metrics"));
        }
        let now = self.now_epoch();
        Ok(self
            .metrics
            .lock()
            .await
            .get(contact_id)
            .filter(|r| r.ttl > now)
            .cloned())
    }

    async fn put_metrics(&self, record: &CustomerMetricsRecord) -> Result<(), PackdeskError> {
        self.calls.put_metrics.fetch_add(1, Ordering::SeqCst);
        if self
            .failures
            .lock()
            .await
            .cache_writes
            .contains(&record.contact_id)
        {
            return Err(injected("put_metrics"));
        }
        self.metrics
            .lock()
            .await
            .insert(record.contact_id.clone(), record.clone());
        Ok(())
    }

    async fn scan_metrics(&self) -> Result<Vec<CustomerMetricsRecord>, PackdeskError> {
        self.calls.scan_metrics.fetch_add(1, Ordering::SeqCst);
        if self.failures.lock().await.cache_reads {
            return Err(injected("scan_metrics"));
        }
        let now = self.now_epoch();
        Ok(self
            .metrics
            .lock()
            .await
            .values()
            .filter(|r| r.ttl > now)
            .cloned()
            .collect())
    }

    async fn purge_expired(&self) -> Result<u64, PackdeskError> {
        let now = self.now_epoch();
        let mut metrics = self.metrics.lock().await;
        let before = metrics.len();
        metrics.retain(|_, r| r.ttl > now);
        Ok((before - metrics.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::OrderBuilder;

    #[tokio::test]
    async fn orders_are_grouped_by_contact() {
        let store = MemoryStore::default();
        store
            .put_order(&OrderBuilder::new("o-1", "c-1").build())
            .await
            .unwrap();
        store
            .put_order(&OrderBuilder::new("o-2", "c-2").build())
            .await
            .unwrap();
        let orders = store.orders_for_customer("c-1").await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(CallCounts::get(&store.calls.orders_for_customer), 1);
    }

    #[tokio::test]
    async fn injected_failures_are_scoped_and_healable() {
        let store = MemoryStore::default();
        store.fail_order_reads_for("c-1").await;
        assert!(store.orders_for_customer("c-1").await.is_err());
        assert!(store.orders_for_customer("c-2").await.is_ok());
        store.heal().await;
        assert!(store.orders_for_customer("c-1").await.is_ok());
    }
}
