// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the full stack on a temp SQLite database: the
//! store with its change feed, the metrics maintainer, and the reader, all
//! driven by a [`FixedClock`]. Change records are not consumed in the
//! background; tests call [`TestHarness::drain_feed`] to process them. The
//! feed holds 1024 records, and writes beyond that wait for a drain.

use std::sync::Arc;

use packdesk_config::{CacheConfig, GatewayConfig, StorageConfig};
use packdesk_core::{ChangeRecord, MetricsCache, Order, OrderStore, PackdeskError};
use packdesk_metrics::{BatchReport, CustomerReader, MetricsMaintainer, ReaderOptions};
use packdesk_storage::SqliteStore;
use tokio::sync::{Mutex, mpsc};

use crate::clock::FixedClock;

const FEED_CAPACITY: usize = 1024;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    cache: CacheConfig,
    gateway: GatewayConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            cache: CacheConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }

    /// Cache lifetime in days.
    pub fn with_ttl_days(mut self, days: u32) -> Self {
        self.cache.ttl_days = days;
        self
    }

    /// Whether single-customer reads write back after a miss.
    pub fn with_populate_on_miss(mut self, populate: bool) -> Self {
        self.cache.populate_on_miss = populate;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, PackdeskError> {
        let temp_dir = tempfile::TempDir::new().map_err(PackdeskError::storage)?;
        let db_path = temp_dir.path().join("packdesk-test.db");

        let storage = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        };
        let clock = Arc::new(FixedClock::default());
        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        let store = Arc::new(
            SqliteStore::open(&storage)
                .await?
                .with_clock(clock.clone())
                .with_change_feed(tx),
        );

        let maintainer = Arc::new(MetricsMaintainer::new(
            store.clone(),
            store.clone(),
            clock.clone(),
            self.cache.ttl(),
        ));
        let reader = Arc::new(CustomerReader::new(
            store.clone(),
            Some(store.clone() as Arc<dyn MetricsCache>),
            clock.clone(),
            ReaderOptions::from_config(&self.cache, &self.gateway),
        ));

        Ok(TestHarness {
            store,
            clock,
            maintainer,
            reader,
            feed: Mutex::new(rx),
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a temp database.
pub struct TestHarness {
    /// Orders collection and metrics cache (temp DB, cleaned up on drop).
    pub store: Arc<SqliteStore>,
    pub clock: Arc<FixedClock>,
    pub maintainer: Arc<MetricsMaintainer>,
    pub reader: Arc<CustomerReader>,
    feed: Mutex<mpsc::Receiver<ChangeRecord>>,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Write orders through the store, emitting change records.
    pub async fn put_orders(&self, orders: &[Order]) -> Result<(), PackdeskError> {
        for order in orders {
            self.store.put_order(order).await?;
        }
        Ok(())
    }

    /// Change records emitted so far and not yet drained.
    pub async fn pending_records(&self) -> Vec<ChangeRecord> {
        let mut feed = self.feed.lock().await;
        let mut records = Vec::new();
        while let Ok(record) = feed.try_recv() {
            records.push(record);
        }
        records
    }

    /// Process every pending change record as one batch.
    pub async fn drain_feed(&self) -> BatchReport {
        let records = self.pending_records().await;
        self.maintainer.process_batch(&records).await
    }
}
