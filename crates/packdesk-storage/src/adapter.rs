// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the order store and the metrics cache.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use packdesk_config::StorageConfig;
use packdesk_core::{
    ChangeRecord, Clock, CustomerMetricsRecord, HealthStatus, MetricsCache, Order, OrderStore,
    PackdeskError, StoreAdapter, SystemClock,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed orders collection and metrics cache in one database.
///
/// When a change feed is attached, every order write and delete emits a
/// [`ChangeRecord`] carrying the affected image, the way a table stream would.
pub struct SqliteStore {
    db: Database,
    clock: Arc<dyn Clock>,
    feed: Option<mpsc::Sender<ChangeRecord>>,
}

impl SqliteStore {
    /// Open the database described by `config`.
    pub async fn open(config: &StorageConfig) -> Result<Self, PackdeskError> {
        let db = Database::open(&config.database_path, config.wal_mode).await?;
        debug!(path = %config.database_path, "SQLite store initialized");
        Ok(Self {
            db,
            clock: Arc::new(SystemClock),
            feed: None,
        })
    }

    /// Use `clock` to decide which cache records have expired.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Emit change records for order writes into `tx`. Writes wait for
    /// capacity when the feed is full.
    pub fn with_change_feed(mut self, tx: mpsc::Sender<ChangeRecord>) -> Self {
        self.feed = Some(tx);
        self
    }

    /// Checkpoint the WAL before shutdown.
    pub async fn close(&self) -> Result<(), PackdeskError> {
        self.db.checkpoint().await
    }

    fn now_epoch(&self) -> i64 {
        self.clock.now().timestamp()
    }

    /// Hand `record` to the change feed. A full feed holds the writer until
    /// the consumer frees a slot, so no committed change goes unrecomputed.
    async fn emit(&self, record: ChangeRecord) {
        let Some(feed) = &self.feed else {
            return;
        };
        let record = match feed.try_send(record) {
            Ok(()) => return,
            Err(TrySendError::Full(record)) => record,
            Err(TrySendError::Closed(_)) => {
                debug!("change feed closed, record not emitted");
                return;
            }
        };
        warn!(
            event = %record.kind,
            contact_id = ?record.contact_id(),
            "change feed full, waiting for consumer"
        );
        if feed.send(record).await.is_err() {
            debug!("change feed closed, record not emitted");
        }
    }
}

#[async_trait]
impl StoreAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn health_check(&self) -> Result<HealthStatus, PackdeskError> {
        match self.db.ping().await {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }
}

#[async_trait]
impl OrderStore for SqliteStore {
    async fn put_order(&self, order: &Order) -> Result<(), PackdeskError> {
        let previous = queries::orders::upsert_order(&self.db, order).await?;
        let record = match previous {
            Some(_) => ChangeRecord::modify(order),
            None => ChangeRecord::insert(order),
        };
        self.emit(record).await;
        Ok(())
    }

    async fn delete_order(&self, order_id: &str) -> Result<Option<Order>, PackdeskError> {
        let removed = queries::orders::delete_order(&self.db, order_id).await?;
        if let Some(order) = &removed {
            self.emit(ChangeRecord::remove(order)).await;
        }
        Ok(removed)
    }

    async fn get_order(&self, order_id: &str) -> Result<Option<Order>, PackdeskError> {
        queries::orders::get_order(&self.db, order_id).await
    }

    async fn orders_for_customer(&self, contact_id: &str) -> Result<Vec<Order>, PackdeskError> {
        queries::orders::orders_for_customer(&self.db, contact_id).await
    }

    async fn all_orders(&self) -> Result<Vec<Order>, PackdeskError> {
        queries::orders::all_orders(&self.db).await
    }
}

#[async_trait]
impl MetricsCache for SqliteStore {
    async fn get_metrics(
        &self,
        contact_id: &str,
    ) -> Result<Option<CustomerMetricsRecord>, PackdeskError> {
        queries::metrics::get_metrics(&self.db, contact_id, self.now_epoch()).await
    }

    async fn put_metrics(&self, record: &CustomerMetricsRecord) -> Result<(), PackdeskError> {
        queries::metrics::put_metrics(&self.db, record).await
    }

    async fn scan_metrics(&self) -> Result<Vec<CustomerMetricsRecord>, PackdeskError> {
        queries::metrics::scan_metrics(&self.db, self.now_epoch()).await
    }

    async fn purge_expired(&self) -> Result<u64, PackdeskError> {
        queries::metrics::purge_expired(&self.db, self.now_epoch()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use packdesk_core::types::{CustomerSnapshot, OrderTotals};
    use packdesk_core::{ChangeKind, PurchaseFrequency, Segment};
    use std::sync::Mutex;
    use tempfile::{TempDir, tempdir};
    use tracing_test::traced_test;

    struct StepClock(Mutex<DateTime<Utc>>);

    impl Clock for StepClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn epoch(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    async fn open_store(dir: &TempDir) -> SqliteStore {
        let config = StorageConfig {
            database_path: dir.path().join("store.db").to_string_lossy().into_owned(),
            wal_mode: true,
        };
        SqliteStore::open(&config).await.unwrap()
    }

    fn order(order_id: &str, contact_id: &str, total: &str) -> Order {
        serde_json::from_value(serde_json::json!({
            "orderID": order_id,
            "contactID": contact_id,
            "createdAt": "2026-02-01T09:30:00.000Z",
            "customer": {"contact_name": "Ann Lee"},
            "totals": {"total": total},
        }))
        .unwrap()
    }

    fn metrics_record(contact_id: &str, ttl: i64) -> CustomerMetricsRecord {
        CustomerMetricsRecord {
            contact_id: contact_id.into(),
            name: "Ann Lee".into(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: String::new(),
            company: String::new(),
            account_name: String::new(),
            account_code: String::new(),
            order_count: 1,
            total_spend: 99.0,
            first_order_date: None,
            last_order_date: None,
            last_order_reference: None,
            segment: Segment::New,
            last_order_days_ago: Some(0),
            purchase_frequency: PurchaseFrequency::OneTime,
            last_updated: "2026-02-01T00:00:00Z".into(),
            ttl,
        }
    }

    #[tokio::test]
    async fn health_check_reports_healthy() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
        assert_eq!(store.name(), "sqlite");
    }

    #[tokio::test]
    async fn order_round_trip_through_index() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;

        store.put_order(&order("o-1", "c-1", "10.00")).await.unwrap();
        store.put_order(&order("o-2", "c-1", "20.00")).await.unwrap();
        store.put_order(&order("o-3", "c-2", "30.00")).await.unwrap();

        let mine = store.orders_for_customer("c-1").await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|o| o.contact_id.as_deref() == Some("c-1")));
        assert_eq!(store.all_orders().await.unwrap().len(), 3);
        assert!(store.orders_for_customer("c-9").await.unwrap().is_empty());

        let fetched = store.get_order("o-3").await.unwrap().unwrap();
        assert_eq!(fetched.grand_total(), 30.0);
    }

    #[tokio::test]
    async fn put_replaces_whole_document() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;

        store.put_order(&order("o-1", "c-1", "10.00")).await.unwrap();
        let mut moved = order("o-1", "c-2", "15.00");
        moved.customer = CustomerSnapshot::default();
        moved.totals = OrderTotals {
            total: Some(packdesk_core::types::Amount::Number(15.0)),
            ..Default::default()
        };
        store.put_order(&moved).await.unwrap();

        assert!(store.orders_for_customer("c-1").await.unwrap().is_empty());
        let fetched = store.get_order("o-1").await.unwrap().unwrap();
        assert_eq!(fetched.contact_id.as_deref(), Some("c-2"));
        assert_eq!(fetched.grand_total(), 15.0);
    }

    #[tokio::test]
    async fn change_feed_emits_insert_modify_remove() {
        let dir = tempdir().unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        let store = open_store(&dir).await.with_change_feed(tx);

        store.put_order(&order("o-1", "c-1", "10.00")).await.unwrap();
        store.put_order(&order("o-1", "c-1", "12.00")).await.unwrap();
        let removed = store.delete_order("o-1").await.unwrap();
        assert!(removed.is_some());
        assert!(store.delete_order("o-1").await.unwrap().is_none());

        let kinds: Vec<ChangeKind> = (0..3).map(|_| rx.try_recv().unwrap().kind).collect();
        assert_eq!(
            kinds,
            vec![ChangeKind::Insert, ChangeKind::Modify, ChangeKind::Remove]
        );
        assert!(rx.try_recv().is_err(), "deleting a missing order emits nothing");
    }

    #[tokio::test]
    async fn remove_record_carries_old_image() {
        let dir = tempdir().unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        let store = open_store(&dir).await.with_change_feed(tx);

        store.put_order(&order("o-1", "c-7", "10.00")).await.unwrap();
        store.delete_order("o-1").await.unwrap();
        let _insert = rx.try_recv().unwrap();
        let remove = rx.try_recv().unwrap();
        assert!(remove.images.new_image.is_none());
        assert_eq!(remove.contact_id().as_deref(), Some("c-7"));
    }

    #[tokio::test]
    #[traced_test]
    async fn full_change_feed_holds_the_writer_until_drained() {
        let dir = tempdir().unwrap();
        let (tx, mut rx) = mpsc::channel(1);
        let store = Arc::new(open_store(&dir).await.with_change_feed(tx));

        store.put_order(&order("o-1", "c-1", "1")).await.unwrap();
        let writer = tokio::spawn({
            let store = store.clone();
            async move { store.put_order(&order("o-2", "c-2", "2")).await }
        });

        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        assert!(!writer.is_finished());
        assert!(logs_contain("change feed full, waiting for consumer"));

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        writer.await.unwrap().unwrap();

        assert_eq!(first.contact_id().as_deref(), Some("c-1"));
        assert_eq!(second.contact_id().as_deref(), Some("c-2"));
        assert_eq!(store.all_orders().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn expired_metrics_are_invisible_then_purged() {
        let dir = tempdir().unwrap();
        let clock = Arc::new(StepClock(Mutex::new(epoch(1_000))));
        let store = open_store(&dir).await.with_clock(clock.clone());

        store.put_metrics(&metrics_record("c-live", 5_000)).await.unwrap();
        store.put_metrics(&metrics_record("c-old", 2_000)).await.unwrap();
        assert_eq!(store.scan_metrics().await.unwrap().len(), 2);

        *clock.0.lock().unwrap() = epoch(2_000);
        assert!(store.get_metrics("c-old").await.unwrap().is_none());
        assert!(store.get_metrics("c-live").await.unwrap().is_some());
        let live = store.scan_metrics().await.unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].contact_id, "c-live");

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.purge_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn put_metrics_replaces_previous_record() {
        let dir = tempdir().unwrap();
        let clock = Arc::new(StepClock(Mutex::new(epoch(1_000))));
        let store = open_store(&dir).await.with_clock(clock);

        store.put_metrics(&metrics_record("c-1", 9_000)).await.unwrap();
        let mut updated = metrics_record("c-1", 9_500);
        updated.order_count = 4;
        updated.segment = Segment::Active;
        store.put_metrics(&updated).await.unwrap();

        let fetched = store.get_metrics("c-1").await.unwrap().unwrap();
        assert_eq!(fetched, updated);
        assert_eq!(store.scan_metrics().await.unwrap().len(), 1);
    }
}
