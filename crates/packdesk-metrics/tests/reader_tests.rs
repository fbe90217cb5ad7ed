// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read path behaviour: cache hits, live fallback, filters and ordering.

use std::sync::Arc;

use chrono::Duration;
use packdesk_core::{Clock, MetricsCache, Segment};
use packdesk_metrics::{
    CustomerFilter, CustomerReader, MetricsMaintainer, ReaderOptions, build_metrics_record,
};
use packdesk_test_utils::memory_store::CallCounts;
use packdesk_test_utils::{FixedClock, MemoryStore, OrderBuilder};

async fn seeded_store(clock: Arc<FixedClock>) -> Arc<MemoryStore> {
    let now = clock.now();
    Arc::new(
        MemoryStore::with_orders(
            clock,
            vec![
                OrderBuilder::new("a-1", "c-ann")
                    .name("Ann", "Lee")
                    .company("Kiwi Cartons")
                    .days_before(now, 3)
                    .total(4000.0)
                    .build(),
                OrderBuilder::new("a-2", "c-ann")
                    .name("Ann", "Lee")
                    .company("Kiwi Cartons")
                    .days_before(now, 12)
                    .total(1500.0)
                    .build(),
                OrderBuilder::new("b-1", "c-bo")
                    .name("Bo", "Tane")
                    .days_before(now, 120)
                    .total(300.0)
                    .build(),
                OrderBuilder::new("d-1", "c-dee")
                    .name("Dee", "Park")
                    .email("dee@boxes.example")
                    .days_before(now, 10)
                    .total(300.0)
                    .build(),
                OrderBuilder::new("e-1", "c-eve")
                    .name("Eve", "Ngata")
                    .days_before(now, 45)
                    .total(90.0)
                    .build(),
            ],
        )
        .await,
    )
}

fn reader(store: &Arc<MemoryStore>, clock: Arc<FixedClock>, options: ReaderOptions) -> CustomerReader {
    CustomerReader::new(store.clone(), Some(store.clone() as Arc<dyn MetricsCache>), clock, options)
}

#[tokio::test]
async fn miss_then_hit_returns_identical_customer() {
    let clock = Arc::new(FixedClock::default());
    let store = seeded_store(clock.clone()).await;
    let reader = reader(&store, clock, ReaderOptions::default());

    let miss = reader.get_customer("c-ann").await.unwrap();
    assert_eq!(miss.cache_hit, Some(false));
    assert_eq!(CallCounts::get(&store.calls.put_metrics), 1);

    let hit = reader.get_customer("c-ann").await.unwrap();
    assert_eq!(hit.cache_hit, Some(true));
    assert_eq!(hit.data, miss.data);
    assert_eq!(hit.data.metrics.total_spend, "5500.00");
    assert_eq!(hit.data.metrics.segment, Segment::Vip);
    assert_eq!(hit.data.name, "Ann Lee");
}

#[tokio::test]
async fn populate_on_miss_can_be_disabled() {
    let clock = Arc::new(FixedClock::default());
    let store = seeded_store(clock.clone()).await;
    let options = ReaderOptions {
        populate_on_miss: false,
        ..ReaderOptions::default()
    };
    let reader = reader(&store, clock, options);

    reader.get_customer("c-bo").await.unwrap();
    let again = reader.get_customer("c-bo").await.unwrap();
    assert_eq!(again.cache_hit, Some(false));
    assert_eq!(CallCounts::get(&store.calls.put_metrics), 0);
    assert_eq!(again.data.metrics.segment, Segment::Dormant);
}

#[tokio::test]
async fn cache_read_failure_falls_back_to_orders() {
    let clock = Arc::new(FixedClock::default());
    let store = seeded_store(clock.clone()).await;
    store.fail_cache_reads(true).await;
    let reader = reader(&store, clock, ReaderOptions::default());

    let customer = reader.get_customer("c-dee").await.unwrap();
    assert_eq!(customer.cache_hit, Some(false));
    assert_eq!(customer.data.metrics.order_count, 1);

    let list = reader.list_customers(&CustomerFilter::default()).await.unwrap();
    assert_eq!(list.cache_hit, Some(false));
    assert_eq!(list.total, Some(4));
}

#[tokio::test]
async fn unknown_customer_is_not_found() {
    let clock = Arc::new(FixedClock::default());
    let store = seeded_store(clock.clone()).await;
    let reader = reader(&store, clock, ReaderOptions::default());

    let err = reader.get_customer("c-nobody").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Customer not found: c-nobody");
    assert!(reader.customer_orders("c-nobody", None).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn list_orders_by_spend_then_contact_id() {
    let clock = Arc::new(FixedClock::default());
    let store = seeded_store(clock.clone()).await;
    let reader = reader(&store, clock, ReaderOptions::default());

    let list = reader.list_customers(&CustomerFilter::default()).await.unwrap();
    assert_eq!(list.cache_hit, Some(false));
    let ids: Vec<&str> = list.data.iter().map(|c| c.contact_id.as_str()).collect();
    assert_eq!(ids, vec!["c-ann", "c-bo", "c-dee", "c-eve"]);

    // The live list path never writes the cache.
    assert_eq!(CallCounts::get(&store.calls.put_metrics), 0);
}

#[tokio::test]
async fn list_filters_apply_on_both_paths() {
    let clock = Arc::new(FixedClock::default());
    let store = seeded_store(clock.clone()).await;
    let reader = reader(&store, clock.clone(), ReaderOptions::default());

    let filter = CustomerFilter {
        search: Some("BOXES".into()),
        ..Default::default()
    };
    let live = reader.list_customers(&filter).await.unwrap();
    assert_eq!(live.cache_hit, Some(false));

    let maintainer = MetricsMaintainer::new(store.clone(), store.clone(), clock, Duration::days(90));
    for id in ["c-ann", "c-bo", "c-dee", "c-eve"] {
        maintainer.refresh(id).await.unwrap();
    }
    let cached = reader.list_customers(&filter).await.unwrap();
    assert_eq!(cached.cache_hit, Some(true));
    assert_eq!(cached.data, live.data);
    assert_eq!(cached.data.len(), 1);
    assert_eq!(cached.data[0].contact_id, "c-dee");

    let dormant = CustomerFilter {
        segment: Some(Segment::Dormant),
        ..Default::default()
    };
    let list = reader.list_customers(&dormant).await.unwrap();
    assert_eq!(list.data.len(), 1);
    assert_eq!(list.data[0].contact_id, "c-bo");

    let company = CustomerFilter {
        search: Some("kiwi".into()),
        ..Default::default()
    };
    assert_eq!(reader.list_customers(&company).await.unwrap().data[0].contact_id, "c-ann");
}

#[tokio::test]
async fn list_limit_reports_total_before_truncation() {
    let clock = Arc::new(FixedClock::default());
    let store = seeded_store(clock.clone()).await;
    let options = ReaderOptions {
        default_limit: 3,
        max_limit: 3,
        ..ReaderOptions::default()
    };
    let reader = reader(&store, clock, options);

    let list = reader
        .list_customers(&CustomerFilter {
            limit: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(list.data.len(), 2);
    assert_eq!(list.total, Some(4));

    let capped = reader
        .list_customers(&CustomerFilter {
            limit: Some(50),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(capped.data.len(), 3);
}

#[tokio::test]
async fn expired_cache_records_are_ignored_by_list() {
    let clock = Arc::new(FixedClock::default());
    let store = seeded_store(clock.clone()).await;
    let now = clock.now();
    let stale_orders = [OrderBuilder::new("z", "c-zed").days_before(now, 1).total(1.0).build()];
    let mut stale = build_metrics_record("c-zed", &stale_orders, now, Duration::days(1)).unwrap();
    stale.ttl = now.timestamp();
    store.seed_metrics(stale).await;

    let reader = reader(&store, clock, ReaderOptions::default());
    let list = reader.list_customers(&CustomerFilter::default()).await.unwrap();
    assert_eq!(list.cache_hit, Some(false));
    assert!(list.data.iter().all(|c| c.contact_id != "c-zed"));
}

#[tokio::test]
async fn customer_orders_are_newest_first_and_limited() {
    let clock = Arc::new(FixedClock::default());
    let store = seeded_store(clock.clone()).await;
    let reader = reader(&store, clock, ReaderOptions::default());

    let orders = reader.customer_orders("c-ann", None).await.unwrap();
    assert_eq!(orders.cache_hit, None);
    assert_eq!(orders.total, Some(2));
    let ids: Vec<&str> = orders.data.iter().map(|o| o.order_id.as_str()).collect();
    assert_eq!(ids, vec!["a-1", "a-2"]);

    let limited = reader.customer_orders("c-ann", Some(1)).await.unwrap();
    assert_eq!(limited.data.len(), 1);
    assert_eq!(limited.data[0].order_id, "a-1");
}

#[tokio::test]
async fn reader_without_cache_always_aggregates() {
    let clock = Arc::new(FixedClock::default());
    let store = seeded_store(clock.clone()).await;
    let reader = CustomerReader::new(store.clone(), None, clock, ReaderOptions::default());

    let customer = reader.get_customer("c-eve").await.unwrap();
    assert_eq!(customer.cache_hit, None);
    assert_eq!(CallCounts::get(&store.calls.get_metrics), 0);
    assert_eq!(CallCounts::get(&store.calls.put_metrics), 0);
}
