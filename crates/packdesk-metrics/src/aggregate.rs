// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order-history aggregation shared by the cache maintainer and the read path.
//!
//! Both produce a [`CustomerMetricsRecord`] through [`build_metrics_record`],
//! so a cached record and a live computation are field-for-field identical.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use packdesk_core::{CustomerMetricsRecord, Order, OrderStore, PackdeskError};
use packdesk_segment::classify;

/// Round to whole cents.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Sort orders newest first. Orders without a parseable `createdAt` sort last.
pub fn sort_newest_first(orders: &mut [Order]) {
    orders.sort_by_cached_key(|order| std::cmp::Reverse(order.created_at_utc()));
}

/// Aggregate one customer's orders into a full metrics record.
///
/// Returns `None` when there are no orders: a customer without orders has
/// no record, as opposed to a zero-metrics record.
pub fn build_metrics_record(
    contact_id: &str,
    orders: &[Order],
    now: DateTime<Utc>,
    ttl: Duration,
) -> Option<CustomerMetricsRecord> {
    let mut dated: Vec<(Option<DateTime<Utc>>, &Order)> = orders
        .iter()
        .map(|order| (order.created_at_utc(), order))
        .collect();
    dated.sort_by(|a, b| b.0.cmp(&a.0));

    let (last_at, newest) = *dated.first()?;
    let (first_at, oldest) = *dated.last()?;

    let order_count = orders.len() as u64;
    let raw_spend: f64 = orders.iter().map(Order::grand_total).sum();
    // Classify on the exact sum; only the stored value is rounded.
    let segmentation = classify(order_count, raw_spend, last_at, first_at, now);
    let total_spend = round_cents(raw_spend);

    let customer = &newest.customer;
    let field = |value: &Option<String>| value.clone().unwrap_or_default();

    Some(CustomerMetricsRecord {
        contact_id: contact_id.to_string(),
        name: customer.display_name(),
        first_name: field(&customer.first_name),
        last_name: field(&customer.last_name),
        email: field(&customer.email),
        phone: field(&customer.phone),
        company: field(&customer.company),
        account_name: field(&customer.account_name),
        account_code: field(&customer.account_code),
        order_count,
        total_spend,
        first_order_date: first_at.and(oldest.created_at.clone()),
        last_order_date: last_at.and(newest.created_at.clone()),
        last_order_reference: newest.order_reference.clone(),
        segment: segmentation.segment,
        last_order_days_ago: segmentation.last_order_days_ago,
        purchase_frequency: segmentation.purchase_frequency,
        last_updated: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        ttl: (now + ttl).timestamp(),
    })
}

/// Group orders by contact ID. Orders without a contact ID are dropped.
pub fn group_by_customer(orders: Vec<Order>) -> BTreeMap<String, Vec<Order>> {
    let mut groups: BTreeMap<String, Vec<Order>> = BTreeMap::new();
    for order in orders {
        let Some(contact_id) = order
            .contact_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
        else {
            continue;
        };
        groups.entry(contact_id).or_default().push(order);
    }
    groups
}

/// Re-read a customer's full order history and aggregate it.
pub async fn compute_customer(
    orders: &dyn OrderStore,
    contact_id: &str,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<Option<CustomerMetricsRecord>, PackdeskError> {
    let history = orders.orders_for_customer(contact_id).await?;
    Ok(build_metrics_record(contact_id, &history, now, ttl))
}

/// Aggregate every customer in a full order scan.
pub fn build_all_records(
    orders: Vec<Order>,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Vec<CustomerMetricsRecord> {
    group_by_customer(orders)
        .iter()
        .filter_map(|(contact_id, history)| build_metrics_record(contact_id, history, now, ttl))
        .collect()
}
