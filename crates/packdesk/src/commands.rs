// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot CLI commands. Results go to stdout as pretty JSON; logs go to stderr.

use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;

use packdesk_config::PackdeskConfig;
use packdesk_core::{ChangeBatch, MetricsCache, Order, OrderStore, PackdeskError, Segment};
use packdesk_metrics::{BatchReport, CustomerFilter, RefreshOutcome};
use serde::Serialize;
use tracing::info;

use crate::stack::Stack;

fn print_json<T: Serialize>(value: &T) -> Result<(), PackdeskError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_file(path: &Path) -> Result<String, PackdeskError> {
    std::fs::read_to_string(path).map_err(|e| {
        PackdeskError::Internal(format!("failed to read {}: {e}", path.display()))
    })
}

/// Parse orders from either a JSON array or one JSON document per line.
pub fn parse_orders(content: &str) -> Result<Vec<Order>, PackdeskError> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_str(line).map_err(PackdeskError::from))
        .collect()
}

/// `packdesk ingest <file>`
pub async fn ingest(config: &PackdeskConfig, file: &Path) -> Result<(), PackdeskError> {
    let batch: ChangeBatch = serde_json::from_str(&read_file(file)?)?;
    let stack = Stack::open(config, None).await?;
    let report = stack.require_maintainer()?.process_batch(&batch.records).await;
    print_report(&report)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportSummary {
    imported_orders: usize,
    skipped_without_contact: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh: Option<BatchReportView>,
}

#[derive(Serialize)]
struct BatchReportView {
    message: String,
    #[serde(flatten)]
    report: BatchReport,
}

fn print_report(report: &BatchReport) -> Result<(), PackdeskError> {
    print_json(&BatchReportView {
        message: report.message(),
        report: report.clone(),
    })
}

/// `packdesk import-orders <file>`
///
/// Writes every order, then refreshes each affected customer once.
pub async fn import_orders(config: &PackdeskConfig, file: &Path) -> Result<(), PackdeskError> {
    let orders = parse_orders(&read_file(file)?)?;
    let stack = Stack::open(config, None).await?;

    let mut customers = BTreeSet::new();
    let mut skipped = 0;
    for order in &orders {
        stack.store.put_order(order).await?;
        match order.contact_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => {
                customers.insert(id.to_string());
            }
            _ => skipped += 1,
        }
    }
    info!(
        orders = orders.len(),
        customers = customers.len(),
        "orders imported"
    );

    let refresh = match &stack.maintainer {
        Some(maintainer) => {
            let records: Vec<_> = orders
                .iter()
                .filter(|o| o.contact_id.is_some())
                .map(packdesk_core::ChangeRecord::insert)
                .collect();
            let report = maintainer.process_batch(&records).await;
            Some(BatchReportView {
                message: report.message(),
                report,
            })
        }
        None => None,
    };

    stack.store.close().await?;
    print_json(&ImportSummary {
        imported_orders: orders.len(),
        skipped_without_contact: skipped,
        refresh,
    })
}

/// `packdesk recompute <contact_id>`
pub async fn recompute(config: &PackdeskConfig, contact_id: &str) -> Result<(), PackdeskError> {
    let stack = Stack::open(config, None).await?;
    match stack.require_maintainer()?.refresh(contact_id).await? {
        RefreshOutcome::Written(record) => print_json(&record),
        RefreshOutcome::NoOrders => Err(PackdeskError::CustomerNotFound {
            contact_id: contact_id.to_string(),
        }),
    }
}

/// `packdesk customer <contact_id>`
pub async fn customer(config: &PackdeskConfig, contact_id: &str) -> Result<(), PackdeskError> {
    let stack = Stack::open(config, None).await?;
    let outcome = stack.reader.get_customer(contact_id).await?;
    info!(cache_hit = ?outcome.cache_hit, elapsed_ms = outcome.elapsed.as_millis() as u64, "customer read");
    print_json(&outcome.data)
}

/// `packdesk customers [--limit] [--search] [--segment]`
pub async fn customers(
    config: &PackdeskConfig,
    limit: Option<usize>,
    search: Option<String>,
    segment: Option<String>,
) -> Result<(), PackdeskError> {
    let segment = segment
        .as_deref()
        .map(|raw| {
            Segment::from_str(raw).map_err(|_| {
                PackdeskError::Config(format!(
                    "unknown segment '{raw}' (expected New, Active, Dormant or VIP)"
                ))
            })
        })
        .transpose()?;
    let filter = CustomerFilter {
        limit,
        search,
        segment,
    };

    let stack = Stack::open(config, None).await?;
    let outcome = stack.reader.list_customers(&filter).await?;
    info!(
        count = outcome.data.len(),
        total = ?outcome.total,
        cache_hit = ?outcome.cache_hit,
        "customers listed"
    );
    print_json(&outcome.data)
}

/// `packdesk customer-orders <contact_id> [--limit]`
pub async fn customer_orders(
    config: &PackdeskConfig,
    contact_id: &str,
    limit: Option<usize>,
) -> Result<(), PackdeskError> {
    let stack = Stack::open(config, None).await?;
    let outcome = stack.reader.customer_orders(contact_id, limit).await?;
    print_json(&outcome.data)
}

/// `packdesk purge-expired`
pub async fn purge_expired(config: &PackdeskConfig) -> Result<(), PackdeskError> {
    let stack = Stack::open(config, None).await?;
    let removed = stack.store.purge_expired().await?;
    stack.store.close().await?;
    info!(removed, "expired cache records purged");
    print_json(&serde_json::json!({ "removed": removed }))
}
