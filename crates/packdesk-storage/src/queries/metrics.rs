// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Customer metrics cache operations.
//!
//! A record is live while its `ttl` is strictly in the future. Reads filter
//! on `now` so an expired record is invisible before the sweeper removes it.

use packdesk_core::{CustomerMetricsRecord, PackdeskError};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

/// Live record for one customer.
pub async fn get_metrics(
    db: &Database,
    contact_id: &str,
    now_epoch: i64,
) -> Result<Option<CustomerMetricsRecord>, PackdeskError> {
    let contact_id = contact_id.to_string();
    let document = db
        .connection()
        .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
            conn.query_row(
                "SELECT document FROM customer_metrics_cache
                 WHERE contact_id = ?1 AND ttl > ?2",
                params![contact_id, now_epoch],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;

    match document {
        Some(doc) => Ok(Some(serde_json::from_str(&doc)?)),
        None => Ok(None),
    }
}

/// Write a record, replacing any previous one for the same customer.
pub async fn put_metrics(db: &Database, record: &CustomerMetricsRecord) -> Result<(), PackdeskError> {
    let document = serde_json::to_string(record)?;
    let contact_id = record.contact_id.clone();
    let ttl = record.ttl;
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO customer_metrics_cache (contact_id, document, ttl)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(contact_id) DO UPDATE SET
                     document = excluded.document,
                     ttl = excluded.ttl",
                params![contact_id, document, ttl],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Every live record.
pub async fn scan_metrics(
    db: &Database,
    now_epoch: i64,
) -> Result<Vec<CustomerMetricsRecord>, PackdeskError> {
    let documents = db
        .connection()
        .call(move |conn| -> Result<Vec<String>, rusqlite::Error> {
            let mut stmt =
                conn.prepare("SELECT document FROM customer_metrics_cache WHERE ttl > ?1")?;
            let rows = stmt.query_map(params![now_epoch], |row| row.get(0))?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)?;

    documents
        .iter()
        .map(|doc| serde_json::from_str(doc).map_err(PackdeskError::from))
        .collect()
}

/// Delete every record whose `ttl` is at or before `now_epoch`.
pub async fn purge_expired(db: &Database, now_epoch: i64) -> Result<u64, PackdeskError> {
    let removed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "DELETE FROM customer_metrics_cache WHERE ttl <= ?1",
                params![now_epoch],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(removed as u64)
}
