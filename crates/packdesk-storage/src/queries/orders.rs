// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order document operations.

use packdesk_core::{Order, PackdeskError};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

/// Insert or replace an order. Returns the replaced document, if any.
pub async fn upsert_order(db: &Database, order: &Order) -> Result<Option<Order>, PackdeskError> {
    let document = serde_json::to_string(order)?;
    let order_id = order.order_id.clone();
    let contact_id = order.contact_id.clone();
    let created_at = order.created_at.clone();

    let previous = db
        .connection()
        .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let previous: Option<String> = tx
                .query_row(
                    "SELECT document FROM orders WHERE order_id = ?1",
                    params![order_id],
                    |row| row.get(0),
                )
                .optional()?;
            tx.execute(
                "INSERT INTO orders (order_id, contact_id, created_at, document)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(order_id) DO UPDATE SET
                     contact_id = excluded.contact_id,
                     created_at = excluded.created_at,
                     document = excluded.document",
                params![order_id, contact_id, created_at, document],
            )?;
            tx.commit()?;
            Ok(previous)
        })
        .await
        .map_err(map_tr_err)?;

    previous.map(|doc| decode(&doc)).transpose()
}

/// Delete an order, returning its last document.
pub async fn delete_order(db: &Database, order_id: &str) -> Result<Option<Order>, PackdeskError> {
    let order_id = order_id.to_string();
    let removed = db
        .connection()
        .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let removed: Option<String> = tx
                .query_row(
                    "SELECT document FROM orders WHERE order_id = ?1",
                    params![order_id],
                    |row| row.get(0),
                )
                .optional()?;
            if removed.is_some() {
                tx.execute("DELETE FROM orders WHERE order_id = ?1", params![order_id])?;
            }
            tx.commit()?;
            Ok(removed)
        })
        .await
        .map_err(map_tr_err)?;

    removed.map(|doc| decode(&doc)).transpose()
}

/// Fetch one order by ID.
pub async fn get_order(db: &Database, order_id: &str) -> Result<Option<Order>, PackdeskError> {
    let order_id = order_id.to_string();
    let document = db
        .connection()
        .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
            conn.query_row(
                "SELECT document FROM orders WHERE order_id = ?1",
                params![order_id],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;

    document.map(|doc| decode(&doc)).transpose()
}

/// All orders for one customer, via the contact ID index.
pub async fn orders_for_customer(
    db: &Database,
    contact_id: &str,
) -> Result<Vec<Order>, PackdeskError> {
    let contact_id = contact_id.to_string();
    let documents = db
        .connection()
        .call(move |conn| -> Result<Vec<String>, rusqlite::Error> {
            let mut stmt = conn.prepare("SELECT document FROM orders WHERE contact_id = ?1")?;
            let rows = stmt.query_map(params![contact_id], |row| row.get(0))?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)?;

    documents.iter().map(|doc| decode(doc)).collect()
}

/// Every order in the collection.
pub async fn all_orders(db: &Database) -> Result<Vec<Order>, PackdeskError> {
    let documents = db
        .connection()
        .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
            let mut stmt = conn.prepare("SELECT document FROM orders")?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)?;

    documents.iter().map(|doc| decode(doc)).collect()
}

fn decode(document: &str) -> Result<Order, PackdeskError> {
    Ok(serde_json::from_str(document)?)
}
