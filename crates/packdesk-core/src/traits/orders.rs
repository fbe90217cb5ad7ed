// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order collection trait.

use async_trait::async_trait;

use crate::error::PackdeskError;
use crate::traits::adapter::StoreAdapter;
use crate::types::Order;

/// The authoritative orders collection.
///
/// Reads by customer are served by a secondary index on `contactID`;
/// `all_orders` is a full-collection enumeration.
#[async_trait]
pub trait OrderStore: StoreAdapter {
    /// Insert or fully replace an order document.
    async fn put_order(&self, order: &Order) -> Result<(), PackdeskError>;

    /// Remove an order, returning its last image if it existed.
    async fn delete_order(&self, order_id: &str) -> Result<Option<Order>, PackdeskError>;

    /// Fetch a single order by ID.
    async fn get_order(&self, order_id: &str) -> Result<Option<Order>, PackdeskError>;

    /// Every order placed by one customer, in no particular order.
    async fn orders_for_customer(&self, contact_id: &str) -> Result<Vec<Order>, PackdeskError>;

    /// Every order in the collection.
    async fn all_orders(&self) -> Result<Vec<Order>, PackdeskError>;
}
