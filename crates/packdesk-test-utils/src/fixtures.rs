// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order fixtures.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use packdesk_core::types::{Amount, CustomerSnapshot, OrderTotals};
use packdesk_core::Order;
use serde_json::Map;

/// Fluent builder for [`Order`] documents.
///
/// ```ignore
/// let order = OrderBuilder::new("ORD-1", "c-1").days_before(now, 3).total(120.0).build();
/// ```
#[derive(Debug, Clone)]
pub struct OrderBuilder {
    order: Order,
}

impl OrderBuilder {
    pub fn new(order_id: &str, contact_id: &str) -> Self {
        Self {
            order: Order {
                order_id: order_id.to_string(),
                contact_id: Some(contact_id.to_string()),
                created_at: None,
                order_reference: Some(format!("PP-{order_id}")),
                customer: CustomerSnapshot {
                    first_name: Some("Test".into()),
                    last_name: Some(contact_id.to_string()),
                    email: Some(format!("{contact_id}@example.com")),
                    ..Default::default()
                },
                items: Vec::new(),
                totals: OrderTotals::default(),
                status: Some("submitted".into()),
                extra: Map::new(),
            },
        }
    }

    /// Order without a contact ID.
    pub fn orphan(order_id: &str) -> Self {
        let mut builder = Self::new(order_id, "");
        builder.order.contact_id = None;
        builder
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.order.created_at = Some(at.to_rfc3339_opts(SecondsFormat::Millis, true));
        self
    }

    pub fn days_before(self, now: DateTime<Utc>, days: i64) -> Self {
        self.created_at(now - Duration::days(days))
    }

    /// Raw `createdAt`, for unparseable dates.
    pub fn raw_created_at(mut self, raw: &str) -> Self {
        self.order.created_at = Some(raw.to_string());
        self
    }

    pub fn total(mut self, total: f64) -> Self {
        self.order.totals.total = Some(Amount::Number(total));
        self
    }

    /// Total as a decimal string, the way intake writes it.
    pub fn total_text(mut self, total: &str) -> Self {
        self.order.totals.total = Some(Amount::Text(total.to_string()));
        self
    }

    pub fn name(mut self, first: &str, last: &str) -> Self {
        self.order.customer.first_name = Some(first.to_string());
        self.order.customer.last_name = Some(last.to_string());
        self
    }

    pub fn email(mut self, email: &str) -> Self {
        self.order.customer.email = Some(email.to_string());
        self
    }

    pub fn company(mut self, company: &str) -> Self {
        self.order.customer.company = Some(company.to_string());
        self
    }

    pub fn reference(mut self, reference: &str) -> Self {
        self.order.order_reference = Some(reference.to_string());
        self
    }

    pub fn build(self) -> Order {
        self.order
    }
}
