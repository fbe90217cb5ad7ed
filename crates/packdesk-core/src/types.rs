// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the stores, the cache maintainer and the read path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

/// Health status reported by store health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Store is fully operational.
    Healthy,
    /// Store is operational but experiencing issues.
    Degraded(String),
    /// Store is not operational.
    Unhealthy(String),
}

/// A customer's lifecycle classification.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum Segment {
    New,
    Active,
    Dormant,
    #[strum(to_string = "VIP")]
    #[serde(rename = "VIP")]
    Vip,
}

/// Bucketed estimate of how often a customer reorders.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum PurchaseFrequency {
    None,
    #[strum(to_string = "One-time")]
    #[serde(rename = "One-time")]
    OneTime,
    Weekly,
    Monthly,
    Quarterly,
    Occasional,
}

// --- Orders ---

/// A monetary amount as it appears on an order: either a JSON number or a decimal string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

impl Amount {
    /// Numeric value of the amount. Unparseable or non-finite values count as zero.
    pub fn value(&self) -> f64 {
        let v = match self {
            Amount::Number(n) => *n,
            Amount::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        };
        if v.is_finite() { v } else { 0.0 }
    }
}

/// Order totals block. Every field is optional in stored documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderTotals {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freight: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freight_description: Option<String>,
    #[serde(default, alias = "tax", skip_serializing_if = "Option::is_none")]
    pub gst: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Amount>,
}

/// Customer details captured on the order at intake time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(default, rename = "firstName", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, rename = "lastName", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_code: Option<String>,
}

impl CustomerSnapshot {
    /// Display name: `contact_name` when present, otherwise first and last name joined.
    pub fn display_name(&self) -> String {
        match self.contact_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!(
                "{} {}",
                self.first_name.as_deref().unwrap_or(""),
                self.last_name.as_deref().unwrap_or("")
            )
            .trim()
            .to_string(),
        }
    }
}

/// A single order line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub product_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_price: Option<Amount>,
}

/// An order document as stored in the orders collection.
///
/// Attributes this crate does not interpret (delivery, payment, ...) are kept
/// in `extra` so a document survives a read-modify-write unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "orderID")]
    pub order_id: String,
    #[serde(default, rename = "contactID", skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<String>,
    #[serde(default, rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_reference: Option<String>,
    #[serde(default)]
    pub customer: CustomerSnapshot,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub totals: OrderTotals,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Order {
    /// Parsed creation time. `None` when absent or not RFC 3339.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.created_at.as_deref()?)
    }

    /// Grand total, with missing or non-numeric totals counted as zero.
    pub fn grand_total(&self) -> f64 {
        self.totals.total.as_ref().map(Amount::value).unwrap_or(0.0)
    }
}

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// --- Change records ---

/// Operation kind carried by an order change record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Modify,
    Remove,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Before/after images of the changed order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeImages {
    #[serde(default, rename = "NewImage", skip_serializing_if = "Option::is_none")]
    pub new_image: Option<Value>,
    #[serde(default, rename = "OldImage", skip_serializing_if = "Option::is_none")]
    pub old_image: Option<Value>,
}

/// One record of the orders change stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    #[serde(default, rename = "eventID", skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, rename = "eventName")]
    pub kind: ChangeKind,
    #[serde(default, rename = "dynamodb")]
    pub images: ChangeImages,
}

impl ChangeRecord {
    /// Record for a newly written order.
    pub fn insert(order: &Order) -> Self {
        Self::with_image(ChangeKind::Insert, order)
    }

    /// Record for an order that replaced an existing document.
    pub fn modify(order: &Order) -> Self {
        Self::with_image(ChangeKind::Modify, order)
    }

    /// Record for a removed order, carrying its last image.
    pub fn remove(order: &Order) -> Self {
        Self::with_image(ChangeKind::Remove, order)
    }

    fn with_image(kind: ChangeKind, order: &Order) -> Self {
        let image = serde_json::to_value(order).ok();
        let images = match kind {
            ChangeKind::Remove => ChangeImages {
                new_image: None,
                old_image: image,
            },
            _ => ChangeImages {
                new_image: image,
                old_image: None,
            },
        };
        Self {
            event_id: None,
            kind,
            images,
        }
    }

    /// The customer this record concerns.
    ///
    /// Inserts and modifications read the new image, removals the old one.
    /// Returns `None` for unknown kinds, missing images or an empty contact ID.
    pub fn contact_id(&self) -> Option<String> {
        let image = match self.kind {
            ChangeKind::Insert | ChangeKind::Modify => self.images.new_image.as_ref(),
            ChangeKind::Remove => self.images.old_image.as_ref(),
            ChangeKind::Unknown => None,
        }?;
        attribute_string(image, "contactID")
    }
}

/// Read a string attribute from an image in either plain (`"c-1"`) or typed
/// attribute-value (`{"S": "c-1"}`) form.
fn attribute_string(image: &Value, name: &str) -> Option<String> {
    let raw = match image.get(name)? {
        Value::String(s) => s.as_str(),
        Value::Object(typed) => typed.get("S")?.as_str()?,
        _ => return None,
    };
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// A batch of change records as delivered by the stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeBatch {
    #[serde(default, rename = "Records")]
    pub records: Vec<ChangeRecord>,
}

// --- Customer metrics ---

/// Denormalized per-customer metrics, one per contact ID in the cache collection.
///
/// Always written as a whole; never patched field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerMetricsRecord {
    #[serde(rename = "contactID")]
    pub contact_id: String,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub account_name: String,
    pub account_code: String,
    pub order_count: u64,
    pub total_spend: f64,
    pub first_order_date: Option<String>,
    pub last_order_date: Option<String>,
    pub last_order_reference: Option<String>,
    pub segment: Segment,
    pub last_order_days_ago: Option<i64>,
    pub purchase_frequency: PurchaseFrequency,
    pub last_updated: String,
    /// Expiry instant in epoch seconds.
    pub ttl: i64,
}

/// Metrics block of the read-path response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerMetrics {
    pub order_count: u64,
    /// Two-decimal string, e.g. `"6500.00"`.
    pub total_spend: String,
    pub last_order_date: Option<String>,
    pub last_order_reference: Option<String>,
    pub segment: Segment,
    pub last_order_days_ago: Option<i64>,
    pub purchase_frequency: PurchaseFrequency,
}

/// A customer with their metrics, as served to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerWithMetrics {
    #[serde(rename = "contactID")]
    pub contact_id: String,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub account_name: String,
    pub account_code: String,
    pub metrics: CustomerMetrics,
}

impl From<&CustomerMetricsRecord> for CustomerWithMetrics {
    fn from(record: &CustomerMetricsRecord) -> Self {
        Self {
            contact_id: record.contact_id.clone(),
            name: record.name.clone(),
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
            company: record.company.clone(),
            account_name: record.account_name.clone(),
            account_code: record.account_code.clone(),
            metrics: CustomerMetrics {
                order_count: record.order_count,
                total_spend: format!("{:.2}", record.total_spend),
                last_order_date: record.last_order_date.clone(),
                last_order_reference: record.last_order_reference.clone(),
                segment: record.segment,
                last_order_days_ago: record.last_order_days_ago,
                purchase_frequency: record.purchase_frequency,
            },
        }
    }
}
