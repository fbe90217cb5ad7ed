// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.

use std::str::FromStr;
use std::time::Duration;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use packdesk_core::{ChangeBatch, HealthStatus, PackdeskError, Segment};
use packdesk_metrics::{BatchReport, CustomerFilter, ReadOutcome};
use serde::{Deserialize, Serialize};

use crate::server::AppState;

/// Response envelope shared by every `/v1` endpoint.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

/// Read diagnostics carried in the envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    /// Items returned.
    pub count: usize,
    /// Items matching before the limit was applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    /// Elapsed time, e.g. `"12ms"`.
    pub response_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_hit: Option<bool>,
}

fn format_elapsed(elapsed: Duration) -> String {
    format!("{}ms", elapsed.as_millis())
}

impl<T> Envelope<T> {
    fn ok(outcome: ReadOutcome<T>, count: usize) -> Self {
        let meta = Meta {
            count,
            total: outcome.total,
            response_time: format_elapsed(outcome.elapsed),
            cache_hit: outcome.cache_hit,
        };
        Self {
            success: true,
            data: Some(outcome.data),
            error: None,
            meta: Some(meta),
        }
    }
}

/// An error rendered as a failed envelope.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<PackdeskError> for ApiError {
    fn from(err: PackdeskError) -> Self {
        if err.is_not_found() {
            return Self::new(StatusCode::NOT_FOUND, err.to_string());
        }
        tracing::error!(error = %err, "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body: Envelope<()> = Envelope {
            success: false,
            data: None,
            error: Some(self.message),
            meta: None,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Query parameters for GET /v1/customers.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub segment: Option<String>,
}

impl ListQuery {
    fn into_filter(self) -> Result<CustomerFilter, ApiError> {
        let segment = match self.segment.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(Segment::from_str(raw).map_err(|_| {
                ApiError::new(
                    StatusCode::BAD_REQUEST,
                    format!("unknown segment '{raw}' (expected New, Active, Dormant or VIP)"),
                )
            })?),
        };
        Ok(CustomerFilter {
            limit: self.limit,
            search: self.search,
            segment,
        })
    }
}

/// Query parameters for GET /v1/customers/{contact_id}/orders.
#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// GET /v1/customers
pub async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let filter = query.into_filter()?;
    let outcome = state.reader.list_customers(&filter).await?;
    let count = outcome.data.len();
    Ok(Json(Envelope::ok(outcome, count)).into_response())
}

/// GET /v1/customers/{contact_id}
pub async fn get_customer(
    State(state): State<AppState>,
    Path(contact_id): Path<String>,
) -> Result<Response, ApiError> {
    let outcome = state.reader.get_customer(&contact_id).await?;
    Ok(Json(Envelope::ok(outcome, 1)).into_response())
}

/// GET /v1/customers/{contact_id}/orders
pub async fn get_customer_orders(
    State(state): State<AppState>,
    Path(contact_id): Path<String>,
    Query(query): Query<OrdersQuery>,
) -> Result<Response, ApiError> {
    let outcome = state
        .reader
        .customer_orders(&contact_id, query.limit)
        .await?;
    let count = outcome.data.len();
    Ok(Json(Envelope::ok(outcome, count)).into_response())
}

/// Response body for POST /v1/stream/records.
#[derive(Debug, Serialize)]
pub struct StreamResponse {
    pub message: String,
    #[serde(flatten)]
    pub report: BatchReport,
}

/// POST /v1/stream/records
///
/// Runs the maintainer over the posted batch before responding.
pub async fn post_stream_records(
    State(state): State<AppState>,
    Json(batch): Json<ChangeBatch>,
) -> Result<Json<StreamResponse>, ApiError> {
    let Some(maintainer) = state.maintainer.as_ref() else {
        return Err(ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics cache not configured",
        ));
    };
    let report = maintainer.process_batch(&batch.records).await;
    Ok(Json(StreamResponse {
        message: report.message(),
        report,
    }))
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub version: String,
    pub uptime_secs: u64,
}

/// GET /health
pub async fn get_health(State(state): State<AppState>) -> Response {
    let (code, status, detail) = match state.store.health_check().await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "ok", None),
        Ok(HealthStatus::Degraded(reason)) => (StatusCode::OK, "degraded", Some(reason)),
        Ok(HealthStatus::Unhealthy(reason)) => {
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", Some(reason))
        }
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", Some(e.to_string())),
    };
    let body = HealthResponse {
        status: status.to_string(),
        store: state.store.name().to_string(),
        detail,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    };
    (code, Json(body)).into_response()
}
