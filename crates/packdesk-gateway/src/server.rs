// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use packdesk_config::GatewayConfig;
use packdesk_core::{PackdeskError, StoreAdapter};
use packdesk_metrics::{CustomerReader, MetricsMaintainer};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    pub reader: Arc<CustomerReader>,
    /// `None` when the cache is disabled; stream delivery is then refused.
    pub maintainer: Option<Arc<MetricsMaintainer>>,
    /// Store reported by `/health`.
    pub store: Arc<dyn StoreAdapter>,
    pub auth: AuthConfig,
    /// Process start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        reader: Arc<CustomerReader>,
        maintainer: Option<Arc<MetricsMaintainer>>,
        store: Arc<dyn StoreAdapter>,
        auth: AuthConfig,
    ) -> Self {
        Self {
            reader,
            maintainer,
            store,
            auth,
            start_time: Instant::now(),
        }
    }
}

/// Build the gateway router.
///
/// - GET /health (no auth)
/// - GET /v1/customers
/// - GET /v1/customers/{contact_id}
/// - GET /v1/customers/{contact_id}/orders
/// - POST /v1/stream/records
pub fn router(state: AppState) -> Router {
    let auth_state = state.auth.clone();

    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/v1/customers", get(handlers::list_customers))
        .route("/v1/customers/{contact_id}", get(handlers::get_customer))
        .route(
            "/v1/customers/{contact_id}/orders",
            get(handlers::get_customer_orders),
        )
        .route("/v1/stream/records", post(handlers::post_stream_records))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until `shutdown` is cancelled.
pub async fn start_server(
    config: &GatewayConfig,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<(), PackdeskError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PackdeskError::Gateway {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!(%addr, "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| PackdeskError::Gateway {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway stopped");
    Ok(())
}
