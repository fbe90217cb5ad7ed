// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Packdesk back-office.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Packdesk configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PackdeskConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Customer metrics cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Change-stream consumer settings.
    #[serde(default)]
    pub stream: StreamConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Service name used in logs and the health endpoint.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "packdesk".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("packdesk").join("packdesk.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("packdesk.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Customer metrics cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// When false the cache collection is treated as not configured: the
    /// maintainer does nothing and reads always compute from orders.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Lifetime of a cache record, in days from its last write.
    #[serde(default = "default_ttl_days")]
    pub ttl_days: u32,

    /// Write the computed record back when a single-customer read misses.
    #[serde(default = "default_true")]
    pub populate_on_miss: bool,

    /// Interval between expired-record sweeps.
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_days: default_ttl_days(),
            populate_on_miss: true,
            purge_interval_secs: default_purge_interval_secs(),
        }
    }
}

impl CacheConfig {
    /// Cache record lifetime as a `chrono` duration.
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.ttl_days))
    }

    /// Sweep interval.
    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs)
    }
}

fn default_true() -> bool {
    true
}

fn default_ttl_days() -> u32 {
    90
}

fn default_purge_interval_secs() -> u64 {
    3600
}

/// Change-stream consumer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StreamConfig {
    /// Maximum records handed to the maintainer in one batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// How long to wait for a batch to fill before processing it anyway.
    #[serde(default = "default_batch_window_ms")]
    pub batch_window_ms: u64,

    /// Capacity of the in-process change feed channel.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_window_ms: default_batch_window_ms(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl StreamConfig {
    /// Batch window as a duration.
    pub fn batch_window(&self) -> Duration {
        Duration::from_millis(self.batch_window_ms)
    }
}

fn default_batch_size() -> usize {
    100
}

fn default_batch_window_ms() -> u64 {
    500
}

fn default_channel_capacity() -> usize {
    1024
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bearer token required on `/v1` routes. `None` disables authentication.
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Reads slower than this are logged as slow queries.
    #[serde(default = "default_slow_query_ms")]
    pub slow_query_ms: u64,

    /// List size when the request gives no limit.
    #[serde(default = "default_list_limit")]
    pub default_list_limit: usize,

    /// Upper bound for a requested list limit.
    #[serde(default = "default_max_list_limit")]
    pub max_list_limit: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            bearer_token: None,
            slow_query_ms: default_slow_query_ms(),
            default_list_limit: default_list_limit(),
            max_list_limit: default_max_list_limit(),
        }
    }
}

impl GatewayConfig {
    /// Slow-query threshold as a duration.
    pub fn slow_query(&self) -> Duration {
        Duration::from_millis(self.slow_query_ms)
    }
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    3000
}

fn default_slow_query_ms() -> u64 {
    1000
}

fn default_list_limit() -> usize {
    50
}

fn default_max_list_limit() -> usize {
    500
}
