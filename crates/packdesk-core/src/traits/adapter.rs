// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait that every store backend implements.

use async_trait::async_trait;

use crate::error::PackdeskError;
use crate::types::HealthStatus;

/// Identity and health for a store backend.
#[async_trait]
pub trait StoreAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this backend.
    fn name(&self) -> &str;

    /// Performs a health check and returns the backend's current status.
    async fn health_check(&self) -> Result<HealthStatus, PackdeskError>;
}
