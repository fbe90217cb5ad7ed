// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Packdesk back-office.

use thiserror::Error;

/// The primary error type used across all Packdesk collaborator traits and core operations.
#[derive(Debug, Error)]
pub enum PackdeskError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, migrations).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A stored document or request body could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The customer has no orders at all, so there is nothing to report.
    #[error("Customer not found: {contact_id}")]
    CustomerNotFound { contact_id: String },

    /// HTTP gateway errors (bind failure, server crash).
    #[error("gateway error: {message}")]
    Gateway {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PackdeskError {
    /// Wrap any backend error as a storage error.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        PackdeskError::Storage {
            source: Box::new(err),
        }
    }

    /// Returns true when the error means "no such customer" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PackdeskError::CustomerNotFound { .. })
    }
}
