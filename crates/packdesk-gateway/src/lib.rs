// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Packdesk back-office.
//!
//! Serves the cache-aware customer read path as a JSON API and accepts
//! change-record batches for the metrics maintainer. Every `/v1` response
//! is wrapped in the same envelope: `{success, data, error, meta}`.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use handlers::{Envelope, Meta};
pub use server::{AppState, router, start_server};
