// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Packdesk integration tests.
//!
//! Provides in-memory stores, a controllable clock, order fixtures and a
//! test harness for fast, deterministic tests without external services.
//!
//! # Components
//!
//! - [`MemoryStore`] - In-memory order store and metrics cache with failure injection
//! - [`FixedClock`] - Clock that only moves when told to
//! - [`OrderBuilder`] - Fluent order fixture builder
//! - [`TestHarness`] - SQLite-backed stack with change feed, maintainer and reader

pub mod clock;
pub mod fixtures;
pub mod harness;
pub mod memory_store;

pub use clock::FixedClock;
pub use fixtures::OrderBuilder;
pub use harness::TestHarness;
pub use memory_store::MemoryStore;
