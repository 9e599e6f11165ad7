// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Common Test Utilities
//!
//! Shared test doubles, fixtures and helpers for the integration tests.
//!
//! ## Module Structure
//!
//! - `mocks`: [`MockChannel`] and [`MockOwner`], the two collaborators a
//!   session consumes
//! - `fixtures`: Configurations, identities, canned responses and the
//!   [`SessionHarness`] that wires them together
//! - `assertions`: Error and event assertions

pub mod assertions;
pub mod fixtures;
pub mod mocks;

// Re-exports for convenience
pub use assertions::*;
pub use fixtures::*;
pub use mocks::*;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Initialize test logging. Call this at the start of each test module.
pub fn init_test_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("warn,ualink_session=debug")),
            )
            .with_test_writer()
            .init();
    });
}

/// Generate a unique test ID for resource isolation.
pub fn unique_test_id() -> String {
    format!("test_{}_{}", std::process::id(), NEXT_ID.fetch_add(1, Ordering::Relaxed))
}

/// Create a temporary directory for test data.
pub fn temp_test_dir(prefix: &str) -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .expect("Failed to create temp directory")
}
