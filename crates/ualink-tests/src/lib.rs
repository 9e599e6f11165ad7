// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # ualink Integration Tests
//!
//! Integration tests and shared test utilities for the ualink session layer.
//!
//! ## Test Organization
//!
//! - `common/`: Shared utilities
//!   - `mocks.rs`: Scriptable secure channel and session owner
//!   - `fixtures.rs`: Configurations, identities and canned responses
//!   - `assertions.rs`: Session-specific assertion helpers
//!
//! ## Test Categories
//!
//! ### Dispatcher Tests (`integration_dispatcher.rs`)
//! - Closed-session short circuit
//! - Pending queue ordering while the owner reconnects
//! - Privileged requests bypassing the queue
//! - Queue abort when the owner gives up
//!
//! ### Repair Tests (`integration_repair.rs`)
//! - Repair and replay after an invalid-session error
//! - Single-flight repair guard
//! - Repair failure policies
//! - Bounded waiting for owner-driven restore
//!
//! ### Lifecycle Tests (`integration_lifecycle.rs`)
//! - Idempotent close
//! - Remaining lifetime
//! - Keep-alive probing
//! - Callback facade
//!
//! ### Service Tests (`integration_services.rs`)
//! - Scalar and array calls answered in the caller's shape
//! - Default filling and length checks
//! - Extension object resolution
//!
//! ### Config Tests (`integration_config.rs`)
//! - File loading (YAML, TOML, JSON) and validation
//!
//! ## Writing New Tests
//!
//! ```rust,ignore
//! use ualink_tests::prelude::*;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let channel = MockChannel::new();
//!     channel.respond(ResponseFixtures::read(vec![DataValue::new(21.5)]));
//!
//!     let harness = SessionHarness::new(channel);
//!     let value = harness.session.read("ns=2;s=Temperature").await.unwrap();
//!     // ... test logic
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod common;

/// Re-export commonly used items for convenience.
pub mod prelude {
    pub use crate::common::assertions::*;
    pub use crate::common::fixtures::*;
    pub use crate::common::mocks::*;
    pub use crate::common::{init_test_logging, temp_test_dir, unique_test_id};
}
