// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! Pre-built configurations, identities and responses, plus
//! [`SessionHarness`], which wires a session to the mocks.

use std::sync::Arc;
use std::time::Duration;

use ualink_session::messages::{
    BrowseResponse, BrowseResult, ReadResponse, ReferenceDescription, ResponseHeader,
    ServiceFault, WriteResponse,
};
use ualink_session::{
    ClientSession, DataValue, KeepAliveSettings, NodeId, RepairFailurePolicy, SessionConfig,
    SessionIdentity, StatusCode, Variant,
};

use super::mocks::{MockChannel, MockOwner};

/// Endpoint used by every fixture configuration.
pub const TEST_ENDPOINT: &str = "opc.tcp://localhost:4840";

// =============================================================================
// Config Fixtures
// =============================================================================

/// Session configuration fixtures.
pub struct ConfigFixtures;

impl ConfigFixtures {
    /// Default configuration with keep-alive disabled.
    pub fn session_config() -> SessionConfig {
        let mut config = SessionConfig::new(TEST_ENDPOINT);
        config.keep_alive = KeepAliveSettings::disabled();
        config
    }

    /// Configuration with explicit restore limits.
    pub fn with_restore_limits(attempts: u32, timeout: Duration) -> SessionConfig {
        let mut config = Self::session_config();
        config.reconnection.max_restore_attempts = attempts;
        config.reconnection.restore_wait_timeout = timeout;
        config
    }

    /// Configuration with the given repair failure policy.
    pub fn with_repair_policy(policy: RepairFailurePolicy) -> SessionConfig {
        let mut config = Self::session_config();
        config.reconnection.on_repair_failure = policy;
        config
    }

    /// Configuration with keep-alive probing enabled.
    pub fn with_keep_alive(interval: Duration, failure_threshold: u32) -> SessionConfig {
        let mut config = Self::session_config();
        config.keep_alive = KeepAliveSettings {
            enabled: true,
            interval,
            failure_threshold,
        };
        config
    }
}

// =============================================================================
// Identity Fixtures
// =============================================================================

/// Session identity fixtures.
pub struct IdentityFixtures;

impl IdentityFixtures {
    /// Session id of [`IdentityFixtures::initial`].
    pub fn session_id() -> NodeId {
        NodeId::numeric(1, 1001)
    }

    /// Authentication token of [`IdentityFixtures::initial`].
    pub fn token() -> NodeId {
        NodeId::numeric(1, 2002)
    }

    /// The identity every harness session starts with (60 s lifetime).
    pub fn initial() -> SessionIdentity {
        SessionIdentity::new(Self::session_id(), Self::token(), Duration::from_secs(60))
    }

    /// The identity a [`MockOwner`] installs on its n-th activation.
    pub fn renewed_token(n: u32) -> NodeId {
        NodeId::numeric(1, 3000 + n)
    }
}

// =============================================================================
// Response Fixtures
// =============================================================================

/// Canned service responses.
pub struct ResponseFixtures;

impl ResponseFixtures {
    /// Read response with the given results.
    pub fn read(values: Vec<DataValue>) -> ReadResponse {
        ReadResponse {
            header: ResponseHeader::good(),
            results: Some(values),
            diagnostic_infos: None,
        }
    }

    /// Read response carrying one Double per value.
    pub fn read_doubles(values: &[f64]) -> ReadResponse {
        Self::read(values.iter().map(|v| DataValue::new(*v)).collect())
    }

    /// Read response that omits the results array.
    pub fn read_without_results() -> ReadResponse {
        ReadResponse::default()
    }

    /// Read response answering a keep-alive probe with `state`.
    pub fn server_state(state: i32) -> ReadResponse {
        Self::read(vec![DataValue::new(Variant::Int32(state))])
    }

    /// Write response with the given statuses.
    pub fn write(statuses: Vec<StatusCode>) -> WriteResponse {
        WriteResponse {
            header: ResponseHeader::good(),
            results: Some(statuses),
            diagnostic_infos: None,
        }
    }

    /// Browse response with one result per entry in `references`.
    pub fn browse(references: Vec<Vec<ReferenceDescription>>) -> BrowseResponse {
        BrowseResponse {
            header: ResponseHeader::good(),
            results: Some(
                references
                    .into_iter()
                    .map(|refs| BrowseResult {
                        references: Some(refs),
                        ..Default::default()
                    })
                    .collect(),
            ),
            diagnostic_infos: None,
        }
    }

    /// Whole-service failure.
    pub fn fault(status: StatusCode) -> ServiceFault {
        ServiceFault::new(status)
    }

    /// Whole-service failure with `BadSessionIdInvalid`.
    pub fn invalid_session() -> ServiceFault {
        Self::fault(StatusCode::BadSessionIdInvalid)
    }
}

// =============================================================================
// Session Harness
// =============================================================================

/// A session wired to a [`MockChannel`] and a [`MockOwner`].
///
/// The session holds its owner weakly; the harness keeps it alive.
pub struct SessionHarness {
    /// The session under test.
    pub session: ClientSession,
    /// Handle on the session's channel.
    pub channel: MockChannel,
    /// The owning client.
    pub owner: Arc<MockOwner>,
}

impl SessionHarness {
    /// Build a harness over `channel` with [`ConfigFixtures::session_config`].
    pub fn new(channel: MockChannel) -> Self {
        Self::with_config(channel, ConfigFixtures::session_config())
    }

    /// Build a harness over an echoing channel.
    pub fn echoing() -> Self {
        Self::new(MockChannel::echoing())
    }

    /// Build a harness with a custom configuration.
    pub fn with_config(channel: MockChannel, config: SessionConfig) -> Self {
        let owner = MockOwner::shared();
        let session = ClientSession::builder(
            Arc::new(channel.clone()),
            owner.clone(),
            IdentityFixtures::initial(),
        )
        .config(config)
        .build()
        .expect("Failed to build test session");

        Self {
            session,
            channel,
            owner,
        }
    }

    /// Wait until `count` transactions are queued.
    pub async fn wait_for_pending(&self, count: usize) {
        for _ in 0..1000 {
            if self.session.pending_count() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!(
            "Expected {} pending transactions, found {}",
            count,
            self.session.pending_count()
        );
    }

    /// Wait until the channel has seen `count` requests.
    pub async fn wait_for_sends(&self, count: u64) {
        for _ in 0..1000 {
            if self.channel.send_count() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!(
            "Expected {} sent requests, found {}",
            count,
            self.channel.send_count()
        );
    }
}
