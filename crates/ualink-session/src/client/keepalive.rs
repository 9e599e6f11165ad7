// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Keep-alive prober.
//!
//! Reads `Server_ServerStatus_State` every interval. Each success emits
//! [`SessionEvent::KeepAlive`]; reaching the configured number of
//! consecutive failures emits [`SessionEvent::KeepAliveFailure`] once.

use std::sync::Weak;

use tokio::time::MissedTickBehavior;

use super::events::SessionEvent;
use super::session::SessionInner;
use super::{ClientSession, Padding};
use crate::config::KeepAliveSettings;
use crate::error::{ServiceError, UaResult};
use crate::types::{NodeId, ServerState, Variant};

/// Periodic liveness probe bound to one session.
pub struct KeepAliveProber {
    session: Weak<SessionInner>,
    settings: KeepAliveSettings,
    failures: u32,
    count: u64,
}

impl KeepAliveProber {
    pub(super) fn new(session: Weak<SessionInner>, settings: KeepAliveSettings) -> Self {
        Self {
            session,
            settings,
            failures: 0,
            count: 0,
        }
    }

    /// Creates a prober for `session` without starting it.
    pub fn for_session(session: &ClientSession, settings: KeepAliveSettings) -> Self {
        Self::new(session.downgrade(), settings)
    }

    /// Returns the number of consecutive failed probes.
    pub fn consecutive_failures(&self) -> u32 {
        self.failures
    }

    /// Returns the number of successful probes.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Probes until the session is closed or dropped.
    pub(super) async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let Some(inner) = self.session.upgrade() else {
                break;
            };
            let session = ClientSession::from_inner(inner);
            if session.is_closed() {
                break;
            }
            // Failures are already logged and counted.
            if self.probe(&session).await.is_err() {
                continue;
            }
        }
        tracing::debug!("Keep-alive prober stopped");
    }

    /// Runs one probe and emits the matching event.
    pub async fn probe(&mut self, session: &ClientSession) -> UaResult<ServerState> {
        match read_server_state(session).await {
            Ok(state) => {
                self.failures = 0;
                self.count += 1;
                tracing::trace!(state = %state, count = self.count, "Keep-alive");
                session.emit(SessionEvent::KeepAlive {
                    state,
                    count: self.count,
                });
                Ok(state)
            }
            Err(error) => {
                self.failures += 1;
                tracing::warn!(
                    session_id = %session.session_id(),
                    failures = self.failures,
                    error = %error,
                    "Keep-alive probe failed"
                );
                if self.failures == self.settings.failure_threshold {
                    session.emit(SessionEvent::KeepAliveFailure);
                }
                Err(error)
            }
        }
    }
}

async fn read_server_state(session: &ClientSession) -> UaResult<ServerState> {
    let value = session
        .read_variable_value(NodeId::SERVER_SERVER_STATUS_STATE)
        .await?
        .into_vec()
        .into_iter()
        .next()
        .unwrap_or_else(Padding::padding);

    if !value.status().is_good() {
        return Err(ServiceError::fault("KeepAlive", value.status()).into());
    }
    Ok(value
        .value
        .as_ref()
        .and_then(Variant::as_i64)
        .map(ServerState::from_value)
        .unwrap_or(ServerState::Unknown))
}
