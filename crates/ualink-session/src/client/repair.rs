// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Repair coordinator.
//!
//! Entered when the server reports the session invalid:
//!
//! ```text
//!                       invalid session
//!                              │
//!            owner reconnecting? ──yes──► WaitingForRestore ──► retry (attempt + 1)
//!                              │no
//!                   guard Idle? ──no───► CannotRecreateSession
//!                              │yes
//!                          Repairing ──► owner.activate_session
//!                              │
//!                 ok ──► replay on channel      err ──► RepairFailed
//! ```
//!
//! Waiting for an owner-driven restore is bounded by
//! `ReconnectionSettings::max_restore_attempts` and
//! `ReconnectionSettings::restore_wait_timeout`.
//!
//! The guard stays in `Repairing` until the replay has completed, so a
//! stale-token failure that lands during the replay cannot start a second
//! activation. Releasing the guard restarts the pending queue, even when
//! the caller that triggered the repair has dropped its future.

use std::fmt;

use super::events::SessionEvent;
use super::ClientSession;
use crate::config::RepairFailurePolicy;
use crate::error::{SessionError, UaError, UaResult};
use crate::messages::{Request, Response};

// =============================================================================
// RepairGuard
// =============================================================================

/// Two-state mutual exclusion for session repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepairGuard {
    /// No repair running.
    #[default]
    Idle,
    /// A repair is running.
    Repairing,
}

impl RepairGuard {
    /// Returns `true` while a repair is running.
    #[inline]
    pub fn is_repairing(&self) -> bool {
        matches!(self, Self::Repairing)
    }
}

impl fmt::Display for RepairGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Repairing => write!(f, "Repairing"),
        }
    }
}

/// Holds the guard in `Repairing`. On drop the guard returns to `Idle` and
/// the pending queue is restarted.
struct RepairTicket {
    session: ClientSession,
}

impl RepairTicket {
    /// Moves the guard from `Idle` to `Repairing`, or returns `None` if a
    /// repair is already running.
    fn acquire(session: &ClientSession) -> Option<Self> {
        let mut state = session.inner.reconnection.lock();
        if state.repair.is_repairing() {
            return None;
        }
        state.repair = RepairGuard::Repairing;
        Some(Self {
            session: session.clone(),
        })
    }
}

impl Drop for RepairTicket {
    fn drop(&mut self) {
        self.session.inner.reconnection.lock().repair = RepairGuard::Idle;
        self.session.kick_drain();
    }
}

// =============================================================================
// Recovery
// =============================================================================

impl ClientSession {
    /// Returns the current repair guard state.
    pub fn repair_state(&self) -> RepairGuard {
        self.inner.reconnection.lock().repair
    }

    /// Handles an invalid-session failure of `request`.
    pub(super) async fn recover(&self, request: Request, attempt: u32) -> UaResult<Response> {
        let owner = self.owner()?;
        if owner.is_reconnecting() || self.is_reconnecting() {
            return self.wait_for_restore(request, attempt).await;
        }
        self.repair(request).await
    }

    /// Waits for the owner to finish its reconnection, then retries.
    async fn wait_for_restore(&self, request: Request, attempt: u32) -> UaResult<Response> {
        let limits = &self.inner.config.reconnection;
        if attempt >= limits.max_restore_attempts {
            tracing::warn!(
                session_id = %self.session_id(),
                request = %request.kind(),
                attempts = attempt,
                "Giving up on owner-driven session restore"
            );
            return Err(SessionError::RestoreAttemptsExhausted { attempts: attempt }.into());
        }

        self.inner.stats.record_restore_wait();
        tracing::debug!(
            request = %request.kind(),
            attempt,
            timeout = ?limits.restore_wait_timeout,
            "Waiting for owner to restore the session"
        );

        let mut status = self.inner.owner_status.clone();
        let restored = match tokio::time::timeout(
            limits.restore_wait_timeout,
            status.wait_for(|s| !s.is_reconnecting()),
        )
        .await
        {
            Ok(Ok(state)) => *state,
            Ok(Err(_)) => return Err(SessionError::OwnerGone.into()),
            Err(_) => {
                return Err(SessionError::RestoreWaitTimedOut {
                    duration: limits.restore_wait_timeout,
                }
                .into())
            }
        };

        if restored.is_disconnected() {
            return Err(SessionError::OwnerGone.into());
        }
        self.execute(request, attempt + 1).await
    }

    /// Recreates the session through the owner and replays `request`.
    async fn repair(&self, request: Request) -> UaResult<Response> {
        let Some(_ticket) = RepairTicket::acquire(self) else {
            tracing::debug!(
                request = %request.kind(),
                "Repair already in progress, not starting another"
            );
            return Err(UaError::cannot_recreate_session());
        };

        let owner = self.owner()?;
        self.inner.stats.record_repair_started();
        self.emit(SessionEvent::RepairStarted);
        tracing::info!(
            session_id = %self.session_id(),
            request = %request.kind(),
            "Recreating session"
        );

        let activation = owner
            .activate_session(self, &self.inner.config.user_identity)
            .await;

        match activation {
            Ok(identity) => {
                self.update_identity(identity);
                self.inner.stats.record_repair_outcome(true);
                self.emit(SessionEvent::SessionRestored);
                tracing::info!(
                    session_id = %self.session_id(),
                    request = %request.kind(),
                    "Session recreated, replaying transaction"
                );
                self.send_raw(request).await
            }
            Err(error) => {
                self.inner.stats.record_repair_outcome(false);
                self.emit(SessionEvent::RepairFailed(error.status_code()));
                error.log("Session repair failed");

                if self.inner.config.reconnection.on_repair_failure == RepairFailurePolicy::FailAll {
                    let reason = error.to_string();
                    self.abort_pending(|| SessionError::queue_aborted(reason.clone()).into());
                }
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_states() {
        assert!(!RepairGuard::default().is_repairing());
        assert!(RepairGuard::Repairing.is_repairing());
        assert_eq!(RepairGuard::Repairing.to_string(), "Repairing");
    }
}
