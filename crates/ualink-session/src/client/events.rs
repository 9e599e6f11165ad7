// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session event notifications.
//!
//! Events fan out over a `tokio::sync::broadcast` channel. Emitting never
//! blocks and never fails: a session without listeners simply drops them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::error::{SessionError, UaResult};
use crate::status::StatusCode;
use crate::types::ServerState;

// =============================================================================
// SessionEvent
// =============================================================================

/// A notification emitted by a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The session was closed. Emitted at most once per session.
    SessionClosed(StatusCode),

    /// The keep-alive prober reached its failure threshold.
    KeepAliveFailure,

    /// A keep-alive probe succeeded.
    KeepAlive {
        /// Reported server state.
        state: ServerState,
        /// Successful probes since the prober started.
        count: u64,
    },

    /// The session is usable again after a repair or an owner-driven
    /// reconnection.
    SessionRestored,

    /// A session repair started.
    RepairStarted,

    /// A session repair failed.
    RepairFailed(StatusCode),

    /// A transaction was queued behind earlier work.
    TransactionQueued {
        /// Queue depth after insertion.
        depth: usize,
    },
}

impl SessionEvent {
    /// Returns the event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SessionClosed(_) => "session_closed",
            Self::KeepAliveFailure => "keepalive_failure",
            Self::KeepAlive { .. } => "keepalive",
            Self::SessionRestored => "session_restored",
            Self::RepairStarted => "repair_started",
            Self::RepairFailed(_) => "repair_failed",
            Self::TransactionQueued { .. } => "transaction_queued",
        }
    }
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionClosed(status) => write!(f, "session_closed({})", status),
            Self::KeepAlive { state, count } => write!(f, "keepalive({}, {})", state, count),
            Self::RepairFailed(status) => write!(f, "repair_failed({})", status),
            Self::TransactionQueued { depth } => write!(f, "transaction_queued({})", depth),
            other => write!(f, "{}", other.name()),
        }
    }
}

// =============================================================================
// EventBus
// =============================================================================

/// Broadcast bus for [`SessionEvent`]s.
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
    emitted: AtomicU64,
    lagged: Arc<AtomicU64>,
}

impl EventBus {
    /// Creates a bus buffering up to `capacity` events per slow listener.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            emitted: AtomicU64::new(0),
            lagged: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emits an event to every current listener.
    pub fn emit(&self, event: SessionEvent) {
        tracing::trace!(event = %event, "Session event");
        self.emitted.fetch_add(1, Ordering::Relaxed);
        let _ = self.sender.send(event);
    }

    /// Creates a new listener.
    pub fn subscribe(&self) -> EventSubscriber {
        EventSubscriber {
            receiver: self.sender.subscribe(),
            lagged: self.lagged.clone(),
        }
    }

    /// Returns the number of listeners.
    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Returns the number of events emitted.
    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    /// Returns the number of events lost by lagging listeners.
    pub fn lagged(&self) -> u64 {
        self.lagged.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .field("emitted", &self.emitted())
            .finish()
    }
}

/// A listener on the session event bus.
pub struct EventSubscriber {
    receiver: broadcast::Receiver<SessionEvent>,
    lagged: Arc<AtomicU64>,
}

impl EventSubscriber {
    /// Receives the next event, skipping over any lost to lag.
    ///
    /// Fails once the session has been dropped.
    pub async fn recv(&mut self) -> UaResult<SessionEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Ok(event),
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(SessionError::Closed.into())
                }
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    self.lagged.fetch_add(count, Ordering::Relaxed);
                    tracing::warn!(count, "Session event listener lagged, events dropped");
                }
            }
        }
    }

    /// Returns the next buffered event without waiting.
    pub fn try_recv(&mut self) -> Option<SessionEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    self.lagged.fetch_add(count, Ordering::Relaxed);
                }
                Err(_) => return None,
            }
        }
    }

    /// Drains every buffered event.
    pub fn drain(&mut self) -> Vec<SessionEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}
