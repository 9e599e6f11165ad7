// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The client session.
//!
//! A [`ClientSession`] owns the server-assigned identity, the request
//! timers, the pending queue and the repair guard. It is a cheap handle:
//! clones share one session.
//!
//! # Lifecycle
//!
//! ```text
//!  build() ──► Open ──► (repairs, owner reconnections) ──► close() ──► Closed
//! ```
//!
//! The transaction path lives in `dispatcher.rs` and `repair.rs`; this file
//! holds construction, identity, timers and close.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::channel::SecureChannel;
use super::dispatcher::ReconnectionState;
use super::events::{EventBus, EventSubscriber, SessionEvent};
use super::keepalive::KeepAliveProber;
use super::owner::{OwnerStatus, SessionIdentity, SessionOwner};
use super::publish::{PublishEngine, SubscriptionTracker};
use super::resolver::{DatatypeResolver, NoopResolver};
use super::stats::SessionStats;
use crate::config::SessionConfig;
use crate::error::{SessionError, UaError, UaResult};
use crate::status::StatusCode;
use crate::types::{DataValue, NodeId, Variant};

// =============================================================================
// Shared state
// =============================================================================

/// Send and receive times of the last transaction.
#[derive(Debug, Clone, Copy)]
pub(super) struct Timestamps {
    pub(super) last_request_sent: Instant,
    pub(super) last_response_received: Option<Instant>,
}

#[derive(Default)]
pub(super) struct BackgroundTasks {
    pub(super) keep_alive: Option<JoinHandle<()>>,
    pub(super) owner_watcher: Option<JoinHandle<()>>,
}

impl BackgroundTasks {
    fn abort_all(&mut self) {
        if let Some(task) = self.keep_alive.take() {
            task.abort();
        }
        if let Some(task) = self.owner_watcher.take() {
            task.abort();
        }
    }
}

pub(super) struct SessionInner {
    pub(super) channel: Arc<dyn SecureChannel>,
    pub(super) owner: Weak<dyn SessionOwner>,
    pub(super) owner_status: watch::Receiver<OwnerStatus>,
    pub(super) identity: RwLock<SessionIdentity>,
    pub(super) config: SessionConfig,
    pub(super) reconnection: Mutex<ReconnectionState>,
    pub(super) closed: AtomicBool,
    pub(super) closing: AtomicBool,
    pub(super) close_event_emitted: AtomicBool,
    pub(super) timestamps: Mutex<Timestamps>,
    pub(super) events: EventBus,
    pub(super) stats: SessionStats,
    pub(super) resolver: Arc<dyn DatatypeResolver>,
    pub(super) publish_engine: Arc<dyn PublishEngine>,
    pub(super) tasks: Mutex<BackgroundTasks>,
    pub(super) next_request_handle: AtomicU32,
    pub(super) created_at: DateTime<Utc>,
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        self.tasks.get_mut().abort_all();
    }
}

// =============================================================================
// ClientSession
// =============================================================================

/// A session on an OPC UA server.
///
/// Every service call goes through [`ClientSession::submit`], which queues
/// work while the owner reconnects or a repair runs, and repairs the
/// session when the server reports it invalid.
#[derive(Clone)]
pub struct ClientSession {
    pub(super) inner: Arc<SessionInner>,
}

impl ClientSession {
    /// Starts building a session over `channel`, owned by `owner`, with the
    /// identity returned by the owner's CreateSession/ActivateSession
    /// handshake.
    pub fn builder(
        channel: Arc<dyn SecureChannel>,
        owner: Arc<dyn SessionOwner>,
        identity: SessionIdentity,
    ) -> SessionBuilder {
        SessionBuilder {
            channel,
            owner,
            identity,
            config: None,
            resolver: None,
            publish_engine: None,
        }
    }

    pub(super) fn from_inner(inner: Arc<SessionInner>) -> Self {
        Self { inner }
    }

    pub(super) fn downgrade(&self) -> Weak<SessionInner> {
        Arc::downgrade(&self.inner)
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// Returns the session id.
    pub fn session_id(&self) -> NodeId {
        self.inner.identity.read().session_id.clone()
    }

    /// Returns the authentication token.
    pub fn authentication_token(&self) -> NodeId {
        self.inner.identity.read().authentication_token.clone()
    }

    /// Returns a copy of the current identity.
    pub fn identity(&self) -> SessionIdentity {
        self.inner.identity.read().clone()
    }

    /// Installs a new identity after the owner re-activated the session.
    pub fn update_identity(&self, identity: SessionIdentity) {
        tracing::debug!(
            session_id = %identity.session_id,
            timeout = ?identity.revised_timeout,
            "Session identity updated"
        );
        *self.inner.identity.write() = identity;
    }

    /// Returns the server-assigned session lifetime.
    pub fn timeout(&self) -> Duration {
        self.inner.identity.read().revised_timeout
    }

    /// Returns the session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Returns the secure channel id.
    pub fn channel_id(&self) -> u32 {
        self.inner.channel.channel_id()
    }

    /// Returns when this session object was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    /// Returns the transaction statistics.
    pub fn stats(&self) -> &SessionStats {
        &self.inner.stats
    }

    /// Returns the publish engine.
    pub fn publish_engine(&self) -> &Arc<dyn PublishEngine> {
        &self.inner.publish_engine
    }

    /// Returns `true` once the session has been closed.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Returns `true` while the owning client reports a reconnection.
    pub fn is_reconnecting(&self) -> bool {
        self.inner.owner_status.borrow().is_reconnecting()
    }

    /// Returns the number of transactions waiting in the pending queue.
    pub fn pending_count(&self) -> usize {
        self.inner.reconnection.lock().pending.len()
    }

    pub(super) fn owner(&self) -> UaResult<Arc<dyn SessionOwner>> {
        self.inner
            .owner
            .upgrade()
            .ok_or_else(|| SessionError::OwnerGone.into())
    }

    pub(super) fn next_request_handle(&self) -> u32 {
        self.inner.next_request_handle.fetch_add(1, Ordering::Relaxed)
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Subscribes to session events.
    pub fn subscribe(&self) -> EventSubscriber {
        self.inner.events.subscribe()
    }

    pub(super) fn emit(&self, event: SessionEvent) {
        self.inner.events.emit(event);
    }

    // =========================================================================
    // Timers
    // =========================================================================

    pub(super) fn touch_request_sent(&self) {
        let now = Instant::now();
        let mut timestamps = self.inner.timestamps.lock();
        timestamps.last_request_sent = timestamps.last_request_sent.max(now);
    }

    pub(super) fn touch_response_received(&self) {
        let now = Instant::now();
        let mut timestamps = self.inner.timestamps.lock();
        let latest = match timestamps.last_response_received {
            Some(previous) => previous.max(now),
            None => now,
        };
        timestamps.last_response_received = Some(latest);
    }

    /// Returns when the last request was handed to the channel.
    pub fn last_request_sent(&self) -> Instant {
        self.inner.timestamps.lock().last_request_sent
    }

    /// Returns when the last response arrived.
    pub fn last_response_received(&self) -> Option<Instant> {
        self.inner.timestamps.lock().last_response_received
    }

    /// Returns how much of the server-assigned lifetime is left.
    ///
    /// Zero means the server has certainly dropped the session, unless
    /// something kept it alive that this session did not send.
    pub fn evaluate_remaining_lifetime(&self) -> Duration {
        self.remaining_lifetime_at(Instant::now())
    }

    /// Returns the remaining lifetime as of `now`.
    pub fn remaining_lifetime_at(&self, now: Instant) -> Duration {
        let last_sent = self.last_request_sent();
        self.timeout()
            .saturating_sub(now.saturating_duration_since(last_sent))
    }

    // =========================================================================
    // Extension objects
    // =========================================================================

    /// Resolves opaque extension objects in `values`.
    pub async fn resolve_values(&self, values: &mut [Variant]) -> UaResult<()> {
        if !values.iter().any(Variant::has_opaque) {
            return Ok(());
        }
        self.inner
            .resolver
            .resolve_opaque_values(self, values)
            .await
    }

    /// Resolves opaque extension objects in the values of `data_values`.
    pub async fn resolve_data_values(&self, data_values: &mut [DataValue]) -> UaResult<()> {
        if !data_values
            .iter()
            .any(|dv| dv.value.as_ref().is_some_and(Variant::has_opaque))
        {
            return Ok(());
        }
        let present: Vec<bool> = data_values.iter().map(|dv| dv.value.is_some()).collect();
        let mut values: Vec<Variant> = data_values
            .iter_mut()
            .filter_map(|dv| dv.value.take())
            .collect();
        let result = self.resolve_values(&mut values).await;

        let mut values = values.into_iter();
        for (dv, present) in data_values.iter_mut().zip(present) {
            if present {
                dv.value = values.next();
            }
        }
        result
    }

    // =========================================================================
    // Callback facade
    // =========================================================================

    /// Runs `operation` on a spawned task and hands its result to
    /// `callback`.
    ///
    /// ```rust,ignore
    /// session.with_callback(
    ///     |s| async move { s.read("ns=2;s=Temperature").await },
    ///     |result| println!("{:?}", result),
    /// );
    /// ```
    pub fn with_callback<F, Fut, T, C>(&self, operation: F, callback: C) -> JoinHandle<()>
    where
        F: FnOnce(ClientSession) -> Fut,
        Fut: Future<Output = UaResult<T>> + Send + 'static,
        T: Send + 'static,
        C: FnOnce(UaResult<T>) + Send + 'static,
    {
        let future = operation(self.clone());
        tokio::spawn(async move { callback(future.await) })
    }

    // =========================================================================
    // Close
    // =========================================================================

    /// Closes the session.
    ///
    /// Stops the keep-alive prober, terminates the publish engine, asks the
    /// owner to close the session on the server and marks the session
    /// closed, even if the owner failed. Transactions still queued fail
    /// with `SessionClosed`. A second call returns immediately.
    pub async fn close(&self, delete_subscriptions: bool) -> UaResult<()> {
        if self.is_closed() || self.inner.closing.swap(true, Ordering::AcqRel) {
            tracing::debug!(session_id = %self.session_id(), "Session already closed");
            return Ok(());
        }

        tracing::info!(
            session_id = %self.session_id(),
            delete_subscriptions,
            "Closing session"
        );

        self.inner.tasks.lock().abort_all();
        self.inner.publish_engine.terminate();

        let result = match self.owner() {
            Ok(owner) => owner.close_session(self, delete_subscriptions).await,
            Err(e) => Err(e),
        };

        self.inner.closed.store(true, Ordering::Release);
        self.abort_pending(UaError::session_closed);

        let status = match &result {
            Ok(()) => StatusCode::Good,
            Err(e) => {
                e.log("Server-side session close failed");
                e.status_code()
            }
        };
        self.emit_closed(status);
        result
    }

    fn emit_closed(&self, status: StatusCode) {
        if !self.inner.close_event_emitted.swap(true, Ordering::AcqRel) {
            self.emit(SessionEvent::SessionClosed(status));
        }
    }

    // =========================================================================
    // Background tasks
    // =========================================================================

    fn start_background_tasks(&self) {
        if Handle::try_current().is_err() {
            tracing::warn!("No tokio runtime, owner watcher and keep-alive not started");
            return;
        }

        let mut tasks = self.inner.tasks.lock();
        tasks.owner_watcher = Some(tokio::spawn(watch_owner(
            self.downgrade(),
            self.inner.owner_status.clone(),
        )));

        let settings = &self.inner.config.keep_alive;
        if settings.enabled {
            let prober = KeepAliveProber::new(self.downgrade(), settings.clone());
            tasks.keep_alive = Some(tokio::spawn(prober.run()));
        }
    }
}

impl fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSession")
            .field("session_id", &self.session_id())
            .field("endpoint", &self.inner.config.endpoint)
            .field("closed", &self.is_closed())
            .field("pending", &self.pending_count())
            .finish()
    }
}

/// Turns owner status transitions into session events and restarts the
/// pending queue once the owner is connected again.
///
/// A `watch` channel only keeps the latest value, so a reconnection that
/// finishes before this task runs shows up as Connected to Connected. The
/// drain is therefore restarted on every Connected value, including the
/// one seen at startup.
async fn watch_owner(weak: Weak<SessionInner>, mut status: watch::Receiver<OwnerStatus>) {
    let mut previous = *status.borrow_and_update();
    if previous.is_connected() {
        if let Some(inner) = weak.upgrade() {
            ClientSession::from_inner(inner).kick_drain();
        }
    }

    while status.changed().await.is_ok() {
        let current = *status.borrow_and_update();
        let Some(inner) = weak.upgrade() else {
            break;
        };
        let session = ClientSession::from_inner(inner);

        tracing::debug!(from = %previous, to = %current, "Owner status changed");
        match (previous, current) {
            (OwnerStatus::Reconnecting, OwnerStatus::Connected) => {
                tracing::info!(
                    session_id = %session.session_id(),
                    pending = session.pending_count(),
                    "Session restored by owner"
                );
                session.emit(SessionEvent::SessionRestored);
            }
            (_, OwnerStatus::Disconnected) => {
                session.abort_pending(|| SessionError::OwnerGone.into());
            }
            _ => {}
        }
        if current.is_connected() {
            session.kick_drain();
        }
        previous = current;
    }
}

// =============================================================================
// SessionBuilder
// =============================================================================

/// Builder for [`ClientSession`].
pub struct SessionBuilder {
    channel: Arc<dyn SecureChannel>,
    owner: Arc<dyn SessionOwner>,
    identity: SessionIdentity,
    config: Option<SessionConfig>,
    resolver: Option<Arc<dyn DatatypeResolver>>,
    publish_engine: Option<Arc<dyn PublishEngine>>,
}

impl SessionBuilder {
    /// Sets the configuration.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the datatype resolver. Defaults to [`NoopResolver`].
    pub fn resolver(mut self, resolver: Arc<dyn DatatypeResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Sets the publish engine. Defaults to a [`SubscriptionTracker`].
    pub fn publish_engine(mut self, engine: Arc<dyn PublishEngine>) -> Self {
        self.publish_engine = Some(engine);
        self
    }

    /// Builds the session and, inside a tokio runtime, starts the owner
    /// watcher and the keep-alive prober.
    pub fn build(self) -> UaResult<ClientSession> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let owner_status = self.owner.restore_notifications();
        let identity = if self.identity.revised_timeout.is_zero() {
            SessionIdentity {
                revised_timeout: config.session_timeout,
                ..self.identity
            }
        } else {
            self.identity
        };

        let inner = Arc::new(SessionInner {
            channel: self.channel,
            owner: Arc::downgrade(&self.owner),
            owner_status,
            identity: RwLock::new(identity),
            events: EventBus::new(config.event_channel_capacity),
            config,
            reconnection: Mutex::new(ReconnectionState::default()),
            closed: AtomicBool::new(false),
            closing: AtomicBool::new(false),
            close_event_emitted: AtomicBool::new(false),
            timestamps: Mutex::new(Timestamps {
                last_request_sent: Instant::now(),
                last_response_received: None,
            }),
            stats: SessionStats::new(),
            resolver: self.resolver.unwrap_or_else(|| Arc::new(NoopResolver)),
            publish_engine: self
                .publish_engine
                .unwrap_or_else(|| Arc::new(SubscriptionTracker::new())),
            tasks: Mutex::new(BackgroundTasks::default()),
            next_request_handle: AtomicU32::new(1),
            created_at: Utc::now(),
        });

        let session = ClientSession::from_inner(inner);
        session.start_background_tasks();

        tracing::info!(
            session_id = %session.session_id(),
            endpoint = %session.inner.config.endpoint,
            timeout = ?session.timeout(),
            "Session created"
        );
        Ok(session)
    }
}

impl fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("identity", &self.identity)
            .field("config", &self.config)
            .finish()
    }
}
