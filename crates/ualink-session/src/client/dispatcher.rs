// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Transaction dispatcher.
//!
//! Every outbound request passes through [`ClientSession::submit`]:
//!
//! ```text
//!            submit(request)
//!                  │
//!          closed? ├──────────────► SessionClosed
//!                  │
//!      privileged? ├──────────────► channel (no queue, no repair)
//!                  │
//!  reconnecting,   │
//!  repairing or    ├──► pending queue ──► drain worker ──┐
//!  queue engaged?  │                     (one at a time) │
//!                  ▼                                     ▼
//!               execute ──► channel ──► invalid session? ──► repair
//! ```
//!
//! Once anything is queued, everything after it is queued too until the
//! drain worker has emptied the queue, so completions keep submission order.

use std::collections::VecDeque;

use futures::future::{BoxFuture, FutureExt};
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use super::events::SessionEvent;
use super::repair::RepairGuard;
use super::ClientSession;
use crate::error::{ChannelError, InternalError, ServiceError, UaError, UaResult};
use crate::messages::{Request, RequestKind, Response, ServiceRequest, ServiceResponse};

// =============================================================================
// ReconnectionState
// =============================================================================

/// A queued transaction and its completion.
pub(super) struct PendingTransaction {
    pub(super) request: Request,
    pub(super) reply: oneshot::Sender<UaResult<Response>>,
}

/// Queue and repair state, guarded by one mutex per session.
#[derive(Default)]
pub(super) struct ReconnectionState {
    /// FIFO of transactions waiting to be dispatched.
    pub(super) pending: VecDeque<PendingTransaction>,
    /// A drain worker is running. At most one per session.
    pub(super) draining: bool,
    /// Repair guard.
    pub(super) repair: RepairGuard,
}

enum Admission {
    Immediate(Request),
    Queued(oneshot::Receiver<UaResult<Response>>, usize),
}

enum DrainStep {
    Run(PendingTransaction),
    Abort(Vec<PendingTransaction>),
    Stop,
}

// =============================================================================
// Dispatch
// =============================================================================

impl ClientSession {
    /// Sends a request and returns the raw response.
    ///
    /// The response is returned as the channel delivered it; a bad service
    /// result in its header is not checked here. Use [`transact`] for the
    /// typed, checked form.
    ///
    /// [`transact`]: ClientSession::transact
    pub async fn submit(&self, request: impl Into<Request>) -> UaResult<Response> {
        let request = request.into();
        let kind = request.kind();

        if !self.accepts(kind) {
            tracing::debug!(request = %kind, "Rejected transaction on closed session");
            return Err(UaError::session_closed());
        }

        let result = if kind.is_privileged() {
            self.send_raw(request).await
        } else {
            match self.admit(request) {
                Admission::Immediate(request) => {
                    let result = self.execute(request, 0).await;
                    self.kick_drain();
                    result
                }
                Admission::Queued(completion, depth) => {
                    self.inner.stats.record_queued();
                    self.emit(SessionEvent::TransactionQueued { depth });
                    tracing::debug!(request = %kind, depth, "Transaction queued");
                    self.kick_drain();
                    completion
                        .await
                        .map_err(|_| UaError::internal(InternalError::CompletionDropped))?
                }
            }
        };

        self.inner.stats.record_outcome(result.is_ok());
        if let Err(e) = &result {
            tracing::debug!(request = %kind, error = %e, "Transaction failed");
        }
        result
    }

    /// Sends a typed request and returns its typed response.
    ///
    /// Fails with an internal error if the server answered with another
    /// response type, and with a service error carrying the diagnostics if
    /// the service result is not Good.
    pub async fn transact<R: ServiceRequest>(&self, request: R) -> UaResult<R::Response> {
        let response = self.submit(request).await?;
        let response = R::Response::from_response(response)?;

        let header = response.response_header();
        if !header.service_result.is_good() {
            return Err(ServiceError::fault_with_diagnostics(
                R::KIND.name(),
                header.service_result,
                header.service_diagnostics.clone(),
                header.string_table.clone(),
            )
            .into());
        }
        Ok(response)
    }

    /// Returns `true` if a request of `kind` may still be sent. While the
    /// session is closing, only the CloseSession request itself is let
    /// through.
    fn accepts(&self, kind: RequestKind) -> bool {
        if self.is_closed() {
            return false;
        }
        !self.inner.closing.load(std::sync::atomic::Ordering::Acquire)
            || kind == RequestKind::CloseSession
    }

    /// Decides between immediate dispatch and the pending queue.
    ///
    /// The owner status is read under the queue lock, so a transaction can
    /// never slip past one that was queued before it.
    fn admit(&self, request: Request) -> Admission {
        let mut state = self.inner.reconnection.lock();
        let engaged = self.is_reconnecting()
            || state.repair.is_repairing()
            || state.draining
            || !state.pending.is_empty();

        if !engaged {
            return Admission::Immediate(request);
        }

        let (reply, completion) = oneshot::channel();
        state.pending.push_back(PendingTransaction { request, reply });
        Admission::Queued(completion, state.pending.len())
    }

    /// Sends a request, routing invalid-session failures to the repair
    /// coordinator.
    pub(super) fn execute(&self, request: Request, attempt: u32) -> BoxFuture<'_, UaResult<Response>> {
        async move {
            match self.send_raw(request.clone()).await {
                Err(error) if error.is_session_invalid() && !request.kind().is_privileged() => {
                    tracing::warn!(
                        session_id = %self.session_id(),
                        request = %request.kind(),
                        status = %error.status_code(),
                        attempt,
                        "Server reported the session invalid"
                    );
                    self.recover(request, attempt).await
                }
                other => other,
            }
        }
        .boxed()
    }

    /// Stamps the header and sends directly on the channel.
    pub(super) async fn send_raw(&self, mut request: Request) -> UaResult<Response> {
        if !self.inner.channel.is_open() {
            return Err(ChannelError::NotOpen.into());
        }

        let kind = request.kind();
        {
            let identity = self.inner.identity.read();
            let header = request.header_mut();
            header.authentication_token = identity.authentication_token.clone();
            header.request_handle = self.next_request_handle();
            header.timestamp = Some(chrono::Utc::now());
            if header.timeout_hint == 0 {
                header.timeout_hint =
                    u32::try_from(self.inner.config.request_timeout.as_millis()).unwrap_or(u32::MAX);
            }
        }

        self.touch_request_sent();
        self.inner.stats.record_sent();
        tracing::trace!(
            request = %kind,
            handle = request.header().request_handle,
            channel_id = self.inner.channel.channel_id(),
            "Sending request"
        );

        let response = self.inner.channel.send(request).await?;
        self.touch_response_received();

        let header = response.header();
        let status = header.service_result;
        if matches!(response, Response::ServiceFault(_)) || status.is_session_invalid() {
            let header = header.clone();
            return Err(ServiceError::fault_with_diagnostics(
                kind.name(),
                status,
                header.service_diagnostics,
                header.string_table,
            )
            .into());
        }
        Ok(response)
    }

    // =========================================================================
    // Drain
    // =========================================================================

    /// Starts the drain worker if there is queued work, none is running and
    /// nothing blocks dispatch.
    pub(super) fn kick_drain(&self) {
        let Ok(runtime) = Handle::try_current() else {
            return;
        };
        {
            let mut state = self.inner.reconnection.lock();
            if state.pending.is_empty()
                || state.draining
                || state.repair.is_repairing()
                || self.is_reconnecting()
            {
                return;
            }
            state.draining = true;
        }

        tracing::debug!(session_id = %self.session_id(), "Draining pending transactions");
        runtime.spawn(self.clone().drain());
    }

    /// Single consumer of the pending queue.
    ///
    /// Dispatches one transaction at a time and completes it before taking
    /// the next. Pauses when the owner starts reconnecting or a repair is in
    /// progress; the owner watcher or the repairing transaction restarts it.
    async fn drain(self) {
        loop {
            let step = {
                let mut state = self.inner.reconnection.lock();
                if self.is_closed() {
                    state.draining = false;
                    let abandoned: Vec<_> = state.pending.drain(..).collect();
                    DrainStep::Abort(abandoned)
                } else if self.is_reconnecting() || state.repair.is_repairing() {
                    state.draining = false;
                    DrainStep::Stop
                } else {
                    match state.pending.pop_front() {
                        Some(transaction) => DrainStep::Run(transaction),
                        None => {
                            state.draining = false;
                            DrainStep::Stop
                        }
                    }
                }
            };

            match step {
                DrainStep::Run(PendingTransaction { request, reply }) => {
                    let result = self.execute(request, 0).await;
                    if reply.send(result).is_err() {
                        tracing::debug!("Caller dropped a queued transaction before completion");
                    }
                }
                DrainStep::Abort(transactions) => {
                    for transaction in transactions {
                        let _ = transaction.reply.send(Err(UaError::session_closed()));
                    }
                    return;
                }
                DrainStep::Stop => return,
            }
        }
    }

    /// Fails every queued transaction with the error `make_error` builds.
    pub(super) fn abort_pending(&self, make_error: impl Fn() -> UaError) {
        let transactions: Vec<_> = self.inner.reconnection.lock().pending.drain(..).collect();
        if transactions.is_empty() {
            return;
        }

        tracing::warn!(
            session_id = %self.session_id(),
            count = transactions.len(),
            "Failing queued transactions"
        );
        for transaction in transactions {
            let _ = transaction.reply.send(Err(make_error()));
        }
    }
}
