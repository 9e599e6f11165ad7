// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Mock Implementations
//!
//! Test doubles for the two collaborators a session consumes.
//!
//! ## Available Mocks
//!
//! - [`MockChannel`]: Scriptable secure channel with response queue,
//!   fault injection, latency and a request log
//! - [`MockOwner`]: Owning client with a controllable connection status,
//!   scripted activation results and call counters

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;

use ualink_session::messages::{
    ReadResponse, Request, RequestKind, Response, ResponseHeader, ServiceFault, WriteResponse,
};
use ualink_session::{
    ChannelError, ClientSession, DataValue, NodeId, OwnerStatus, SecureChannel, ServiceError,
    SessionIdentity, SessionOwner, StatusCode, UaResult, UserIdentity, Variant,
};

// =============================================================================
// Mock Secure Channel
// =============================================================================

type Responder = Arc<dyn Fn(&Request) -> Response + Send + Sync>;

/// A mock secure channel for testing the dispatcher without a server.
///
/// Responses come from, in order of precedence:
///
/// 1. injected faults (non-privileged requests only)
/// 2. the scripted response queue
/// 3. the installed responder
///
/// With none of those available the send fails with a channel error.
/// Clones share state, so a test can keep one handle and give another to
/// the session.
#[derive(Clone)]
pub struct MockChannel {
    state: Arc<ChannelState>,
}

struct ChannelState {
    responses: Mutex<VecDeque<Response>>,
    responder: Mutex<Option<Responder>>,
    fault: Mutex<Option<(StatusCode, u32)>>,
    latency: Mutex<Duration>,
    open: AtomicBool,
    channel_id: AtomicU32,
    send_count: AtomicU64,
    requests: Mutex<Vec<Request>>,
}

impl MockChannel {
    /// Create a new open channel with nothing scripted.
    pub fn new() -> Self {
        Self {
            state: Arc::new(ChannelState {
                responses: Mutex::new(VecDeque::new()),
                responder: Mutex::new(None),
                fault: Mutex::new(None),
                latency: Mutex::new(Duration::ZERO),
                open: AtomicBool::new(true),
                channel_id: AtomicU32::new(1),
                send_count: AtomicU64::new(0),
                requests: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Create a channel that answers every Read with the requested node
    /// id as a string value, and every Write with Good.
    pub fn echoing() -> Self {
        let channel = Self::new();
        channel.respond_with(echo_response);
        channel
    }

    /// Queue a response for the next request.
    pub fn respond(&self, response: impl Into<Response>) {
        self.state.responses.lock().push_back(response.into());
    }

    /// Install a responder used once the response queue is empty.
    pub fn respond_with<F>(&self, responder: F)
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        *self.state.responder.lock() = Some(Arc::new(responder));
    }

    /// Fail the next `count` non-privileged requests with `status`.
    pub fn inject_fault(&self, status: StatusCode, count: u32) {
        *self.state.fault.lock() = Some((status, count));
    }

    /// Fail the next `count` non-privileged requests with
    /// `BadSessionIdInvalid`.
    pub fn fail_next_with_invalid_session(&self, count: u32) {
        self.inject_fault(StatusCode::BadSessionIdInvalid, count);
    }

    /// Set the delay applied before every response.
    pub fn set_latency(&self, latency: Duration) {
        *self.state.latency.lock() = latency;
    }

    /// Open or close the channel.
    pub fn set_open(&self, open: bool) {
        self.state.open.store(open, Ordering::SeqCst);
    }

    /// Get the number of requests sent.
    pub fn send_count(&self) -> u64 {
        self.state.send_count.load(Ordering::SeqCst)
    }

    /// Get every request sent so far.
    pub fn requests(&self) -> Vec<Request> {
        self.state.requests.lock().clone()
    }

    /// Get the kinds of every request sent so far.
    pub fn request_kinds(&self) -> Vec<RequestKind> {
        self.state.requests.lock().iter().map(Request::kind).collect()
    }

    /// Get the last request sent.
    pub fn last_request(&self) -> Option<Request> {
        self.state.requests.lock().last().cloned()
    }

    /// Clear the request log and counters.
    pub fn reset(&self) {
        self.state.requests.lock().clear();
        self.state.send_count.store(0, Ordering::SeqCst);
        *self.state.fault.lock() = None;
    }

    fn take_fault(&self, request: &Request) -> Option<StatusCode> {
        if request.kind().is_privileged() {
            return None;
        }
        let mut fault = self.state.fault.lock();
        match fault.as_mut() {
            Some((status, remaining)) if *remaining > 0 => {
                *remaining -= 1;
                Some(*status)
            }
            _ => None,
        }
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecureChannel for MockChannel {
    async fn send(&self, request: Request) -> UaResult<Response> {
        self.state.send_count.fetch_add(1, Ordering::SeqCst);
        self.state.requests.lock().push(request.clone());

        let fault = self.take_fault(&request);
        let latency = *self.state.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if let Some(status) = fault {
            return Ok(ServiceFault::new(status).into());
        }
        if let Some(response) = self.state.responses.lock().pop_front() {
            return Ok(response);
        }
        let responder = self.state.responder.lock().clone();
        match responder {
            Some(responder) => Ok(responder(&request)),
            None => Err(ChannelError::closed(format!(
                "No scripted response for {}",
                request.kind()
            ))
            .into()),
        }
    }

    fn is_open(&self) -> bool {
        self.state.open.load(Ordering::SeqCst)
    }

    fn channel_id(&self) -> u32 {
        self.state.channel_id.load(Ordering::SeqCst)
    }
}

/// Answers Read with the node ids as string values, Write with Good and
/// anything else with a `BadServiceUnsupported` fault.
pub fn echo_response(request: &Request) -> Response {
    match request {
        Request::Read(read) => ReadResponse {
            header: ResponseHeader::good(),
            results: Some(
                read.nodes_to_read
                    .iter()
                    .map(|n| DataValue::new(Variant::String(n.node_id.to_string())))
                    .collect(),
            ),
            diagnostic_infos: None,
        }
        .into(),
        Request::Write(write) => WriteResponse {
            header: ResponseHeader::good(),
            results: Some(vec![StatusCode::Good; write.nodes_to_write.len()]),
            diagnostic_infos: None,
        }
        .into(),
        _ => ServiceFault::new(StatusCode::BadServiceUnsupported).into(),
    }
}

// =============================================================================
// Mock Session Owner
// =============================================================================

/// A mock owning client.
///
/// Activation answers come from the scripted queue first; otherwise the
/// session keeps its id and gets a fresh authentication token
/// (`ns=1;i=3000 + n` for the n-th activation).
pub struct MockOwner {
    status: watch::Sender<OwnerStatus>,
    activation_results: Mutex<VecDeque<UaResult<SessionIdentity>>>,
    activation_delay: Mutex<Duration>,
    fail_close: AtomicBool,
    activation_count: AtomicU64,
    close_count: AtomicU64,
    last_user_identity: Mutex<Option<UserIdentity>>,
}

impl MockOwner {
    /// Create a connected owner.
    pub fn new() -> Self {
        let (status, _) = watch::channel(OwnerStatus::Connected);
        Self {
            status,
            activation_results: Mutex::new(VecDeque::new()),
            activation_delay: Mutex::new(Duration::ZERO),
            fail_close: AtomicBool::new(false),
            activation_count: AtomicU64::new(0),
            close_count: AtomicU64::new(0),
            last_user_identity: Mutex::new(None),
        }
    }

    /// Create a connected owner behind an `Arc`.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Report that the owner is reconnecting.
    pub fn set_reconnecting(&self) {
        self.status.send_replace(OwnerStatus::Reconnecting);
    }

    /// Report that the owner is connected again.
    pub fn set_connected(&self) {
        self.status.send_replace(OwnerStatus::Connected);
    }

    /// Report that the owner gave up.
    pub fn set_disconnected(&self) {
        self.status.send_replace(OwnerStatus::Disconnected);
    }

    /// Get the current status.
    pub fn status(&self) -> OwnerStatus {
        *self.status.borrow()
    }

    /// Queue the result of the next activation.
    pub fn script_activation(&self, result: UaResult<SessionIdentity>) {
        self.activation_results.lock().push_back(result);
    }

    /// Make the next activation fail with `status`.
    pub fn fail_next_activation(&self, status: StatusCode) {
        self.script_activation(Err(ServiceError::fault("ActivateSession", status).into()));
    }

    /// Set how long activations take.
    pub fn set_activation_delay(&self, delay: Duration) {
        *self.activation_delay.lock() = delay;
    }

    /// Make server-side close fail.
    pub fn fail_close(&self, fail: bool) {
        self.fail_close.store(fail, Ordering::SeqCst);
    }

    /// Get the activation count.
    pub fn activation_count(&self) -> u64 {
        self.activation_count.load(Ordering::SeqCst)
    }

    /// Get the close count.
    pub fn close_count(&self) -> u64 {
        self.close_count.load(Ordering::SeqCst)
    }

    /// Get the user identity passed to the last activation.
    pub fn last_user_identity(&self) -> Option<UserIdentity> {
        self.last_user_identity.lock().clone()
    }
}

impl Default for MockOwner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionOwner for MockOwner {
    async fn activate_session(
        &self,
        session: &ClientSession,
        identity: &UserIdentity,
    ) -> UaResult<SessionIdentity> {
        let n = self.activation_count.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_user_identity.lock() = Some(identity.clone());

        let delay = *self.activation_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.activation_results.lock().pop_front();
        match scripted {
            Some(result) => result,
            None => {
                let current = session.identity();
                Ok(SessionIdentity {
                    authentication_token: NodeId::numeric(1, 3000 + n as u32),
                    ..current
                })
            }
        }
    }

    async fn close_session(
        &self,
        _session: &ClientSession,
        _delete_subscriptions: bool,
    ) -> UaResult<()> {
        self.close_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_close.load(Ordering::SeqCst) {
            return Err(ServiceError::fault("CloseSession", StatusCode::BadCommunicationError).into());
        }
        Ok(())
    }

    fn restore_notifications(&self) -> watch::Receiver<OwnerStatus> {
        self.status.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ualink_session::messages::ReadRequest;
    use ualink_session::messages::ReadValueId;

    #[tokio::test]
    async fn test_mock_channel_precedence() {
        let channel = MockChannel::echoing();
        channel.respond(WriteResponse::default());
        channel.fail_next_with_invalid_session(1);

        let request: Request = ReadRequest {
            nodes_to_read: vec![ReadValueId::value_of(NodeId::SERVER)],
            ..Default::default()
        }
        .into();

        let first = channel.send(request.clone()).await.unwrap();
        assert!(matches!(first, Response::ServiceFault(_)));

        let second = channel.send(request.clone()).await.unwrap();
        assert!(matches!(second, Response::Write(_)));

        let third = channel.send(request).await.unwrap();
        match third {
            Response::Read(read) => {
                let value = read.results.unwrap().remove(0).value.unwrap();
                assert_eq!(value.as_str(), Some("i=2253"));
            }
            other => panic!("unexpected response {:?}", other),
        }
        assert_eq!(channel.send_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_channel_without_script_fails() {
        let channel = MockChannel::new();
        let result = channel.send(ReadRequest::default().into()).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_mock_owner_status() {
        let owner = MockOwner::new();
        let receiver = owner.restore_notifications();
        owner.set_reconnecting();
        assert!(receiver.borrow().is_reconnecting());
        assert!(owner.is_reconnecting());
        owner.set_connected();
        assert_eq!(owner.status(), OwnerStatus::Connected);
    }
}
