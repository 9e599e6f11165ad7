// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Unit test doubles: a scripted channel and an always-connected owner.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::client::{ClientSession, OwnerStatus, SecureChannel, SessionIdentity, SessionOwner};
use crate::config::{KeepAliveSettings, SessionConfig, UserIdentity};
use crate::error::{ChannelError, UaResult};
use crate::messages::{Request, Response};
use crate::types::NodeId;

/// Answers requests from a FIFO of prepared responses and records every
/// request it sees.
#[derive(Clone, Default)]
pub(crate) struct ScriptedChannel {
    responses: Arc<Mutex<VecDeque<Response>>>,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl ScriptedChannel {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, response: impl Into<Response>) {
        self.responses.lock().push_back(response.into());
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl SecureChannel for ScriptedChannel {
    async fn send(&self, request: Request) -> UaResult<Response> {
        self.requests.lock().push(request);
        self.responses
            .lock()
            .pop_front()
            .ok_or_else(|| ChannelError::NotOpen.into())
    }

    fn is_open(&self) -> bool {
        true
    }

    fn channel_id(&self) -> u32 {
        1
    }
}

/// Owner that stays connected and activates successfully.
pub(crate) struct StaticOwner {
    status: watch::Sender<OwnerStatus>,
}

impl StaticOwner {
    pub(crate) fn new() -> Self {
        let (status, _) = watch::channel(OwnerStatus::Connected);
        Self { status }
    }
}

#[async_trait]
impl SessionOwner for StaticOwner {
    async fn activate_session(
        &self,
        session: &ClientSession,
        _identity: &UserIdentity,
    ) -> UaResult<SessionIdentity> {
        Ok(session.identity())
    }

    async fn close_session(&self, _session: &ClientSession, _delete_subscriptions: bool) -> UaResult<()> {
        Ok(())
    }

    fn restore_notifications(&self) -> watch::Receiver<OwnerStatus> {
        self.status.subscribe()
    }
}

/// Builds a session over `channel` without keep-alive. The owner must
/// outlive the session.
pub(crate) fn session_with(channel: ScriptedChannel) -> (ClientSession, Arc<StaticOwner>) {
    let owner = Arc::new(StaticOwner::new());
    let mut config = SessionConfig::new("opc.tcp://localhost:4840");
    config.keep_alive = KeepAliveSettings::disabled();

    let identity = SessionIdentity::new(
        NodeId::numeric(1, 1001),
        NodeId::numeric(1, 2002),
        Duration::from_secs(60),
    );
    let session = ClientSession::builder(Arc::new(channel), owner.clone(), identity)
        .config(config)
        .build()
        .expect("test session");
    (session, owner)
}
