// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The owning client, as seen from a session.
//!
//! A session never creates itself. The client that created it stays
//! responsible for re-activating it during a repair, for closing it on the
//! server, and for reconnecting the secure channel. The session only needs
//! the narrow [`SessionOwner`] view of that client.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::ClientSession;
use crate::config::UserIdentity;
use crate::error::UaResult;
use crate::messages::SignatureData;
use crate::types::NodeId;

// =============================================================================
// OwnerStatus
// =============================================================================

/// Connection status published by the owning client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OwnerStatus {
    /// The secure channel is up and the session is usable.
    #[default]
    Connected,

    /// The owner is re-establishing the channel and session.
    Reconnecting,

    /// The owner gave up; the session will not be restored.
    Disconnected,
}

impl OwnerStatus {
    /// Returns `true` while the owner is reconnecting.
    #[inline]
    pub fn is_reconnecting(&self) -> bool {
        matches!(self, Self::Reconnecting)
    }

    /// Returns `true` if the owner is connected.
    #[inline]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns `true` if the owner gave up.
    #[inline]
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected)
    }
}

impl fmt::Display for OwnerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => write!(f, "Connected"),
            Self::Reconnecting => write!(f, "Reconnecting"),
            Self::Disconnected => write!(f, "Disconnected"),
        }
    }
}

// =============================================================================
// SessionIdentity
// =============================================================================

/// Server-assigned identity of an activated session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionIdentity {
    /// Session id.
    pub session_id: NodeId,

    /// Token placed in every request header.
    pub authentication_token: NodeId,

    /// Last nonce issued by the server.
    pub server_nonce: Vec<u8>,

    /// Server certificate (DER).
    pub server_certificate: Option<Vec<u8>>,

    /// Server signature from session creation.
    pub server_signature: Option<SignatureData>,

    /// Session lifetime as revised by the server.
    pub revised_timeout: Duration,
}

impl SessionIdentity {
    /// Creates an identity with the given ids and lifetime.
    pub fn new(session_id: NodeId, authentication_token: NodeId, revised_timeout: Duration) -> Self {
        Self {
            session_id,
            authentication_token,
            revised_timeout,
            ..Default::default()
        }
    }

    /// Sets the server nonce.
    pub fn with_server_nonce(mut self, nonce: Vec<u8>) -> Self {
        self.server_nonce = nonce;
        self
    }

    /// Sets the server certificate.
    pub fn with_server_certificate(mut self, certificate: Vec<u8>) -> Self {
        self.server_certificate = Some(certificate);
        self
    }
}

// =============================================================================
// SessionOwner
// =============================================================================

/// The client that owns a session.
///
/// Implementations hold their sessions strongly; sessions hold their
/// owner weakly.
#[async_trait]
pub trait SessionOwner: Send + Sync {
    /// Re-authenticates and re-activates `session` on the server, returning
    /// its new identity.
    ///
    /// Called by the repair coordinator. Implementations typically send an
    /// `ActivateSessionRequest` through [`ClientSession::transact`], which
    /// bypasses the pending queue.
    async fn activate_session(
        &self,
        session: &ClientSession,
        identity: &UserIdentity,
    ) -> UaResult<SessionIdentity>;

    /// Closes `session` on the server.
    async fn close_session(&self, session: &ClientSession, delete_subscriptions: bool)
        -> UaResult<()>;

    /// Returns a receiver for the owner's connection status.
    ///
    /// Every transition back to [`OwnerStatus::Connected`] counts as a
    /// "session restored" notification.
    fn restore_notifications(&self) -> watch::Receiver<OwnerStatus>;

    /// Returns `true` while the owner is reconnecting.
    fn is_reconnecting(&self) -> bool {
        self.restore_notifications().borrow().is_reconnecting()
    }
}
