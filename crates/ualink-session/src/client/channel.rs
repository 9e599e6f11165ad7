// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Secure channel abstraction.
//!
//! The session never touches sockets or message encoding. It hands fully
//! built [`Request`]s to a [`SecureChannel`] and gets back a [`Response`]
//! or a channel error.

use async_trait::async_trait;

use crate::error::UaResult;
use crate::messages::{Request, Response};

/// A secure channel that carries one request/response exchange at a time
/// per call.
///
/// Implementations apply their own timeouts; the session adds none.
#[async_trait]
pub trait SecureChannel: Send + Sync {
    /// Sends a request and waits for its response.
    ///
    /// A server that rejects the whole service answers with
    /// [`Response::ServiceFault`]; channel implementations return that as
    /// `Ok` and let the session classify it.
    async fn send(&self, request: Request) -> UaResult<Response>;

    /// Returns `true` if the channel can currently carry requests.
    fn is_open(&self) -> bool;

    /// Returns the server-assigned channel id.
    fn channel_id(&self) -> u32;
}
