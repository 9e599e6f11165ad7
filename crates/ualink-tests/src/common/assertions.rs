// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Custom Test Assertions
//!
//! Session-specific assertion helpers with informative failure messages.

use std::fmt::Debug;
use std::time::Duration;

use ualink_session::messages::{Request, RequestKind};
use ualink_session::{
    EventSubscriber, InternalError, SessionError, SessionEvent, StatusCode, UaError, UaResult,
};

// =============================================================================
// Error Assertions
// =============================================================================

/// Assertion extensions for session results.
pub trait UaResultAssertions<T> {
    /// Assert that the result is Ok and return the value.
    fn assert_ok(self) -> T;

    /// Assert that the result is Err and return the error.
    fn assert_err(self) -> UaError;

    /// Assert that the call failed because the session is closed.
    fn assert_session_closed(self);

    /// Assert that the call failed with a session error matching `predicate`.
    fn assert_session_error<F>(self, predicate: F)
    where
        F: FnOnce(&SessionError) -> bool;

    /// Assert that the call failed with the given status code.
    fn assert_status(self, expected: StatusCode);

    /// Assert that the call failed because the result array was too long.
    fn assert_length_mismatch(self, expected: usize, actual: usize);
}

impl<T: Debug> UaResultAssertions<T> for UaResult<T> {
    fn assert_ok(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, but got Err: {}", e),
        }
    }

    fn assert_err(self) -> UaError {
        match self {
            Ok(v) => panic!("Expected Err, but got Ok: {:?}", v),
            Err(e) => e,
        }
    }

    fn assert_session_closed(self) {
        let error = self.assert_err();
        assert!(
            matches!(error, UaError::Session(SessionError::Closed)),
            "Expected SessionClosed, but got: {:?}",
            error
        );
    }

    fn assert_session_error<F>(self, predicate: F)
    where
        F: FnOnce(&SessionError) -> bool,
    {
        match self.assert_err() {
            UaError::Session(e) => assert!(predicate(&e), "Session error did not match: {:?}", e),
            other => panic!("Expected a session error, but got: {:?}", other),
        }
    }

    fn assert_status(self, expected: StatusCode) {
        let error = self.assert_err();
        assert_eq!(
            error.status_code(),
            expected,
            "Unexpected status for error: {}",
            error
        );
    }

    fn assert_length_mismatch(self, expected: usize, actual: usize) {
        match self.assert_err() {
            UaError::Internal(InternalError::LengthMismatch {
                expected: e,
                actual: a,
                ..
            }) => {
                assert_eq!((e, a), (expected, actual), "Length mismatch values differ");
            }
            other => panic!("Expected a length mismatch, but got: {:?}", other),
        }
    }
}

// =============================================================================
// Request Log Assertions
// =============================================================================

/// Assert that the channel saw exactly the given request kinds, in order.
pub fn assert_request_order(requests: &[Request], expected: &[RequestKind]) {
    let actual: Vec<RequestKind> = requests.iter().map(Request::kind).collect();
    assert_eq!(actual, expected, "Requests reached the channel out of order");
}

/// Assert that request handles strictly increase in send order.
pub fn assert_handles_increasing(requests: &[Request]) {
    for pair in requests.windows(2) {
        let (a, b) = (pair[0].header().request_handle, pair[1].header().request_handle);
        assert!(a < b, "Request handle {} was sent after {}", b, a);
    }
}

// =============================================================================
// Event Assertions
// =============================================================================

/// Wait for the first event matching `predicate`, skipping others.
pub async fn expect_event<F>(
    events: &mut EventSubscriber,
    timeout: Duration,
    mut predicate: F,
) -> SessionEvent
where
    F: FnMut(&SessionEvent) -> bool,
{
    let wait = async {
        loop {
            match events.recv().await {
                Ok(event) if predicate(&event) => return event,
                Ok(_) => continue,
                Err(e) => panic!("Event channel closed: {}", e),
            }
        }
    };
    match tokio::time::timeout(timeout, wait).await {
        Ok(event) => event,
        Err(_) => panic!("No matching session event within {:?}", timeout),
    }
}

/// Count buffered events with the given name.
pub fn count_events(events: &mut EventSubscriber, name: &str) -> usize {
    events.drain().iter().filter(|e| e.name() == name).count()
}

// =============================================================================
// Macro Assertions
// =============================================================================

/// Assert that an async operation completes within a timeout.
#[macro_export]
macro_rules! assert_completes_within {
    ($timeout:expr, $future:expr) => {{
        match tokio::time::timeout($timeout, $future).await {
            Ok(result) => result,
            Err(_) => panic!("Operation did not complete within {:?}", $timeout),
        }
    }};
}

/// Assert that an async operation is still pending after a delay.
#[macro_export]
macro_rules! assert_still_pending {
    ($delay:expr, $handle:expr) => {{
        tokio::time::sleep($delay).await;
        assert!(!$handle.is_finished(), "Operation completed too early");
    }};
}
