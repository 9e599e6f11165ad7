// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Dispatcher Integration Tests
//!
//! Tests for the transaction dispatcher:
//!
//! - Closed sessions reject work without touching the channel
//! - Work submitted while the owner reconnects is queued and dispatched in
//!   submission order once the owner is connected again
//! - Privileged requests bypass the queue
//! - Queued work fails when the owner gives up
//! - The queue restarts even when a reconnection is only seen as Connected
//!
//! ## Test Categories
//!
//! - `test_closed_*`: Closed-session short circuit
//! - `test_queue_*`: Pending queue behavior
//! - `test_privileged_*`: Queue bypass
//! - `test_send_*`: Header stamping and channel errors

use std::time::Duration;

use ualink_session::messages::{PublishResponse, Request, RequestKind};
use ualink_session::{ChannelError, SessionError, SessionEvent, StatusCode, UaError};
use ualink_tests::prelude::*;

fn read_node(request: &Request) -> String {
    match request {
        Request::Read(read) => read.nodes_to_read[0].node_id.to_string(),
        other => panic!("expected a Read request, got {}", other.kind()),
    }
}

// =============================================================================
// Closed Session
// =============================================================================

#[tokio::test]
async fn test_closed_session_rejects_without_network() {
    init_test_logging();
    let harness = SessionHarness::echoing();

    harness.session.close(true).await.assert_ok();
    harness.session.read("ns=2;s=Temperature").await.assert_session_closed();
    harness
        .session
        .write_single_node("ns=2;s=Setpoint", 20.0)
        .await
        .assert_session_closed();

    assert_eq!(harness.channel.send_count(), 0);
}

// =============================================================================
// Pending Queue
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_queue_dispatches_in_submission_order() {
    init_test_logging();
    let harness = SessionHarness::echoing();
    harness.owner.set_reconnecting();

    let s = harness.session.clone();
    let first = tokio::spawn(async move { s.read("ns=2;s=A").await });
    harness.wait_for_pending(1).await;

    let s = harness.session.clone();
    let second = tokio::spawn(async move { s.write_single_node("ns=2;s=B", 1.5).await });
    harness.wait_for_pending(2).await;

    let s = harness.session.clone();
    let third = tokio::spawn(async move { s.read("ns=2;s=C").await });
    harness.wait_for_pending(3).await;

    assert_eq!(harness.channel.send_count(), 0, "nothing may be sent while reconnecting");

    harness.owner.set_connected();

    let first = first.await.unwrap().assert_ok().into_one().unwrap();
    let second = second.await.unwrap().assert_ok();
    let third = third.await.unwrap().assert_ok().into_one().unwrap();

    assert_eq!(first.value.unwrap().as_str(), Some("ns=2;s=A"));
    assert_eq!(second, StatusCode::Good);
    assert_eq!(third.value.unwrap().as_str(), Some("ns=2;s=C"));

    let requests = harness.channel.requests();
    assert_request_order(&requests, &[RequestKind::Read, RequestKind::Write, RequestKind::Read]);
    assert_eq!(read_node(&requests[0]), "ns=2;s=A");
    assert_eq!(read_node(&requests[2]), "ns=2;s=C");
    assert_handles_increasing(&requests);
    assert_eq!(harness.session.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_queue_stays_engaged_until_drained() {
    init_test_logging();
    let harness = SessionHarness::echoing();
    harness.channel.set_latency(Duration::from_millis(20));
    harness.owner.set_reconnecting();

    let mut handles = Vec::new();
    for (i, node) in ["ns=2;s=Q1", "ns=2;s=Q2"].into_iter().enumerate() {
        let s = harness.session.clone();
        handles.push(tokio::spawn(async move { s.read(node).await }));
        harness.wait_for_pending(i + 1).await;
    }

    harness.owner.set_connected();

    // Submitted after the owner is back but while the queue still holds
    // work, so it must line up behind Q1 and Q2.
    let s = harness.session.clone();
    handles.push(tokio::spawn(async move { s.read("ns=2;s=Late").await }));

    for handle in handles {
        handle.await.unwrap().assert_ok();
    }

    let nodes: Vec<String> = harness.channel.requests().iter().map(read_node).collect();
    assert_eq!(nodes, vec!["ns=2;s=Q1", "ns=2;s=Q2", "ns=2;s=Late"]);
    assert_eq!(harness.session.stats().queued(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_queue_emits_depth_events() {
    init_test_logging();
    let harness = SessionHarness::echoing();
    let mut events = harness.session.subscribe();
    harness.owner.set_reconnecting();

    let mut handles = Vec::new();
    for i in 0..2 {
        let s = harness.session.clone();
        handles.push(tokio::spawn(async move { s.read("i=2259").await }));
        harness.wait_for_pending(i + 1).await;
    }

    let queued: Vec<SessionEvent> = events
        .drain()
        .into_iter()
        .filter(|e| matches!(e, SessionEvent::TransactionQueued { .. }))
        .collect();
    assert_eq!(
        queued,
        vec![
            SessionEvent::TransactionQueued { depth: 1 },
            SessionEvent::TransactionQueued { depth: 2 },
        ]
    );

    harness.owner.set_connected();
    expect_event(&mut events, Duration::from_secs(1), |e| {
        *e == SessionEvent::SessionRestored
    })
    .await;
    for handle in handles {
        handle.await.unwrap().assert_ok();
    }
}

#[tokio::test(start_paused = true)]
async fn test_queue_aborted_when_owner_gives_up() {
    init_test_logging();
    let harness = SessionHarness::echoing();
    harness.owner.set_reconnecting();

    let s = harness.session.clone();
    let pending = tokio::spawn(async move { s.read("ns=2;s=A").await });
    harness.wait_for_pending(1).await;

    harness.owner.set_disconnected();

    pending
        .await
        .unwrap()
        .assert_session_error(|e| matches!(e, SessionError::OwnerGone));
    assert_eq!(harness.channel.send_count(), 0);
    assert_eq!(harness.session.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_queue_fails_with_session_closed_on_close() {
    init_test_logging();
    let harness = SessionHarness::echoing();
    harness.owner.set_reconnecting();

    let s = harness.session.clone();
    let pending = tokio::spawn(async move { s.read("ns=2;s=A").await });
    harness.wait_for_pending(1).await;

    harness.session.close(false).await.assert_ok();

    pending.await.unwrap().assert_session_closed();
    assert_eq!(harness.channel.send_count(), 0);
}

/// Queues a read while the owner reconnects, then flips the owner back to
/// Connected without yielding, so the owner watcher only ever observes
/// Connected.
async fn drain_after_merged_transition(watcher_started: bool) {
    init_test_logging();
    let harness = SessionHarness::echoing();
    if watcher_started {
        tokio::task::yield_now().await;
    }

    harness.owner.set_reconnecting();
    let read = harness.session.read("ns=2;s=A");
    tokio::pin!(read);
    assert!(futures::poll!(read.as_mut()).is_pending());
    assert_eq!(harness.session.pending_count(), 1);

    harness.owner.set_connected();

    let value = ualink_tests::assert_completes_within!(Duration::from_secs(2), read)
        .assert_ok()
        .into_one()
        .unwrap();
    assert_eq!(value.value.unwrap().as_str(), Some("ns=2;s=A"));
    assert_eq!(harness.channel.send_count(), 1);
    assert_eq!(harness.session.pending_count(), 0);
}

#[tokio::test]
async fn test_queue_drains_after_merged_owner_transition() {
    drain_after_merged_transition(true).await;
}

#[tokio::test]
async fn test_queue_drains_when_reconnect_ends_before_watcher_runs() {
    drain_after_merged_transition(false).await;
}

// =============================================================================
// Privileged Requests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_privileged_publish_bypasses_queue() {
    init_test_logging();
    let harness = SessionHarness::echoing();
    harness.channel.respond(PublishResponse {
        subscription_id: 7,
        ..Default::default()
    });
    harness.owner.set_reconnecting();

    let s = harness.session.clone();
    let queued = tokio::spawn(async move { s.read("ns=2;s=A").await });
    harness.wait_for_pending(1).await;

    let response = harness.session.publish(Vec::new()).await.assert_ok();
    assert_eq!(response.subscription_id, 7);
    assert_eq!(response.results, Some(vec![]));
    assert_eq!(harness.channel.request_kinds(), vec![RequestKind::Publish]);
    assert_eq!(harness.session.pending_count(), 1);

    harness.owner.set_connected();
    queued.await.unwrap().assert_ok();
}

// =============================================================================
// Send Path
// =============================================================================

#[tokio::test]
async fn test_send_stamps_current_identity() {
    init_test_logging();
    let harness = SessionHarness::echoing();

    harness.session.read("ns=2;s=A").await.assert_ok();

    let request = harness.channel.last_request().unwrap();
    assert_eq!(request.header().authentication_token, IdentityFixtures::token());
    assert_eq!(request.header().timeout_hint, 10_000);
    assert!(request.header().timestamp.is_some());
    assert!(harness.session.last_response_received().is_some());
}

#[tokio::test]
async fn test_send_on_closed_channel_fails() {
    init_test_logging();
    let harness = SessionHarness::echoing();
    harness.channel.set_open(false);

    let error = harness.session.read("ns=2;s=A").await.assert_err();
    assert!(matches!(error, UaError::Channel(ChannelError::NotOpen)));
    assert_eq!(harness.channel.send_count(), 0);
    assert_eq!(harness.session.stats().failed(), 1);
}

#[tokio::test]
async fn test_send_other_faults_are_not_repaired() {
    init_test_logging();
    let harness = SessionHarness::echoing();
    harness.channel.inject_fault(StatusCode::BadTooManyOperations, 1);

    harness
        .session
        .read("ns=2;s=A")
        .await
        .assert_status(StatusCode::BadTooManyOperations);

    assert_eq!(harness.owner.activation_count(), 0);
    assert_eq!(harness.channel.send_count(), 1);
}
