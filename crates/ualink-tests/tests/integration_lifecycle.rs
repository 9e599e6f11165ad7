// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Lifecycle Integration Tests
//!
//! Tests for session lifecycle and background machinery:
//!
//! - Close is idempotent and emits `session_closed` at most once
//! - Remaining lifetime follows the last request sent
//! - Keep-alive probing and failure reporting
//! - The callback facade
//!
//! ## Test Categories
//!
//! - `test_close_*`: Session close
//! - `test_lifetime_*`: Remaining lifetime
//! - `test_keepalive_*`: Keep-alive prober
//! - `test_callback_*`: Callback facade

use std::time::Duration;

use ualink_session::messages::CreateSubscriptionResponse;
use ualink_session::{
    DataValue, KeepAliveProber, KeepAliveSettings, ServerState, SessionEvent, StatusCode,
};
use ualink_tests::prelude::*;

// =============================================================================
// Close
// =============================================================================

#[tokio::test]
async fn test_close_is_idempotent() {
    init_test_logging();
    let harness = SessionHarness::echoing();
    let mut events = harness.session.subscribe();

    let (first, second) = tokio::join!(harness.session.close(true), harness.session.close(true));
    first.assert_ok();
    second.assert_ok();
    harness.session.close(false).await.assert_ok();

    assert!(harness.session.is_closed());
    assert_eq!(harness.owner.close_count(), 1);
    assert_eq!(harness.channel.send_count(), 0);
    assert_eq!(count_events(&mut events, "session_closed"), 1);
}

#[tokio::test]
async fn test_close_marks_closed_even_if_owner_fails() {
    init_test_logging();
    let harness = SessionHarness::echoing();
    let mut events = harness.session.subscribe();
    harness.owner.fail_close(true);

    harness
        .session
        .close(true)
        .await
        .assert_status(StatusCode::BadCommunicationError);

    assert!(harness.session.is_closed());
    assert_eq!(
        events.try_recv(),
        Some(SessionEvent::SessionClosed(StatusCode::BadCommunicationError))
    );

    harness.session.close(true).await.assert_ok();
    assert_eq!(harness.owner.close_count(), 1);
    harness.session.read("ns=2;s=A").await.assert_session_closed();
}

#[tokio::test]
async fn test_close_terminates_publish_engine() {
    init_test_logging();
    let harness = SessionHarness::echoing();
    harness.channel.respond(CreateSubscriptionResponse {
        subscription_id: 5,
        revised_publishing_interval: 500.0,
        ..Default::default()
    });

    let response = harness
        .session
        .create_subscription(Default::default())
        .await
        .assert_ok();
    assert_eq!(response.subscription_id, 5);
    assert_eq!(harness.session.publish_engine().subscription_count(), 1);

    harness.session.close(true).await.assert_ok();
    assert_eq!(harness.session.publish_engine().subscription_count(), 0);
}

// =============================================================================
// Lifetime
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_lifetime_follows_last_request() {
    init_test_logging();
    let harness = SessionHarness::echoing();
    assert_eq!(harness.session.timeout(), Duration::from_secs(60));
    assert_eq!(harness.session.evaluate_remaining_lifetime(), Duration::from_secs(60));

    tokio::time::advance(Duration::from_secs(20)).await;
    assert_eq!(harness.session.evaluate_remaining_lifetime(), Duration::from_secs(40));

    harness.session.read("ns=2;s=A").await.assert_ok();
    assert_eq!(harness.session.evaluate_remaining_lifetime(), Duration::from_secs(60));

    tokio::time::advance(Duration::from_secs(90)).await;
    assert_eq!(harness.session.evaluate_remaining_lifetime(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_lifetime_at_explicit_instant() {
    init_test_logging();
    let harness = SessionHarness::echoing();
    let sent = harness.session.last_request_sent();

    assert_eq!(
        harness.session.remaining_lifetime_at(sent + Duration::from_secs(45)),
        Duration::from_secs(15)
    );
    assert_eq!(
        harness.session.remaining_lifetime_at(sent + Duration::from_secs(600)),
        Duration::ZERO
    );
}

// =============================================================================
// Keep-Alive
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_keepalive_reports_server_state() {
    init_test_logging();
    let channel = MockChannel::new();
    channel.respond_with(|_| ResponseFixtures::server_state(0).into());
    let harness = SessionHarness::with_config(
        channel,
        ConfigFixtures::with_keep_alive(Duration::from_secs(1), 2),
    );
    let mut events = harness.session.subscribe();

    let first = expect_event(&mut events, Duration::from_secs(5), |e| {
        matches!(e, SessionEvent::KeepAlive { .. })
    })
    .await;
    assert_eq!(
        first,
        SessionEvent::KeepAlive {
            state: ServerState::Running,
            count: 1
        }
    );

    let second = expect_event(&mut events, Duration::from_secs(5), |e| {
        matches!(e, SessionEvent::KeepAlive { .. })
    })
    .await;
    assert_eq!(
        second,
        SessionEvent::KeepAlive {
            state: ServerState::Running,
            count: 2
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_keepalive_failure_emitted_once_at_threshold() {
    init_test_logging();
    let harness = SessionHarness::with_config(
        MockChannel::new(),
        ConfigFixtures::with_keep_alive(Duration::from_secs(1), 2),
    );
    harness.channel.set_open(false);
    let mut events = harness.session.subscribe();

    expect_event(&mut events, Duration::from_secs(10), |e| {
        *e == SessionEvent::KeepAliveFailure
    })
    .await;

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(count_events(&mut events, "keepalive_failure"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_keepalive_stops_on_close() {
    init_test_logging();
    let channel = MockChannel::new();
    channel.respond_with(|_| ResponseFixtures::server_state(0).into());
    let harness = SessionHarness::with_config(
        channel,
        ConfigFixtures::with_keep_alive(Duration::from_secs(1), 1),
    );

    tokio::time::sleep(Duration::from_millis(2500)).await;
    harness.session.close(true).await.assert_ok();
    let sent = harness.channel.send_count();
    assert_eq!(sent, 2);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(harness.channel.send_count(), sent);
}

#[tokio::test]
async fn test_keepalive_probe_on_demand() {
    init_test_logging();
    let harness = SessionHarness::new(MockChannel::new());
    harness.channel.respond(ResponseFixtures::server_state(4));
    harness
        .channel
        .respond(ResponseFixtures::read(vec![DataValue::with_status(
            StatusCode::BadNotReadable,
        )]));

    let settings = KeepAliveSettings {
        failure_threshold: 3,
        ..Default::default()
    };
    let mut prober = KeepAliveProber::for_session(&harness.session, settings);

    let state = prober.probe(&harness.session).await.assert_ok();
    assert_eq!(state, ServerState::Shutdown);
    assert_eq!(prober.count(), 1);

    prober
        .probe(&harness.session)
        .await
        .assert_status(StatusCode::BadNotReadable);
    assert_eq!(prober.consecutive_failures(), 1);
}

// =============================================================================
// Callback Facade
// =============================================================================

#[tokio::test]
async fn test_callback_receives_operation_result() {
    init_test_logging();
    let harness = SessionHarness::echoing();
    let (tx, rx) = tokio::sync::oneshot::channel();

    harness.session.with_callback(
        |s| async move { s.read("ns=2;s=Temperature").await },
        move |result| {
            let _ = tx.send(result);
        },
    );

    let value = rx.await.unwrap().assert_ok().into_one().unwrap();
    assert_eq!(value.value.unwrap().as_str(), Some("ns=2;s=Temperature"));
}

#[tokio::test]
async fn test_callback_receives_errors() {
    init_test_logging();
    let harness = SessionHarness::echoing();
    harness.session.close(true).await.assert_ok();

    let (tx, rx) = tokio::sync::oneshot::channel();
    let handle = harness.session.with_callback(
        |s| async move { s.write_single_node("ns=2;s=A", 1.0).await },
        move |result| {
            let _ = tx.send(result);
        },
    );

    handle.await.unwrap();
    rx.await.unwrap().assert_session_closed();
}
