// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Repair Integration Tests
//!
//! Tests for the repair coordinator:
//!
//! - Repair and replay after the server reports the session invalid
//! - At most one repair per session at a time
//! - Queued work after a failed repair, per [`RepairFailurePolicy`]
//! - Bounded waiting for an owner-driven restore
//!
//! ## Test Categories
//!
//! - `test_repair_*`: Session recreation through the owner
//! - `test_restore_*`: Waiting for the owner's reconnection

use std::time::Duration;

use ualink_session::messages::{Request, RequestKind};
use ualink_session::{RepairFailurePolicy, SessionError, SessionEvent, StatusCode, UaError};
use ualink_tests::prelude::*;

async fn wait_for_repair(harness: &SessionHarness) {
    for _ in 0..1000 {
        if harness.session.repair_state().is_repairing() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("Repair never started");
}

// =============================================================================
// Repair
// =============================================================================

#[tokio::test]
async fn test_repair_replays_failed_write() {
    init_test_logging();
    let harness = SessionHarness::echoing();
    let mut events = harness.session.subscribe();
    harness.channel.fail_next_with_invalid_session(1);

    let status = harness
        .session
        .write_single_node("ns=2;s=Setpoint", 42.0)
        .await
        .assert_ok();

    assert_eq!(status, StatusCode::Good);
    assert_eq!(harness.owner.activation_count(), 1);

    let requests = harness.channel.requests();
    assert_request_order(&requests, &[RequestKind::Write, RequestKind::Write]);
    assert_eq!(requests[0].header().authentication_token, IdentityFixtures::token());
    assert_eq!(
        requests[1].header().authentication_token,
        IdentityFixtures::renewed_token(1)
    );
    match (&requests[0], &requests[1]) {
        (Request::Write(a), Request::Write(b)) => assert_eq!(a.nodes_to_write, b.nodes_to_write),
        _ => unreachable!(),
    }
    assert_eq!(
        harness.session.authentication_token(),
        IdentityFixtures::renewed_token(1)
    );

    let names: Vec<&str> = events.drain().iter().map(SessionEvent::name).collect();
    assert_eq!(names, vec!["repair_started", "session_restored"]);

    let stats = harness.session.stats().snapshot();
    assert_eq!(stats.repairs_started, 1);
    assert_eq!(stats.repairs_succeeded, 1);
}

#[tokio::test]
async fn test_repair_presents_configured_user_identity() {
    init_test_logging();
    let mut config = ConfigFixtures::session_config();
    config.user_identity = ualink_session::UserIdentity::UserName {
        username: "operator".to_string(),
        password: "secret".to_string(),
    };
    let harness = SessionHarness::with_config(MockChannel::echoing(), config);
    harness.channel.fail_next_with_invalid_session(1);

    harness.session.read("ns=2;s=A").await.assert_ok();

    assert_eq!(
        harness.owner.last_user_identity().map(|u| u.type_name()),
        Some("UserName")
    );
}

#[tokio::test]
async fn test_repair_replay_failure_is_not_retried() {
    init_test_logging();
    let harness = SessionHarness::echoing();
    harness.channel.fail_next_with_invalid_session(2);

    harness
        .session
        .read("ns=2;s=A")
        .await
        .assert_status(StatusCode::BadSessionIdInvalid);

    assert_eq!(harness.owner.activation_count(), 1);
    assert_eq!(harness.channel.send_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_repair_is_single_flight() {
    init_test_logging();
    let harness = SessionHarness::echoing();
    harness.channel.set_latency(Duration::from_millis(50));
    harness.channel.fail_next_with_invalid_session(2);
    harness.owner.set_activation_delay(Duration::from_millis(100));

    let a = harness.session.clone();
    let b = harness.session.clone();
    let first = tokio::spawn(async move { a.write_single_node("ns=2;s=A", 1.0).await });
    let second = tokio::spawn(async move { b.write_single_node("ns=2;s=B", 2.0).await });

    let results = [first.await.unwrap(), second.await.unwrap()];
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| {
            matches!(
                r,
                Err(UaError::Session(SessionError::CannotRecreateSession))
            )
        })
        .count();

    assert_eq!((succeeded, rejected), (1, 1));
    assert_eq!(harness.owner.activation_count(), 1);
    assert!(!harness.session.repair_state().is_repairing());
}

#[tokio::test(start_paused = true)]
async fn test_repair_guard_held_through_replay() {
    init_test_logging();
    let harness = SessionHarness::echoing();
    harness.channel.set_latency(Duration::from_millis(50));
    harness.channel.fail_next_with_invalid_session(2);

    // A fails at 50ms and replays from 50ms to 100ms. B was sent at 40ms and
    // fails at 90ms, while the replay is still in flight.
    let a = harness.session.clone();
    let first = tokio::spawn(async move { a.write_single_node("ns=2;s=A", 1.0).await });
    tokio::time::sleep(Duration::from_millis(40)).await;
    let b = harness.session.clone();
    let second = tokio::spawn(async move { b.read("ns=2;s=B").await });

    assert_eq!(first.await.unwrap().assert_ok(), StatusCode::Good);
    second
        .await
        .unwrap()
        .assert_session_error(|e| matches!(e, SessionError::CannotRecreateSession));

    assert_eq!(harness.owner.activation_count(), 1);
    assert_eq!(harness.channel.send_count(), 3);
    assert!(!harness.session.repair_state().is_repairing());
}

#[tokio::test(start_paused = true)]
async fn test_repair_restarts_queue_when_caller_gives_up() {
    init_test_logging();
    let harness = SessionHarness::echoing();
    harness.channel.fail_next_with_invalid_session(1);
    harness.owner.set_activation_delay(Duration::from_millis(200));

    let s = harness.session.clone();
    let trigger = tokio::spawn(async move {
        tokio::time::timeout(
            Duration::from_millis(50),
            s.write_single_node("ns=2;s=A", 1.0),
        )
        .await
    });
    wait_for_repair(&harness).await;

    let s = harness.session.clone();
    let queued = tokio::spawn(async move { s.read("ns=2;s=B").await });
    harness.wait_for_pending(1).await;

    assert!(trigger.await.unwrap().is_err(), "caller should time out mid-repair");

    let value = ualink_tests::assert_completes_within!(Duration::from_secs(2), queued)
        .unwrap()
        .assert_ok()
        .into_one()
        .unwrap();
    assert_eq!(value.value.unwrap().as_str(), Some("ns=2;s=B"));
    assert!(!harness.session.repair_state().is_repairing());
    assert_eq!(harness.session.pending_count(), 0);
}

#[tokio::test]
async fn test_repair_skipped_for_privileged_requests() {
    init_test_logging();
    let harness = SessionHarness::echoing();
    harness.channel.respond(ResponseFixtures::invalid_session());

    harness
        .session
        .publish(Vec::new())
        .await
        .assert_status(StatusCode::BadSessionIdInvalid);

    assert_eq!(harness.owner.activation_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_repair_failure_retains_queue() {
    init_test_logging();
    let harness = SessionHarness::with_config(
        MockChannel::echoing(),
        ConfigFixtures::with_repair_policy(RepairFailurePolicy::Retain),
    );
    let mut events = harness.session.subscribe();
    harness.channel.fail_next_with_invalid_session(1);
    harness.owner.set_activation_delay(Duration::from_millis(100));
    harness
        .owner
        .fail_next_activation(StatusCode::BadIdentityTokenRejected);

    let s = harness.session.clone();
    let trigger = tokio::spawn(async move { s.write_single_node("ns=2;s=A", 1.0).await });
    wait_for_repair(&harness).await;

    let s = harness.session.clone();
    let queued = tokio::spawn(async move { s.read("ns=2;s=B").await });
    harness.wait_for_pending(1).await;

    trigger
        .await
        .unwrap()
        .assert_status(StatusCode::BadIdentityTokenRejected);
    let value = queued.await.unwrap().assert_ok().into_one().unwrap();
    assert_eq!(value.value.unwrap().as_str(), Some("ns=2;s=B"));

    assert_request_order(
        &harness.channel.requests(),
        &[RequestKind::Write, RequestKind::Read],
    );
    expect_event(&mut events, Duration::from_secs(1), |e| {
        *e == SessionEvent::RepairFailed(StatusCode::BadIdentityTokenRejected)
    })
    .await;
    assert_eq!(harness.session.stats().repairs_failed(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_repair_failure_fails_queue() {
    init_test_logging();
    let harness = SessionHarness::with_config(
        MockChannel::echoing(),
        ConfigFixtures::with_repair_policy(RepairFailurePolicy::FailAll),
    );
    harness.channel.fail_next_with_invalid_session(1);
    harness.owner.set_activation_delay(Duration::from_millis(100));
    harness
        .owner
        .fail_next_activation(StatusCode::BadIdentityTokenRejected);

    let s = harness.session.clone();
    let trigger = tokio::spawn(async move { s.write_single_node("ns=2;s=A", 1.0).await });
    wait_for_repair(&harness).await;

    let mut queued = Vec::new();
    for (i, node) in ["ns=2;s=B", "ns=2;s=C"].into_iter().enumerate() {
        let s = harness.session.clone();
        queued.push(tokio::spawn(async move { s.read(node).await }));
        harness.wait_for_pending(i + 1).await;
    }

    trigger
        .await
        .unwrap()
        .assert_status(StatusCode::BadIdentityTokenRejected);
    for handle in queued {
        handle
            .await
            .unwrap()
            .assert_session_error(|e| matches!(e, SessionError::QueueAborted { .. }));
    }

    assert_eq!(harness.channel.send_count(), 1);
    assert_eq!(harness.session.pending_count(), 0);
}

// =============================================================================
// Owner-Driven Restore
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_restore_waits_for_owner_then_replays() {
    init_test_logging();
    let harness = SessionHarness::echoing();
    harness.channel.set_latency(Duration::from_millis(50));
    harness.channel.fail_next_with_invalid_session(1);

    let s = harness.session.clone();
    let handle = tokio::spawn(async move { s.read("ns=2;s=A").await });

    tokio::time::sleep(Duration::from_millis(10)).await;
    harness.owner.set_reconnecting();
    ualink_tests::assert_still_pending!(Duration::from_millis(100), handle);

    harness.owner.set_connected();
    let value = handle.await.unwrap().assert_ok().into_one().unwrap();

    assert_eq!(value.value.unwrap().as_str(), Some("ns=2;s=A"));
    assert_eq!(harness.owner.activation_count(), 0);
    assert_eq!(harness.channel.send_count(), 2);
    assert_eq!(harness.session.stats().restore_waits(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_restore_wait_times_out() {
    init_test_logging();
    let harness = SessionHarness::with_config(
        MockChannel::echoing(),
        ConfigFixtures::with_restore_limits(5, Duration::from_secs(1)),
    );
    harness.channel.set_latency(Duration::from_millis(50));
    harness.channel.fail_next_with_invalid_session(1);

    let s = harness.session.clone();
    let handle = tokio::spawn(async move { s.read("ns=2;s=A").await });
    tokio::time::sleep(Duration::from_millis(10)).await;
    harness.owner.set_reconnecting();

    handle
        .await
        .unwrap()
        .assert_session_error(|e| matches!(e, SessionError::RestoreWaitTimedOut { .. }));
    assert_eq!(harness.channel.send_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_restore_attempts_are_bounded() {
    init_test_logging();
    let harness = SessionHarness::with_config(
        MockChannel::echoing(),
        ConfigFixtures::with_restore_limits(1, Duration::from_secs(30)),
    );
    harness.channel.set_latency(Duration::from_millis(50));
    harness.channel.fail_next_with_invalid_session(2);

    let s = harness.session.clone();
    let handle = tokio::spawn(async move { s.read("ns=2;s=A").await });

    tokio::time::sleep(Duration::from_millis(10)).await;
    harness.owner.set_reconnecting();
    tokio::time::sleep(Duration::from_millis(90)).await;
    harness.owner.set_connected();
    tokio::time::sleep(Duration::from_millis(10)).await;
    harness.owner.set_reconnecting();

    handle.await.unwrap().assert_session_error(|e| {
        matches!(e, SessionError::RestoreAttemptsExhausted { attempts: 1 })
    });
    assert_eq!(harness.channel.send_count(), 2);
    assert_eq!(harness.owner.activation_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_restore_fails_when_owner_disconnects() {
    init_test_logging();
    let harness = SessionHarness::echoing();
    harness.channel.set_latency(Duration::from_millis(50));
    harness.channel.fail_next_with_invalid_session(1);

    let s = harness.session.clone();
    let handle = tokio::spawn(async move { s.read("ns=2;s=A").await });
    tokio::time::sleep(Duration::from_millis(10)).await;
    harness.owner.set_reconnecting();
    tokio::time::sleep(Duration::from_millis(100)).await;
    harness.owner.set_disconnected();

    handle
        .await
        .unwrap()
        .assert_session_error(|e| matches!(e, SessionError::OwnerGone));
}
