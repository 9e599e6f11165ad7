// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Publish engine facade.
//!
//! The session does not run the publish loop itself. It tells its
//! [`PublishEngine`] about the subscriptions and monitored items it creates
//! or deletes, and terminates the engine when it closes.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::messages::CreateSubscriptionResponse;

// =============================================================================
// IDs
// =============================================================================

/// Server-assigned subscription id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(pub u32);

impl SubscriptionId {
    /// Returns the raw id value.
    #[inline]
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

impl From<u32> for SubscriptionId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

// =============================================================================
// SubscriptionRecord
// =============================================================================

/// What the session knows about one subscription it created.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionRecord {
    /// Subscription id.
    pub id: SubscriptionId,

    /// Revised publishing interval.
    pub publishing_interval: Duration,

    /// Revised lifetime count.
    pub lifetime_count: u32,

    /// Revised keep-alive count.
    pub keep_alive_count: u32,

    /// Publishing currently enabled.
    pub publishing_enabled: bool,

    /// Monitored items currently created in this subscription.
    pub monitored_items: usize,

    /// When the subscription was created or transferred in.
    pub created_at: DateTime<Utc>,
}

impl SubscriptionRecord {
    /// Builds a record from a CreateSubscription response.
    pub fn from_response(response: &CreateSubscriptionResponse, publishing_enabled: bool) -> Self {
        let interval_ms = response.revised_publishing_interval.max(0.0);
        Self {
            id: SubscriptionId(response.subscription_id),
            publishing_interval: Duration::from_secs_f64(interval_ms / 1000.0),
            lifetime_count: response.revised_lifetime_count,
            keep_alive_count: response.revised_max_keep_alive_count,
            publishing_enabled,
            monitored_items: 0,
            created_at: Utc::now(),
        }
    }

    /// Creates a record for a subscription transferred from another session.
    pub fn transferred(id: SubscriptionId) -> Self {
        Self {
            id,
            publishing_interval: Duration::ZERO,
            lifetime_count: 0,
            keep_alive_count: 0,
            publishing_enabled: true,
            monitored_items: 0,
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// PublishEngine
// =============================================================================

/// Receives subscription lifecycle notifications from a session.
pub trait PublishEngine: Send + Sync {
    /// A subscription was created.
    fn on_subscription_created(&self, record: SubscriptionRecord);

    /// Subscriptions were deleted.
    fn on_subscriptions_deleted(&self, ids: &[SubscriptionId]);

    /// Subscriptions were transferred into this session.
    fn on_subscriptions_transferred(&self, ids: &[SubscriptionId]) {
        let _ = ids;
    }

    /// Publishing was enabled or disabled.
    fn on_publishing_mode_changed(&self, ids: &[SubscriptionId], enabled: bool) {
        let _ = (ids, enabled);
    }

    /// Monitored items were created (`delta > 0`) or deleted (`delta < 0`).
    fn on_monitored_items_changed(&self, id: SubscriptionId, delta: isize) {
        let _ = (id, delta);
    }

    /// Stops the engine. Called once when the session closes.
    fn terminate(&self);

    /// Returns the number of live subscriptions.
    fn subscription_count(&self) -> usize;
}

// =============================================================================
// SubscriptionTracker
// =============================================================================

/// Default engine that records subscriptions and nothing else.
pub struct SubscriptionTracker {
    subscriptions: DashMap<SubscriptionId, SubscriptionRecord>,
    terminated: AtomicBool,
}

impl SubscriptionTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self {
            subscriptions: DashMap::new(),
            terminated: AtomicBool::new(false),
        }
    }

    /// Returns the record of a subscription.
    pub fn get(&self, id: SubscriptionId) -> Option<SubscriptionRecord> {
        self.subscriptions.get(&id).map(|r| r.value().clone())
    }

    /// Returns all subscription ids, sorted.
    pub fn ids(&self) -> Vec<SubscriptionId> {
        let mut ids: Vec<_> = self.subscriptions.iter().map(|r| *r.key()).collect();
        ids.sort();
        ids
    }

    /// Returns `true` once terminated.
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }
}

impl Default for SubscriptionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SubscriptionTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionTracker")
            .field("subscriptions", &self.subscriptions.len())
            .field("terminated", &self.is_terminated())
            .finish()
    }
}

impl PublishEngine for SubscriptionTracker {
    fn on_subscription_created(&self, record: SubscriptionRecord) {
        if self.is_terminated() {
            return;
        }
        tracing::debug!(subscription = %record.id, "Tracking subscription");
        self.subscriptions.insert(record.id, record);
    }

    fn on_subscriptions_deleted(&self, ids: &[SubscriptionId]) {
        for id in ids {
            self.subscriptions.remove(id);
        }
    }

    fn on_subscriptions_transferred(&self, ids: &[SubscriptionId]) {
        if self.is_terminated() {
            return;
        }
        for id in ids {
            self.subscriptions
                .entry(*id)
                .or_insert_with(|| SubscriptionRecord::transferred(*id));
        }
    }

    fn on_publishing_mode_changed(&self, ids: &[SubscriptionId], enabled: bool) {
        for id in ids {
            if let Some(mut record) = self.subscriptions.get_mut(id) {
                record.publishing_enabled = enabled;
            }
        }
    }

    fn on_monitored_items_changed(&self, id: SubscriptionId, delta: isize) {
        if let Some(mut record) = self.subscriptions.get_mut(&id) {
            record.monitored_items = record.monitored_items.saturating_add_signed(delta);
        }
    }

    fn terminate(&self) {
        if !self.terminated.swap(true, Ordering::AcqRel) {
            let count = self.subscriptions.len();
            self.subscriptions.clear();
            tracing::debug!(subscriptions = count, "Publish engine terminated");
        }
    }

    fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created(id: u32) -> SubscriptionRecord {
        SubscriptionRecord::from_response(
            &CreateSubscriptionResponse {
                subscription_id: id,
                revised_publishing_interval: 500.0,
                revised_lifetime_count: 30,
                revised_max_keep_alive_count: 5,
                ..Default::default()
            },
            true,
        )
    }

    #[test]
    fn test_tracks_lifecycle() {
        let tracker = SubscriptionTracker::new();
        tracker.on_subscription_created(created(1));
        tracker.on_subscription_created(created(2));
        tracker.on_monitored_items_changed(SubscriptionId(1), 3);
        tracker.on_monitored_items_changed(SubscriptionId(1), -1);
        tracker.on_publishing_mode_changed(&[SubscriptionId(2)], false);

        let first = tracker.get(SubscriptionId(1)).unwrap();
        assert_eq!(first.monitored_items, 2);
        assert_eq!(first.publishing_interval, Duration::from_millis(500));
        assert!(!tracker.get(SubscriptionId(2)).unwrap().publishing_enabled);

        tracker.on_subscriptions_deleted(&[SubscriptionId(1)]);
        assert_eq!(tracker.ids(), vec![SubscriptionId(2)]);
    }

    #[test]
    fn test_terminate_clears_and_ignores_new() {
        let tracker = SubscriptionTracker::default();
        tracker.on_subscription_created(created(7));
        tracker.terminate();
        tracker.terminate();
        assert_eq!(tracker.subscription_count(), 0);

        tracker.on_subscription_created(created(8));
        tracker.on_subscriptions_transferred(&[SubscriptionId(9)]);
        assert_eq!(tracker.subscription_count(), 0);
        assert!(tracker.is_terminated());
    }
}
