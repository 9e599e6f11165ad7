// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Per-session transaction and repair counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// =============================================================================
// SessionStats
// =============================================================================

/// Statistics for transactions dispatched through a session.
#[derive(Debug)]
pub struct SessionStats {
    /// Requests handed to the secure channel, replays included.
    sent: AtomicU64,

    /// Transactions that had to wait in the pending queue.
    queued: AtomicU64,

    /// Transactions that completed with a response.
    completed: AtomicU64,

    /// Transactions that completed with an error.
    failed: AtomicU64,

    /// Repairs started.
    repairs_started: AtomicU64,

    /// Repairs that re-activated the session.
    repairs_succeeded: AtomicU64,

    /// Repairs that failed.
    repairs_failed: AtomicU64,

    /// Times a transaction waited for the owner to restore the session.
    restore_waits: AtomicU64,
}

impl SessionStats {
    /// Creates zeroed statistics.
    pub fn new() -> Self {
        Self {
            sent: AtomicU64::new(0),
            queued: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            repairs_started: AtomicU64::new(0),
            repairs_succeeded: AtomicU64::new(0),
            repairs_failed: AtomicU64::new(0),
            restore_waits: AtomicU64::new(0),
        }
    }

    /// Records a request handed to the channel.
    pub fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a queued transaction.
    pub fn record_queued(&self) {
        self.queued.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a transaction outcome.
    pub fn record_outcome(&self, success: bool) {
        if success {
            self.completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records a repair start.
    pub fn record_repair_started(&self) {
        self.repairs_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a repair outcome.
    pub fn record_repair_outcome(&self, success: bool) {
        if success {
            self.repairs_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.repairs_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records a wait for an owner-driven restore.
    pub fn record_restore_wait(&self) {
        self.restore_waits.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of requests sent.
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// Returns the number of queued transactions.
    pub fn queued(&self) -> u64 {
        self.queued.load(Ordering::Relaxed)
    }

    /// Returns the number of completed transactions.
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Returns the number of failed transactions.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Returns the number of repairs started.
    pub fn repairs_started(&self) -> u64 {
        self.repairs_started.load(Ordering::Relaxed)
    }

    /// Returns the number of successful repairs.
    pub fn repairs_succeeded(&self) -> u64 {
        self.repairs_succeeded.load(Ordering::Relaxed)
    }

    /// Returns the number of failed repairs.
    pub fn repairs_failed(&self) -> u64 {
        self.repairs_failed.load(Ordering::Relaxed)
    }

    /// Returns the number of restore waits.
    pub fn restore_waits(&self) -> u64 {
        self.restore_waits.load(Ordering::Relaxed)
    }

    /// Takes a point-in-time copy of every counter.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            sent: self.sent(),
            queued: self.queued(),
            completed: self.completed(),
            failed: self.failed(),
            repairs_started: self.repairs_started(),
            repairs_succeeded: self.repairs_succeeded(),
            repairs_failed: self.repairs_failed(),
            restore_waits: self.restore_waits(),
        }
    }

    /// Resets all statistics.
    pub fn reset(&self) {
        self.sent.store(0, Ordering::Relaxed);
        self.queued.store(0, Ordering::Relaxed);
        self.completed.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
        self.repairs_started.store(0, Ordering::Relaxed);
        self.repairs_succeeded.store(0, Ordering::Relaxed);
        self.repairs_failed.store(0, Ordering::Relaxed);
        self.restore_waits.store(0, Ordering::Relaxed);
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// A copy of [`SessionStats`] at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatsSnapshot {
    /// Requests written to the channel, replays included.
    pub sent: u64,
    /// Transactions that went through the pending queue.
    pub queued: u64,
    /// Transactions that completed successfully.
    pub completed: u64,
    /// Transactions that failed.
    pub failed: u64,
    /// Repairs started.
    pub repairs_started: u64,
    /// Repairs that reactivated the session.
    pub repairs_succeeded: u64,
    /// Repairs that failed.
    pub repairs_failed: u64,
    /// Waits for an owner-driven restore.
    pub restore_waits: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = SessionStats::new();
        stats.record_sent();
        stats.record_sent();
        stats.record_queued();
        stats.record_outcome(true);
        stats.record_outcome(false);
        stats.record_repair_started();
        stats.record_repair_outcome(true);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.sent, 2);
        assert_eq!(snapshot.queued, 1);
        assert_eq!(snapshot.completed, 1);
        assert_eq!(snapshot.failed, 1);
        assert_eq!(snapshot.repairs_succeeded, 1);
        assert_eq!(snapshot.repairs_failed, 0);
    }

    #[test]
    fn test_reset() {
        let stats = SessionStats::default();
        stats.record_restore_wait();
        stats.record_repair_outcome(false);
        stats.reset();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }
}
