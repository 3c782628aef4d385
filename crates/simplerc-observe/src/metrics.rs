//! Operation counters for resource managers.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Counts operations performed against a resource manager.
///
/// Counters are independent atomics; a snapshot taken while other threads
/// are active is not a consistent cut across counters.
#[derive(Default)]
pub struct OperationMetrics {
    reads: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    removals: AtomicU64,
    forced_removals: AtomicU64,
    denials: AtomicU64,
}

impl OperationMetrics {
    /// Create a new set of zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a lookup. `hit` is false when the key was absent.
    pub fn record_read(&self, hit: bool) {
        self.reads.fetch_add(1, Ordering::Relaxed);
        if !hit {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a successful write.
    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record `count` checked removals.
    pub fn record_removals(&self, count: u64) {
        self.removals.fetch_add(count, Ordering::Relaxed);
    }

    /// Record `count` removals that bypassed the mutability check.
    pub fn record_forced_removals(&self, count: u64) {
        self.forced_removals.fetch_add(count, Ordering::Relaxed);
    }

    /// Record a mutation rejected by the mutability check.
    pub fn record_denial(&self) {
        self.denials.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the number of denied mutations.
    pub fn denials(&self) -> u64 {
        self.denials.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            reads: self.reads.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
            forced_removals: self.forced_removals.load(Ordering::Relaxed),
            denials: self.denials.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.reads.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.writes.store(0, Ordering::Relaxed);
        self.removals.store(0, Ordering::Relaxed);
        self.forced_removals.store(0, Ordering::Relaxed);
        self.denials.store(0, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for OperationMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("OperationMetrics")
            .field("reads", &snapshot.reads)
            .field("writes", &snapshot.writes)
            .field("denials", &snapshot.denials)
            .finish()
    }
}

/// Snapshot of operation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Lookups performed, including misses.
    pub reads: u64,
    /// Lookups against absent keys.
    pub misses: u64,
    /// Successful writes.
    pub writes: u64,
    /// Checked removals (delete, pop, clear).
    pub removals: u64,
    /// Removals that bypassed the mutability check.
    pub forced_removals: u64,
    /// Mutations rejected because the resource was immutable.
    pub denials: u64,
}

impl MetricsSnapshot {
    /// Fraction of lookups that found a resource, or `None` if there were no lookups.
    pub fn hit_ratio(&self) -> Option<f64> {
        if self.reads == 0 {
            return None;
        }
        Some((self.reads - self.misses) as f64 / self.reads as f64)
    }

    /// Total removals, checked and forced.
    pub fn total_removals(&self) -> u64 {
        self.removals + self.forced_removals
    }
}
