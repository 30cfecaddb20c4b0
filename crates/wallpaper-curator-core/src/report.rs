//! Run-level counters and the final human-readable summary.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::Serialize;

/// Shared counters bumped by workers during a run.
///
/// Every per-candidate failure is recovered locally and lands in exactly one
/// of these buckets; nothing here aborts the run.
#[derive(Debug, Default)]
pub struct RunCounters {
    pub accepted: AtomicUsize,
    pub duplicates: AtomicUsize,
    pub invalid: AtomicUsize,
    pub fetch_errors: AtomicUsize,
    pub collisions: AtomicUsize,
    pub write_errors: AtomicUsize,
}

impl RunCounters {
    pub fn accepted_count(&self) -> usize {
        self.accepted.load(Ordering::Relaxed)
    }

    /// Atomically reserve one acceptance slot, refusing to exceed `limit`.
    ///
    /// The check and the increment happen in a single atomic update, so two
    /// workers racing on the last slot can never both succeed. A slot
    /// reserved for a candidate that ends up rejected or unwritten must be
    /// handed back with [`release_accept`](Self::release_accept).
    pub fn try_reserve_accept(&self, limit: usize) -> bool {
        self.accepted
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |count| {
                if count < limit {
                    Some(count + 1)
                } else {
                    None
                }
            })
            .is_ok()
    }

    /// Hand back a slot whose candidate was not persisted
    pub fn release_accept(&self) {
        self.accepted.fetch_sub(1, Ordering::Relaxed);
    }

    /// Freeze the counters into a report
    pub fn snapshot(&self, elapsed: Duration) -> RunReport {
        RunReport {
            accepted: self.accepted.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            invalid: self.invalid.load(Ordering::Relaxed),
            fetch_errors: self.fetch_errors.load(Ordering::Relaxed),
            collisions: self.collisions.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            elapsed_secs: elapsed.as_secs_f64(),
        }
    }
}

/// Immutable summary of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub accepted: usize,
    pub duplicates: usize,
    pub invalid: usize,
    pub fetch_errors: usize,
    pub collisions: usize,
    pub write_errors: usize,
    pub elapsed_secs: f64,
}

impl RunReport {
    /// Total candidates that reached a decision
    pub fn processed(&self) -> usize {
        self.accepted + self.duplicates + self.invalid + self.fetch_errors + self.collisions
            + self.write_errors
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "accepted {}, duplicates {}, invalid {}, fetch errors {}, \
             naming collisions {}, write errors {} in {:.1}s",
            self.accepted,
            self.duplicates,
            self.invalid,
            self.fetch_errors,
            self.collisions,
            self.write_errors,
            self.elapsed_secs
        )
    }
}

// -- Tests --
