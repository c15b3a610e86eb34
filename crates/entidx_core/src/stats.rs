//! Registry statistics and telemetry.

use std::sync::atomic::{AtomicU64, Ordering};

/// Operation counters for an index registry.
///
/// All counters are relaxed atomics and can be read while operations are in
/// progress. Values are monotonically increasing.
#[derive(Debug, Default)]
pub struct RegistryStats {
    /// Total `add`/`apply` fan-out calls.
    adds: AtomicU64,
    /// Total typed index accesses via `with_index`.
    accesses: AtomicU64,
    /// Total per-index faults during fan-out.
    errors: AtomicU64,
}

impl RegistryStats {
    /// Creates a new stats instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a fan-out call.
    pub(crate) fn record_add(&self) {
        self.adds.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a typed index access.
    pub(crate) fn record_access(&self) {
        self.accesses.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a per-index fault.
    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the total number of fan-out calls.
    pub fn adds(&self) -> u64 {
        self.adds.load(Ordering::Relaxed)
    }

    /// Returns the total number of typed index accesses.
    pub fn accesses(&self) -> u64 {
        self.accesses.load(Ordering::Relaxed)
    }

    /// Returns the total number of per-index faults.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }
}

/// A point-in-time snapshot of registry statistics.
///
/// Unlike [`RegistryStats`], this is a plain value that can be compared or
/// passed across threads without atomics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Total fan-out calls.
    pub adds: u64,
    /// Total typed index accesses.
    pub accesses: u64,
    /// Total per-index faults.
    pub errors: u64,
    /// Current entries across all indexes, live or stale.
    pub entries: u64,
    /// Total stale entries evicted across all indexes.
    pub evicted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        let stats = RegistryStats::new();
        assert_eq!(stats.adds(), 0);
        assert_eq!(stats.accesses(), 0);
        assert_eq!(stats.errors(), 0);
    }

    #[test]
    fn record_operations() {
        let stats = RegistryStats::new();
        stats.record_add();
        stats.record_add();
        stats.record_access();
        stats.record_error();

        assert_eq!(stats.adds(), 2);
        assert_eq!(stats.accesses(), 1);
        assert_eq!(stats.errors(), 1);
    }

    #[test]
    fn concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let stats = Arc::new(RegistryStats::new());
        let mut handles = vec![];

        for _ in 0..8 {
            let s = Arc::clone(&stats);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    s.record_add();
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(stats.adds(), 800);
    }
}
