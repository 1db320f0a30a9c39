//! Atomic counters for shim observability.
//!
//! All counters use relaxed ordering; they are advisory/diagnostic, not
//! synchronization primitives. A logging framework has no place inside
//! `malloc`, so these counters are the whole observability surface.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global shim operation counters.
pub struct TraceMetrics {
    /// Intercepted `malloc` calls.
    pub malloc_calls: AtomicU64,
    /// Intercepted `calloc` calls.
    pub calloc_calls: AtomicU64,
    /// Intercepted `realloc` calls.
    pub realloc_calls: AtomicU64,
    /// Intercepted `free` calls.
    pub free_calls: AtomicU64,
    /// ALLOCATE rows appended.
    pub allocate_events: AtomicU64,
    /// RELEASE rows appended.
    pub release_events: AtomicU64,
    /// Total data rows appended.
    pub rows_written: AtomicU64,
    /// Header writes (exactly one per process once the log is in use).
    pub header_writes: AtomicU64,
    /// Reentrant calls routed to the real heap without a row.
    pub untraced_passthroughs: AtomicU64,
}

impl TraceMetrics {
    /// Create a new zeroed metrics instance.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            malloc_calls: AtomicU64::new(0),
            calloc_calls: AtomicU64::new(0),
            realloc_calls: AtomicU64::new(0),
            free_calls: AtomicU64::new(0),
            allocate_events: AtomicU64::new(0),
            release_events: AtomicU64::new(0),
            rows_written: AtomicU64::new(0),
            header_writes: AtomicU64::new(0),
            untraced_passthroughs: AtomicU64::new(0),
        }
    }

    /// Increment a counter by 1.
    pub fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Read a counter value.
    pub fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }

    /// Snapshot all counters into a displayable summary.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            malloc_calls: Self::get(&self.malloc_calls),
            calloc_calls: Self::get(&self.calloc_calls),
            realloc_calls: Self::get(&self.realloc_calls),
            free_calls: Self::get(&self.free_calls),
            allocate_events: Self::get(&self.allocate_events),
            release_events: Self::get(&self.release_events),
            rows_written: Self::get(&self.rows_written),
            header_writes: Self::get(&self.header_writes),
            untraced_passthroughs: Self::get(&self.untraced_passthroughs),
        }
    }
}

impl Default for TraceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time snapshot of all shim counters.
#[derive(Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    pub malloc_calls: u64,
    pub calloc_calls: u64,
    pub realloc_calls: u64,
    pub free_calls: u64,
    pub allocate_events: u64,
    pub release_events: u64,
    pub rows_written: u64,
    pub header_writes: u64,
    pub untraced_passthroughs: u64,
}

/// Global metrics instance.
static GLOBAL_METRICS: TraceMetrics = TraceMetrics::new();

/// Access the global metrics singleton.
#[must_use]
pub fn global_metrics() -> &'static TraceMetrics {
    &GLOBAL_METRICS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let m = TraceMetrics::new();
        let snap = m.snapshot();
        assert_eq!(snap.malloc_calls, 0);
        assert_eq!(snap.rows_written, 0);
        assert_eq!(snap.header_writes, 0);
    }

    #[test]
    fn increment_works() {
        let m = TraceMetrics::new();
        TraceMetrics::inc(&m.rows_written);
        TraceMetrics::inc(&m.rows_written);
        TraceMetrics::inc(&m.untraced_passthroughs);
        let snap = m.snapshot();
        assert_eq!(snap.rows_written, 2);
        assert_eq!(snap.untraced_passthroughs, 1);
    }
}
