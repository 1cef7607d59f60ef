//! Event manager metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one EventManager instance
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Total dispatch calls
    dispatch_count: AtomicU64,
    /// Dispatches whose event name had no handlers
    unrouted_count: AtomicU64,
    /// Total handler tasks started
    handler_invocations: AtomicU64,
    /// Handler tasks that panicked
    handler_panics: AtomicU64,
    /// Successful registrations
    registrations: AtomicU64,
    /// Handler entries removed (Remove and RemoveAll)
    removals: AtomicU64,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch_count(&self) -> u64 {
        self.dispatch_count.load(Ordering::Relaxed)
    }

    /// Record one dispatch that started `handlers` tasks
    pub fn record_dispatch(&self, handlers: usize) {
        self.dispatch_count.fetch_add(1, Ordering::Relaxed);
        if handlers == 0 {
            self.unrouted_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.handler_invocations
                .fetch_add(handlers as u64, Ordering::Relaxed);
        }
    }

    pub fn unrouted_count(&self) -> u64 {
        self.unrouted_count.load(Ordering::Relaxed)
    }

    pub fn handler_invocations(&self) -> u64 {
        self.handler_invocations.load(Ordering::Relaxed)
    }

    pub fn handler_panics(&self) -> u64 {
        self.handler_panics.load(Ordering::Relaxed)
    }

    pub fn inc_handler_panics(&self) {
        self.handler_panics.fetch_add(1, Ordering::Relaxed);
    }

    pub fn registrations(&self) -> u64 {
        self.registrations.load(Ordering::Relaxed)
    }

    pub fn inc_registrations(&self) {
        self.registrations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn removals(&self) -> u64 {
        self.removals.load(Ordering::Relaxed)
    }

    pub fn add_removals(&self, count: usize) {
        self.removals.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            dispatch_count: self.dispatch_count(),
            unrouted_count: self.unrouted_count(),
            handler_invocations: self.handler_invocations(),
            handler_panics: self.handler_panics(),
            registrations: self.registrations(),
            removals: self.removals(),
        }
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub dispatch_count: u64,
    pub unrouted_count: u64,
    pub handler_invocations: u64,
    pub handler_panics: u64,
    pub registrations: u64,
    pub removals: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_dispatch_splits_unrouted() {
        let metrics = DispatchMetrics::new();
        metrics.record_dispatch(3);
        metrics.record_dispatch(0);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.dispatch_count, 2);
        assert_eq!(snapshot.unrouted_count, 1);
        assert_eq!(snapshot.handler_invocations, 3);
    }
}
