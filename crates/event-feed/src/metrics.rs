use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

#[derive(Clone, Default)]
pub struct FeedMetrics {
    inner: Arc<FeedMetricsInner>,
}

#[derive(Default)]
struct FeedMetricsInner {
    refresh_started: AtomicU64,
    refresh_applied: AtomicU64,
    refresh_failed: AtomicU64,
    refresh_in_flight: AtomicU64,
    refresh_superseded: AtomicU64,
    refresh_abandoned: AtomicU64,
    dropped_decode: AtomicU64,
    dropped_classify: AtomicU64,
    truncated: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeedMetricsSnapshot {
    pub refresh_started: u64,
    pub refresh_applied: u64,
    pub refresh_failed: u64,
    pub refresh_in_flight: u64,
    pub refresh_superseded: u64,
    pub refresh_abandoned: u64,
    pub dropped_decode: u64,
    pub dropped_classify: u64,
    pub truncated: u64,
}

impl FeedMetrics {
    pub fn record_refresh_started(&self) {
        self.inner.refresh_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refresh_applied(&self) {
        self.inner.refresh_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refresh_failed(&self) {
        self.inner.refresh_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refresh_in_flight(&self) {
        self.inner.refresh_in_flight.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refresh_superseded(&self) {
        self.inner.refresh_superseded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refresh_abandoned(&self) {
        self.inner.refresh_abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self, decode: u64, classify: u64) {
        self.inner.dropped_decode.fetch_add(decode, Ordering::Relaxed);
        self.inner
            .dropped_classify
            .fetch_add(classify, Ordering::Relaxed);
    }

    pub fn record_truncated(&self, count: u64) {
        self.inner.truncated.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> FeedMetricsSnapshot {
        let inner = &self.inner;
        FeedMetricsSnapshot {
            refresh_started: inner.refresh_started.load(Ordering::Relaxed),
            refresh_applied: inner.refresh_applied.load(Ordering::Relaxed),
            refresh_failed: inner.refresh_failed.load(Ordering::Relaxed),
            refresh_in_flight: inner.refresh_in_flight.load(Ordering::Relaxed),
            refresh_superseded: inner.refresh_superseded.load(Ordering::Relaxed),
            refresh_abandoned: inner.refresh_abandoned.load(Ordering::Relaxed),
            dropped_decode: inner.dropped_decode.load(Ordering::Relaxed),
            dropped_classify: inner.dropped_classify.load(Ordering::Relaxed),
            truncated: inner.truncated.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_across_clones() {
        let metrics = FeedMetrics::default();
        let clone = metrics.clone();
        metrics.record_refresh_started();
        clone.record_dropped(2, 1);
        clone.record_dropped(1, 0);
        let snap = metrics.snapshot();
        assert_eq!(snap.refresh_started, 1);
        assert_eq!(snap.dropped_decode, 3);
        assert_eq!(snap.dropped_classify, 1);
    }
}
