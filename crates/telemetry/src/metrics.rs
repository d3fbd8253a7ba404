//! In-process metrics for the publish path.
//!
//! Counters are plain relaxed atomics. The `/health` endpoint and the
//! shutdown log read them through [`Metrics::snapshot`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonically increasing counter.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn inc(&self) {
        self.inc_by(1);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Latency histogram with fixed millisecond buckets.
#[derive(Debug, Default)]
pub struct Histogram {
    /// Buckets: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 5s, +Inf
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 10] = [1, 5, 10, 25, 50, 100, 250, 500, 1000, 5000];

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let idx = Self::BUCKET_BOUNDS
            .iter()
            .position(|&bound| ms <= bound)
            .unwrap_or(Self::BUCKET_BOUNDS.len());
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum.load(Ordering::Relaxed) as f64 / count as f64
        }
    }

    /// Returns `(upper bound, count)` pairs; the last bound is `u64::MAX`.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .copied()
            .chain(std::iter::once(u64::MAX))
            .zip(self.buckets.iter())
            .map(|(bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Collected metrics for the publish gateway.
#[derive(Debug, Default)]
pub struct Metrics {
    // Inbound
    pub batches_received: Counter,
    pub events_received: Counter,
    pub internal_events_received: Counter,
    pub rate_limited_requests: Counter,

    // Deny-list
    pub batches_denied: Counter,
    pub batches_truncated_by_deny_list: Counter,
    pub deny_list_reloads: Counter,

    // Quota
    pub permits_requested: Counter,
    pub permit_errors: Counter,
    pub quota_exhausted: Counter,
    pub events_dropped_by_quota: Counter,
    pub releases: Counter,
    pub release_errors: Counter,
    pub limit_notices_sent: Counter,
    pub limit_notice_errors: Counter,

    // Sink
    pub events_forwarded: Counter,
    pub sink_errors: Counter,

    // Latency
    pub publish_latency_ms: Histogram,
    pub sink_latency_ms: Histogram,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub batches_received: u64,
    pub events_received: u64,
    pub internal_events_received: u64,
    pub rate_limited_requests: u64,
    pub batches_denied: u64,
    pub batches_truncated_by_deny_list: u64,
    pub deny_list_reloads: u64,
    pub permits_requested: u64,
    pub permit_errors: u64,
    pub quota_exhausted: u64,
    pub events_dropped_by_quota: u64,
    pub releases: u64,
    pub release_errors: u64,
    pub limit_notices_sent: u64,
    pub limit_notice_errors: u64,
    pub events_forwarded: u64,
    pub sink_errors: u64,
    pub publish_latency_mean_ms: f64,
    pub sink_latency_mean_ms: f64,
    /// `(upper bound ms, count)` pairs for publish latency
    pub publish_latency_buckets: Vec<(u64, u64)>,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            batches_received: self.batches_received.get(),
            events_received: self.events_received.get(),
            internal_events_received: self.internal_events_received.get(),
            rate_limited_requests: self.rate_limited_requests.get(),
            batches_denied: self.batches_denied.get(),
            batches_truncated_by_deny_list: self.batches_truncated_by_deny_list.get(),
            deny_list_reloads: self.deny_list_reloads.get(),
            permits_requested: self.permits_requested.get(),
            permit_errors: self.permit_errors.get(),
            quota_exhausted: self.quota_exhausted.get(),
            events_dropped_by_quota: self.events_dropped_by_quota.get(),
            releases: self.releases.get(),
            release_errors: self.release_errors.get(),
            limit_notices_sent: self.limit_notices_sent.get(),
            limit_notice_errors: self.limit_notice_errors.get(),
            events_forwarded: self.events_forwarded.get(),
            sink_errors: self.sink_errors.get(),
            publish_latency_mean_ms: self.publish_latency_ms.mean(),
            sink_latency_mean_ms: self.sink_latency_ms.mean(),
            publish_latency_buckets: self.publish_latency_ms.buckets(),
        }
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
