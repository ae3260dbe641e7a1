// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-participant telemetry counters: a lock-free snapshot of
//! throughput, loss and latency used by admin/monitoring tooling.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::clock::now_ns;

/// Point-in-time view of [`Telemetry`]'s counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub timestamp_ns: u64,
    pub messages_sent: u64,
    pub messages_received: u64,
    pub messages_dropped: u64,
    pub bytes_sent: u64,
    pub latency_p50_ns: u64,
    pub latency_p99_ns: u64,
    pub latency_p999_ns: u64,
    pub merge_full_count: u64,
    pub would_block_count: u64,
}

/// Atomic counters updated from the receive and application threads;
/// `snapshot()` is the only place they are read together.
#[derive(Default)]
pub struct Telemetry {
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
    messages_dropped: AtomicU64,
    bytes_sent: AtomicU64,
    latency_p50_ns: AtomicU64,
    latency_p99_ns: AtomicU64,
    latency_p999_ns: AtomicU64,
    merge_full_count: AtomicU64,
    would_block_count: AtomicU64,
}

impl Telemetry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_sent(&self, bytes: usize) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.messages_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_merge_full(&self) {
        self.merge_full_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_would_block(&self) {
        self.would_block_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Update the latency percentile gauges. Computing the actual
    /// percentiles from a sample window is a caller concern (e.g. the
    /// reliability engine's RTT tracking); this just publishes them.
    pub fn set_latency_percentiles(&self, p50_ns: u64, p99_ns: u64, p999_ns: u64) {
        self.latency_p50_ns.store(p50_ns, Ordering::Relaxed);
        self.latency_p99_ns.store(p99_ns, Ordering::Relaxed);
        self.latency_p999_ns.store(p999_ns, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp_ns: now_ns(),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            latency_p50_ns: self.latency_p50_ns.load(Ordering::Relaxed),
            latency_p99_ns: self.latency_p99_ns.load(Ordering::Relaxed),
            latency_p999_ns: self.latency_p999_ns.load(Ordering::Relaxed),
            merge_full_count: self.merge_full_count.load(Ordering::Relaxed),
            would_block_count: self.would_block_count.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_and_appear_in_the_snapshot() {
        let t = Telemetry::new();
        t.record_sent(128);
        t.record_sent(64);
        t.record_received();
        t.record_dropped();
        t.record_would_block();
        let snap = t.snapshot();
        assert_eq!(snap.messages_sent, 2);
        assert_eq!(snap.bytes_sent, 192);
        assert_eq!(snap.messages_received, 1);
        assert_eq!(snap.messages_dropped, 1);
        assert_eq!(snap.would_block_count, 1);
    }

    #[test]
    fn latency_percentiles_publish_verbatim() {
        let t = Telemetry::new();
        t.set_latency_percentiles(100, 500, 900);
        let snap = t.snapshot();
        assert_eq!((snap.latency_p50_ns, snap.latency_p99_ns, snap.latency_p999_ns), (100, 500, 900));
    }
}
