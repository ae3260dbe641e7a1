// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! DEADLINE QoS policy and its C6 state machine.
//!
//! A timer is armed to the policy period on every sample for a given
//! instance; if no new sample arrives before it expires, the instance
//! raises `DEADLINE_MISSED` and its counter is bumped.

use crate::history::keyhash::InstanceHandle;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// `u64::MAX` nanoseconds means "no deadline" (DDS `DURATION_INFINITE`).
pub const INFINITE_NS: u64 = u64::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    pub period_ns: u64,
}

impl Default for Deadline {
    fn default() -> Self {
        Self { period_ns: INFINITE_NS }
    }
}

impl Deadline {
    /// Compatibility rule: reader period must be `>=`
    /// writer period: a slower reader can tolerate a faster writer, never
    /// the reverse.
    #[must_use]
    pub fn reader_compatible_with_writer(reader: &Deadline, writer: &Deadline) -> bool {
        reader.period_ns >= writer.period_ns
    }
}

/// Per-endpoint, per-instance deadline timers plus a missed-deadline counter.
pub struct DeadlineTracker {
    period_ns: u64,
    last_touch_ns: Mutex<HashMap<InstanceHandle, u64>>,
    missed_count: AtomicU64,
}

impl DeadlineTracker {
    #[must_use]
    pub fn new(period_ns: u64) -> Self {
        Self {
            period_ns,
            last_touch_ns: Mutex::new(HashMap::new()),
            missed_count: AtomicU64::new(0),
        }
    }

    /// Re-arm the timer for `instance`: call on every sample written or received.
    pub fn touch(&self, instance: InstanceHandle, now_ns: u64) {
        self.last_touch_ns.lock().insert(instance, now_ns);
    }

    /// Evaluate all tracked instances against `now_ns`, bumping the counter
    /// and returning the set of instances whose deadline just expired.
    /// Called from the shared QoS clock tick.
    pub fn tick(&self, now_ns: u64) -> Vec<InstanceHandle> {
        if self.period_ns == INFINITE_NS {
            return Vec::new();
        }
        let mut missed = Vec::new();
        let mut map = self.last_touch_ns.lock();
        for (instance, last) in map.iter_mut() {
            if now_ns.saturating_sub(*last) >= self.period_ns {
                missed.push(*instance);
                *last = now_ns;
            }
        }
        if !missed.is_empty() {
            self.missed_count.fetch_add(missed.len() as u64, Ordering::Relaxed);
        }
        missed
    }

    #[must_use]
    pub fn missed_count(&self) -> u64 {
        self.missed_count.load(Ordering::Relaxed)
    }
}
