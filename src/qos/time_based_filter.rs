// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! TIME_BASED_FILTER QoS policy: a reader drops a sample on
//! an instance whose last-delivered timestamp is within the minimum
//! separation of the incoming sample. Local-only; not part of matching.

use crate::history::keyhash::InstanceHandle;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeBasedFilter {
    pub min_separation_ns: u64,
}

/// Tracks, per instance, the timestamp of the last sample this reader
/// actually delivered to the application.
pub struct TimeBasedFilterChecker {
    min_separation_ns: u64,
    last_delivered_ns: Mutex<HashMap<InstanceHandle, u64>>,
}

impl TimeBasedFilterChecker {
    #[must_use]
    pub fn new(policy: TimeBasedFilter) -> Self {
        Self {
            min_separation_ns: policy.min_separation_ns,
            last_delivered_ns: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `true` if the incoming sample should be delivered (and
    /// records it as the new "last delivered" timestamp), `false` if it
    /// must be dropped as too close to the previous delivery.
    pub fn admit(&self, instance: InstanceHandle, source_timestamp_ns: u64) -> bool {
        if self.min_separation_ns == 0 {
            self.last_delivered_ns.lock().insert(instance, source_timestamp_ns);
            return true;
        }
        let mut map = self.last_delivered_ns.lock();
        match map.get(&instance) {
            Some(&last) if source_timestamp_ns.saturating_sub(last) < self.min_separation_ns => false,
            _ => {
                map.insert(instance, source_timestamp_ns);
                true
            }
        }
    }
}
