// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! LIVELINESS QoS policy and its C6 lease-timer state machine.

use crate::guid::Guid;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LivelinessKind {
    #[default]
    Automatic,
    ManualByParticipant,
    ManualByTopic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Liveliness {
    pub kind: LivelinessKind,
    pub lease_ns: u64,
}

impl Default for Liveliness {
    fn default() -> Self {
        Self {
            kind: LivelinessKind::Automatic,
            lease_ns: u64::MAX,
        }
    }
}

impl Liveliness {
    /// Compatibility rule: kinds must match exactly,
    /// and the reader's lease must be at least as long as the writer's.
    #[must_use]
    pub fn reader_compatible_with_writer(reader: &Liveliness, writer: &Liveliness) -> bool {
        reader.kind == writer.kind && reader.lease_ns >= writer.lease_ns
    }
}

/// Tracks the lease for every remote writer matched to one local reader.
///
/// A writer is "alive" until `lease_ns` elapses without an assertion; on
/// expiry it raises `LIVELINESS_CHANGED` and is excluded from ownership
/// arbitration until it re-asserts.
pub struct LivelinessMonitor {
    leases: Mutex<HashMap<Guid, WriterLease>>,
}

struct WriterLease {
    lease_ns: u64,
    last_assertion_ns: u64,
    alive: bool,
}

impl LivelinessMonitor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            leases: Mutex::new(HashMap::new()),
        }
    }

    /// Register a newly matched writer, or refresh its lease duration on a QoS change.
    pub fn register(&self, writer: Guid, lease_ns: u64, now_ns: u64) {
        self.leases.lock().insert(
            writer,
            WriterLease {
                lease_ns,
                last_assertion_ns: now_ns,
                alive: true,
            },
        );
    }

    pub fn unregister(&self, writer: &Guid) {
        self.leases.lock().remove(writer);
    }

    /// Called on every AUTOMATIC SPDP beat, or on any write for
    /// MANUAL_BY_PARTICIPANT / MANUAL_BY_TOPIC.
    pub fn assert_liveliness(&self, writer: Guid, now_ns: u64) {
        if let Some(lease) = self.leases.lock().get_mut(&writer) {
            lease.last_assertion_ns = now_ns;
            lease.alive = true;
        }
    }

    #[must_use]
    pub fn is_alive(&self, writer: &Guid) -> bool {
        self.leases.lock().get(writer).is_some_and(|l| l.alive)
    }

    /// Evaluate every tracked writer's lease, returning the set that just
    /// expired. Called from the shared QoS clock tick.
    pub fn tick(&self, now_ns: u64) -> Vec<Guid> {
        let mut expired = Vec::new();
        let mut leases = self.leases.lock();
        for (guid, lease) in leases.iter_mut() {
            if lease.alive
                && lease.lease_ns != u64::MAX
                && now_ns.saturating_sub(lease.last_assertion_ns) >= lease.lease_ns
            {
                lease.alive = false;
                expired.push(*guid);
            }
        }
        expired
    }
}

impl Default for LivelinessMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guid(n: u8) -> Guid {
        Guid::new([n; 12], [0; 4])
    }

    #[test]
    fn compatibility_requires_equal_kind_and_longer_reader_lease() {
        let writer = Liveliness { kind: LivelinessKind::Automatic, lease_ns: 100 };
        let reader_ok = Liveliness { kind: LivelinessKind::Automatic, lease_ns: 200 };
        let reader_short = Liveliness { kind: LivelinessKind::Automatic, lease_ns: 50 };
        let reader_wrong_kind = Liveliness { kind: LivelinessKind::ManualByTopic, lease_ns: 200 };
        assert!(Liveliness::reader_compatible_with_writer(&reader_ok, &writer));
        assert!(!Liveliness::reader_compatible_with_writer(&reader_short, &writer));
        assert!(!Liveliness::reader_compatible_with_writer(&reader_wrong_kind, &writer));
    }

    #[test]
    fn expiry_flips_alive_and_reports_once() {
        let mon = LivelinessMonitor::new();
        let w = guid(1);
        mon.register(w, 100, 0);
        assert!(mon.is_alive(&w));
        assert!(mon.tick(50).is_empty());
        assert_eq!(mon.tick(150), vec![w]);
        assert!(!mon.is_alive(&w));
        // Already expired: does not report again.
        assert!(mon.tick(300).is_empty());
    }

    #[test]
    fn reassertion_revives_the_writer() {
        let mon = LivelinessMonitor::new();
        let w = guid(2);
        mon.register(w, 100, 0);
        mon.tick(150);
        assert!(!mon.is_alive(&w));
        mon.assert_liveliness(w, 160);
        assert!(mon.is_alive(&w));
    }
}
