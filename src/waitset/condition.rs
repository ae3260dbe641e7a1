// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Condition kinds: status conditions bound to an entity,
//! application-owned guard conditions, and the reserved read-condition kind.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// A bit mask over the thirteen DDS status kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusMask(u32);

impl StatusMask {
    pub const NONE: StatusMask = StatusMask(0);
    pub const DATA_AVAILABLE: StatusMask = StatusMask(1 << 0);
    pub const SAMPLE_LOST: StatusMask = StatusMask(1 << 1);
    pub const SAMPLE_REJECTED: StatusMask = StatusMask(1 << 2);
    pub const LIVELINESS_CHANGED: StatusMask = StatusMask(1 << 3);
    pub const REQUESTED_DEADLINE_MISSED: StatusMask = StatusMask(1 << 4);
    pub const REQUESTED_INCOMPATIBLE_QOS: StatusMask = StatusMask(1 << 5);
    pub const SUBSCRIPTION_MATCHED: StatusMask = StatusMask(1 << 6);
    pub const LIVELINESS_LOST: StatusMask = StatusMask(1 << 7);
    pub const OFFERED_DEADLINE_MISSED: StatusMask = StatusMask(1 << 8);
    pub const OFFERED_INCOMPATIBLE_QOS: StatusMask = StatusMask(1 << 9);
    pub const PUBLICATION_MATCHED: StatusMask = StatusMask(1 << 10);
    pub const ALL: StatusMask = StatusMask(0x7FF);

    #[must_use]
    pub fn contains(self, other: StatusMask) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub fn intersects(self, other: StatusMask) -> bool {
        self.0 & other.0 != 0
    }

    #[must_use]
    pub fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn or(self, other: StatusMask) -> StatusMask {
        StatusMask(self.0 | other.0)
    }

    #[must_use]
    pub fn and(self, other: StatusMask) -> StatusMask {
        StatusMask(self.0 & other.0)
    }
}

/// Shared contract implemented by every condition kind: something a WaitSet
/// can attach and poll for a trigger value.
pub trait Condition: Send + Sync {
    fn is_triggered(&self) -> bool;
    /// Stable identity used to dedupe attach/detach (idempotent attach,
    /// `PRECONDITION_NOT_MET` on an unattached detach).
    fn condition_id(&self) -> u64;
    /// Register a closure a WaitSet uses to wake itself when this
    /// condition becomes triggered. Called once per (condition, WaitSet)
    /// pair on attach.
    fn register_waitset_signal(&self, signal: Arc<dyn Fn() + Send + Sync>);
}

static NEXT_CONDITION_ID: AtomicU64 = AtomicU64::new(1);

fn next_condition_id() -> u64 {
    NEXT_CONDITION_ID.fetch_add(1, Ordering::Relaxed)
}

/// Bound to one entity (writer, reader or participant). Trigger = any
/// enabled status bit is currently active.
pub struct StatusCondition {
    id: u64,
    enabled: Mutex<StatusMask>,
    active: Mutex<StatusMask>,
    waitset_signals: Mutex<Vec<Arc<dyn Fn() + Send + Sync>>>,
}

impl StatusCondition {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: next_condition_id(),
            enabled: Mutex::new(StatusMask::ALL),
            active: Mutex::new(StatusMask::NONE),
            waitset_signals: Mutex::new(Vec::new()),
        }
    }

    pub fn set_enabled_statuses(&self, mask: StatusMask) {
        *self.enabled.lock() = mask;
    }

    #[must_use]
    pub fn enabled_statuses(&self) -> StatusMask {
        *self.enabled.lock()
    }

    #[must_use]
    pub fn active_statuses(&self) -> StatusMask {
        *self.active.lock()
    }

    /// Raise `status` and wake any attached WaitSet if it is also enabled.
    pub fn raise(&self, status: StatusMask) {
        let mut active = self.active.lock();
        *active = active.or(status);
        let became_active = self.enabled.lock().intersects(status);
        drop(active);
        if became_active {
            self.notify_waitsets();
        }
    }

    /// Clear `status`, e.g. after the application has read it off a listener.
    pub fn clear(&self, status: StatusMask) {
        let mut active = self.active.lock();
        *active = StatusMask(active.bits() & !status.bits());
    }

    pub fn unregister_all_signals(&self) {
        self.waitset_signals.lock().clear();
    }

    fn notify_waitsets(&self) {
        for signal in self.waitset_signals.lock().iter() {
            signal();
        }
    }
}

impl Default for StatusCondition {
    fn default() -> Self {
        Self::new()
    }
}

impl Condition for StatusCondition {
    fn is_triggered(&self) -> bool {
        self.enabled.lock().intersects(*self.active.lock())
    }

    fn condition_id(&self) -> u64 {
        self.id
    }

    fn register_waitset_signal(&self, signal: Arc<dyn Fn() + Send + Sync>) {
        self.waitset_signals.lock().push(signal);
    }
}

/// Implemented by entities that expose a status condition.
pub trait HasStatusCondition {
    fn status_condition(&self) -> &StatusCondition;
}

/// Application-owned condition; trigger set and cleared explicitly.
pub struct GuardCondition {
    id: u64,
    trigger: AtomicBool,
    waitset_signals: Mutex<Vec<Arc<dyn Fn() + Send + Sync>>>,
}

impl GuardCondition {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: next_condition_id(),
            trigger: AtomicBool::new(false),
            waitset_signals: Mutex::new(Vec::new()),
        }
    }

    pub fn set_trigger_value(&self, value: bool) {
        self.trigger.store(value, Ordering::SeqCst);
        if value {
            for signal in self.waitset_signals.lock().iter() {
                signal();
            }
        }
    }

    pub fn unregister_all_signals(&self) {
        self.waitset_signals.lock().clear();
    }
}

impl Default for GuardCondition {
    fn default() -> Self {
        Self::new()
    }
}

impl Condition for GuardCondition {
    fn is_triggered(&self) -> bool {
        self.trigger.load(Ordering::SeqCst)
    }

    fn condition_id(&self) -> u64 {
        self.id
    }

    fn register_waitset_signal(&self, signal: Arc<dyn Fn() + Send + Sync>) {
        self.waitset_signals.lock().push(signal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mask_intersection_and_union() {
        let a = StatusMask::DATA_AVAILABLE.or(StatusMask::SAMPLE_LOST);
        assert!(a.contains(StatusMask::DATA_AVAILABLE));
        assert!(!a.contains(StatusMask::LIVELINESS_CHANGED));
        assert!(a.intersects(StatusMask::SAMPLE_LOST));
    }

    #[test]
    fn status_condition_triggers_only_on_enabled_bits() {
        let cond = StatusCondition::new();
        cond.set_enabled_statuses(StatusMask::DATA_AVAILABLE);
        cond.raise(StatusMask::SAMPLE_LOST);
        assert!(!cond.is_triggered());
        cond.raise(StatusMask::DATA_AVAILABLE);
        assert!(cond.is_triggered());
        cond.clear(StatusMask::DATA_AVAILABLE);
        assert!(!cond.is_triggered());
    }

    #[test]
    fn guard_condition_trigger_is_explicit() {
        let guard = GuardCondition::new();
        assert!(!guard.is_triggered());
        guard.set_trigger_value(true);
        assert!(guard.is_triggered());
        guard.set_trigger_value(false);
        assert!(!guard.is_triggered());
    }

    #[test]
    fn distinct_conditions_get_distinct_ids() {
        let a = GuardCondition::new();
        let b = GuardCondition::new();
        assert_ne!(a.condition_id(), b.condition_id());
    }
}
