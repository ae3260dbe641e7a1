// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The WaitSet blocking primitive.
//!
//! One thread at a time waits; any number of threads may mutate conditions
//! concurrently. Implemented over a `parking_lot` mutex/condvar pair: each
//! condition registers a wake-signal closure with this WaitSet that bumps
//! a generation counter and notifies the condvar, so `wait` never has to
//! poll.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::error::{Error, Result};

use super::condition::Condition;

struct ConditionEntry {
    id: u64,
    condition: Arc<dyn Condition>,
}

struct Signal {
    generation: AtomicU64,
    condvar: Condvar,
    mutex: Mutex<()>,
}

impl Signal {
    fn bump(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let _guard = self.mutex.lock();
        self.condvar.notify_all();
    }
}

/// A set of attached conditions plus a single blocking `wait` operation.
pub struct WaitSet {
    conditions: Mutex<Vec<ConditionEntry>>,
    signal: Arc<Signal>,
    destroyed: AtomicBool,
}

impl WaitSet {
    #[must_use]
    pub fn new() -> Self {
        Self {
            conditions: Mutex::new(Vec::new()),
            signal: Arc::new(Signal {
                generation: AtomicU64::new(0),
                condvar: Condvar::new(),
                mutex: Mutex::new(()),
            }),
            destroyed: AtomicBool::new(false),
        }
    }

    /// Attach `condition`. Idempotent: attaching the same condition twice
    /// is a no-op.
    pub fn attach_condition(&self, condition: Arc<dyn Condition>) {
        let id = condition.condition_id();
        let mut conditions = self.conditions.lock();
        if conditions.iter().any(|e| e.id == id) {
            return;
        }
        condition.register_waitset_signal(self.signal_handle());
        conditions.push(ConditionEntry { id, condition });
    }

    /// Detach a previously attached condition.
    ///
    /// # Errors
    /// `PRECONDITION_NOT_MET` if `condition` was never attached.
    pub fn detach_condition(&self, condition: &Arc<dyn Condition>) -> Result<()> {
        let id = condition.condition_id();
        let mut conditions = self.conditions.lock();
        let before = conditions.len();
        conditions.retain(|e| e.id != id);
        if conditions.len() == before {
            return Err(Error::PreconditionNotMet("condition not attached to this WaitSet".into()));
        }
        Ok(())
    }

    #[must_use]
    pub fn attached_condition_ids(&self) -> Vec<u64> {
        self.conditions.lock().iter().map(|e| e.id).collect()
    }

    /// A signal handle conditions can register to wake this WaitSet.
    /// Status/guard conditions call this on creation via the entity that
    /// owns them; kept internal to the crate.
    pub(crate) fn signal_handle(&self) -> Arc<dyn Fn() + Send + Sync> {
        let signal = self.signal.clone();
        Arc::new(move || signal.bump())
    }

    /// Block until any attached condition is triggered or `timeout` elapses.
    ///
    /// Returns the subset of currently-triggered conditions' ids. Level-
    /// triggered on return: a wait that arrives with a condition already
    /// triggered returns immediately.
    ///
    /// # Errors
    /// `Timeout` if no condition triggers before `timeout` elapses.
    /// `Interrupted` if [`Self::destroy`] is called while this wait is in flight.
    pub fn wait(&self, timeout: Duration) -> Result<Vec<u64>> {
        let deadline = std::time::Instant::now() + timeout;
        loop {
            if self.destroyed.load(Ordering::SeqCst) {
                return Err(Error::Interrupted);
            }
            let triggered = self.triggered_ids();
            if !triggered.is_empty() {
                return Ok(triggered);
            }

            let mut guard = self.signal.mutex.lock();
            let now = std::time::Instant::now();
            if now >= deadline {
                return Err(Error::Timeout);
            }
            let remaining = deadline - now;
            let result = self.signal.condvar.wait_for(&mut guard, remaining);
            drop(guard);
            if result.timed_out() {
                // One more check: a condition may have triggered exactly at the deadline.
                let triggered = self.triggered_ids();
                return if triggered.is_empty() { Err(Error::Timeout) } else { Ok(triggered) };
            }
        }
    }

    fn triggered_ids(&self) -> Vec<u64> {
        self.conditions
            .lock()
            .iter()
            .filter(|e| e.condition.is_triggered())
            .map(|e| e.id)
            .collect()
    }

    /// Destroy the WaitSet: any wait currently in flight returns `Interrupted`.
    pub fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
        self.signal.bump();
    }
}

impl Default for WaitSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waitset::condition::GuardCondition;
    use std::thread;

    #[test]
    fn wait_returns_immediately_if_already_triggered() {
        let ws = WaitSet::new();
        let guard = Arc::new(GuardCondition::new());
        guard.set_trigger_value(true);
        ws.attach_condition(guard.clone());
        let triggered = ws.wait(Duration::from_millis(50)).unwrap();
        assert_eq!(triggered, vec![guard.condition_id()]);
    }

    #[test]
    fn attach_is_idempotent() {
        let ws = WaitSet::new();
        let guard: Arc<dyn Condition> = Arc::new(GuardCondition::new());
        ws.attach_condition(guard.clone());
        ws.attach_condition(guard.clone());
        assert_eq!(ws.attached_condition_ids().len(), 1);
    }

    #[test]
    fn detach_unattached_is_precondition_not_met() {
        let ws = WaitSet::new();
        let guard: Arc<dyn Condition> = Arc::new(GuardCondition::new());
        let err = ws.detach_condition(&guard).unwrap_err();
        assert!(matches!(err, Error::PreconditionNotMet(_)));
    }

    #[test]
    fn wait_times_out_with_no_triggered_condition() {
        let ws = WaitSet::new();
        let guard: Arc<dyn Condition> = Arc::new(GuardCondition::new());
        ws.attach_condition(guard);
        let err = ws.wait(Duration::from_millis(20)).unwrap_err();
        assert!(matches!(err, Error::Timeout));
    }

    #[test]
    fn wait_wakes_when_a_condition_is_signalled_from_another_thread() {
        let ws = Arc::new(WaitSet::new());
        let guard = Arc::new(GuardCondition::new());
        let condition_id = guard.condition_id();
        ws.attach_condition(guard.clone());

        let guard2 = guard.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            guard2.set_trigger_value(true);
        });

        let triggered = ws.wait(Duration::from_secs(2)).unwrap();
        assert_eq!(triggered, vec![condition_id]);
        handle.join().unwrap();
    }

    #[test]
    fn a_guard_and_a_status_condition_both_appear_when_simultaneously_triggered() {
        use crate::waitset::condition::StatusCondition;
        use crate::waitset::StatusMask;

        let ws = WaitSet::new();
        let guard = Arc::new(GuardCondition::new());
        let status = Arc::new(StatusCondition::new());
        ws.attach_condition(guard.clone());
        ws.attach_condition(status.clone());

        guard.set_trigger_value(true);
        status.raise(StatusMask::DATA_AVAILABLE);

        let mut triggered = ws.wait(Duration::from_millis(50)).unwrap();
        triggered.sort_unstable();
        let mut expected = vec![guard.condition_id(), status.condition_id()];
        expected.sort_unstable();
        assert_eq!(triggered, expected);
    }

    #[test]
    fn destroy_interrupts_an_in_flight_wait() {
        let ws = Arc::new(WaitSet::new());
        let guard: Arc<dyn Condition> = Arc::new(GuardCondition::new());
        ws.attach_condition(guard);

        let ws2 = ws.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            ws2.destroy();
        });

        let err = ws.wait(Duration::from_secs(2)).unwrap_err();
        assert!(matches!(err, Error::Interrupted));
        handle.join().unwrap();
    }
}
