// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! OWNERSHIP QoS policy and its C6 per-instance arbitration.

use crate::guid::Guid;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::history::keyhash::InstanceHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OwnershipKind {
    #[default]
    Shared,
    Exclusive,
}

/// Writer-only ownership strength, used by EXCLUSIVE arbitration to pick
/// the incumbent among writers on the same instance.
pub struct OwnershipStrength(AtomicI32);

impl OwnershipStrength {
    #[must_use]
    pub fn new(strength: i32) -> Self {
        Self(AtomicI32::new(strength))
    }

    #[must_use]
    pub fn get(&self) -> i32 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, strength: i32) {
        self.0.store(strength, Ordering::Relaxed);
    }
}

impl Clone for OwnershipStrength {
    fn clone(&self) -> Self {
        Self::new(self.get())
    }
}

/// Compatibility rule: kinds must be equal.
#[must_use]
pub fn ownership_compatible(reader: OwnershipKind, writer: OwnershipKind) -> bool {
    reader == writer
}

/// Per-instance owner arbitration for a reader with `OWNERSHIP = EXCLUSIVE`.
///
/// Among matched writers with live liveliness, the highest-strength writer
/// owns the instance; ties favor the incumbent (first-writer preference).
/// Samples from strictly lower-strength writers are dropped.
pub struct OwnershipArbiter {
    owners: Mutex<HashMap<InstanceHandle, Owner>>,
}

#[derive(Clone, Copy)]
struct Owner {
    writer: Guid,
    strength: i32,
}

impl OwnershipArbiter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            owners: Mutex::new(HashMap::new()),
        }
    }

    /// Decide whether a sample from `writer` (at `strength`) should be
    /// admitted for `instance`, updating the incumbent as a side effect.
    #[must_use]
    pub fn admit(&self, instance: InstanceHandle, writer: Guid, strength: i32) -> bool {
        let mut owners = self.owners.lock();
        match owners.get(&instance) {
            None => {
                owners.insert(instance, Owner { writer, strength });
                true
            }
            Some(owner) if owner.writer == writer => {
                owners.insert(instance, Owner { writer, strength });
                true
            }
            Some(owner) if strength > owner.strength => {
                owners.insert(instance, Owner { writer, strength });
                true
            }
            Some(_) => false,
        }
    }

    /// Remove a writer from arbitration (liveliness lost, or destroyed);
    /// the next admitted sample from any remaining writer becomes the new
    /// incumbent.
    pub fn remove_writer(&self, instance: InstanceHandle, writer: &Guid) {
        let mut owners = self.owners.lock();
        if owners.get(&instance).is_some_and(|o| &o.writer == writer) {
            owners.remove(&instance);
        }
    }

    /// Remove `writer` as incumbent wherever it currently owns an
    /// instance, called when the writer is unmatched or its liveliness
    /// lease expires, without the caller needing to know which instances
    /// it held.
    pub fn remove_writer_everywhere(&self, writer: &Guid) {
        self.owners.lock().retain(|_, owner| owner.writer != *writer);
    }

    #[must_use]
    pub fn current_owner(&self, instance: &InstanceHandle) -> Option<Guid> {
        self.owners.lock().get(instance).map(|o| o.writer)
    }
}

impl Default for OwnershipArbiter {
    fn default() -> Self {
        Self::new()
    }
}
