// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! C3: the history cache.
//!
//! A writer-side cache retains unacknowledged changes for retransmission
//! and, under TRANSIENT_LOCAL, replay to late-joining readers. A
//! reader-side cache retains samples not yet taken by the application.
//! Both share the same admission rules: HISTORY (KEEP_LAST/KEEP_ALL),
//! RESOURCE_LIMITS, and LIFESPAN expiry.

use std::collections::{HashSet, VecDeque};

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::guid::Guid;
use crate::qos::{History, Lifespan, ResourceLimits, LENGTH_UNLIMITED};

use super::keyhash::InstanceHandle;
use super::sample::Sample;

/// Per-instance ring of retained samples, plus the bookkeeping needed to
/// enforce KEEP_LAST/RESOURCE_LIMITS without two structures drifting apart.
struct Inner {
    /// Arrival order, across every instance; the front is the oldest sample
    /// still retained anywhere in the cache. Mirrors `by_instance`'s total
    /// sample count so `take()`/eviction can walk one queue and trust the
    /// other to agree.
    order: VecDeque<(InstanceHandle, u64)>,
    by_instance: std::collections::HashMap<InstanceHandle, VecDeque<Sample>>,
    /// `(writer, seq)` pairs ever admitted, rejecting RTPS duplicate delivery.
    /// Never pruned: a writer does not reuse sequence numbers.
    seen: HashSet<(Guid, u64)>,
    total_samples: usize,
}

/// A history cache bound to one writer's or one reader's QoS.
pub struct HistoryCache {
    history: History,
    resource_limits: ResourceLimits,
    lifespan: Lifespan,
    inner: Mutex<Inner>,
}

impl HistoryCache {
    #[must_use]
    pub fn new(history: History, resource_limits: ResourceLimits, lifespan: Lifespan) -> Self {
        Self {
            history,
            resource_limits,
            lifespan,
            inner: Mutex::new(Inner {
                order: VecDeque::new(),
                by_instance: std::collections::HashMap::new(),
                seen: HashSet::new(),
                total_samples: 0,
            }),
        }
    }

    /// Admit `sample`, applying duplicate rejection, RESOURCE_LIMITS and
    /// HISTORY eviction in that order.
    ///
    /// Returns `Ok(true)` if the sample was admitted, `Ok(false)` if it was
    /// a duplicate (silently dropped, not an error), and `Err` if
    /// RESOURCE_LIMITS rejected it outright (KEEP_ALL with no room and no
    /// older sample eligible for eviction).
    pub fn insert(&self, sample: Sample) -> Result<bool> {
        let mut inner = self.inner.lock();
        let identity = sample.identity();
        if !inner.seen.insert(identity) {
            return Ok(false);
        }

        if self.resource_limits.max_instances != LENGTH_UNLIMITED
            && !inner.by_instance.contains_key(&sample.instance)
            && inner.by_instance.len() >= self.resource_limits.max_instances
        {
            inner.seen.remove(&identity);
            return Err(Error::OutOfResources("RESOURCE_LIMITS.max_instances exceeded".into()));
        }

        match self.history {
            History::KeepLast(depth) => {
                let depth = depth as usize;
                let queue = inner.by_instance.entry(sample.instance).or_default();
                if queue.len() >= depth {
                    evict_oldest_of_instance(&mut inner.order, queue, sample.instance);
                    inner.total_samples -= 1;
                }
            }
            History::KeepAll => {
                let over_total = self.resource_limits.max_samples != LENGTH_UNLIMITED
                    && inner.total_samples >= self.resource_limits.max_samples;
                let per_instance_cap = self.resource_limits.max_samples_per_instance;
                let over_instance = per_instance_cap != LENGTH_UNLIMITED
                    && inner
                        .by_instance
                        .get(&sample.instance)
                        .is_some_and(|q| q.len() >= per_instance_cap);
                if over_total || over_instance {
                    inner.seen.remove(&identity);
                    return Err(Error::OutOfResources(
                        "RESOURCE_LIMITS exceeded under KEEP_ALL".into(),
                    ));
                }
            }
        }

        let instance = sample.instance;
        let seq = sample.seq;
        inner.by_instance.entry(instance).or_default().push_back(sample);
        inner.order.push_back((instance, seq));
        inner.total_samples += 1;
        Ok(true)
    }

    /// Remove and return the oldest retained sample across every instance
    /// (FIFO across the whole cache, matching arrival order).
    pub fn take_oldest(&self) -> Option<Sample> {
        let mut inner = self.inner.lock();
        let (instance, seq) = inner.order.pop_front()?;
        inner.total_samples -= 1;
        let queue = inner.by_instance.get_mut(&instance)?;
        let pos = queue.iter().position(|s| s.seq == seq)?;
        let sample = queue.remove(pos)?;
        if queue.is_empty() {
            inner.by_instance.remove(&instance);
        }
        Some(sample)
    }

    /// Remove and return the oldest retained sample belonging to `instance`,
    /// leaving every other instance's queue untouched. Backs
    /// `DataReader::take_instance`/`take_next_instance`.
    pub fn take_instance(&self, instance: &InstanceHandle) -> Option<Sample> {
        let mut inner = self.inner.lock();
        let queue = inner.by_instance.get_mut(instance)?;
        let sample = queue.pop_front()?;
        let pos = inner
            .order
            .iter()
            .position(|(i, s)| i == instance && *s == sample.seq)?;
        inner.order.remove(pos);
        inner.total_samples -= 1;
        if inner.by_instance.get(instance).is_some_and(VecDeque::is_empty) {
            inner.by_instance.remove(instance);
        }
        Some(sample)
    }

    /// Every instance with at least one retained sample, in the order each
    /// instance first appeared in the cache. Backs `take_next_instance`'s
    /// "next unread instance" iteration.
    #[must_use]
    pub fn instances(&self) -> Vec<InstanceHandle> {
        let inner = self.inner.lock();
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for (instance, _) in &inner.order {
            if seen.insert(*instance) {
                out.push(*instance);
            }
        }
        out
    }

    /// All samples currently retained for `instance`, oldest first, used
    /// for TRANSIENT_LOCAL replay to a newly matched reader.
    #[must_use]
    pub fn replay_instance(&self, instance: &InstanceHandle) -> Vec<Sample> {
        self.inner
            .lock()
            .by_instance
            .get(instance)
            .map(|q| q.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every retained sample across every instance, oldest first, used for
    /// TRANSIENT_LOCAL replay of a writer's full history to a newly matched
    /// reader.
    #[must_use]
    pub fn replay_all(&self) -> Vec<Sample> {
        let inner = self.inner.lock();
        inner
            .order
            .iter()
            .filter_map(|(instance, seq)| {
                inner.by_instance.get(instance)?.iter().find(|s| s.seq == *seq).cloned()
            })
            .collect()
    }

    /// Sweep LIFESPAN-expired samples; call from the shared QoS clock tick.
    /// Returns the number evicted.
    pub fn sweep_expired(&self, now_ns: u64) -> usize {
        if self.lifespan.duration_ns == u64::MAX {
            return 0;
        }
        let mut inner = self.inner.lock();
        let mut evicted = 0;
        inner.order.retain(|(instance, seq)| {
            let Some(queue) = inner.by_instance.get_mut(instance) else {
                return false;
            };
            let Some(pos) = queue.iter().position(|s| s.seq == *seq) else {
                return false;
            };
            let expired = queue[pos].is_expired(now_ns, self.lifespan.duration_ns);
            if expired {
                queue.remove(pos);
                if queue.is_empty() {
                    inner.by_instance.remove(instance);
                }
                evicted += 1;
            }
            !expired
        });
        inner.total_samples -= evicted;
        evicted
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().total_samples
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Evict the oldest sample belonging to `instance` from both `queue` and the
/// cache-wide `order` deque, keeping the two in sync.
fn evict_oldest_of_instance(
    order: &mut VecDeque<(InstanceHandle, u64)>,
    queue: &mut VecDeque<Sample>,
    instance: InstanceHandle,
) {
    if let Some(evicted) = queue.pop_front() {
        if let Some(pos) = order.iter().position(|(i, s)| *i == instance && *s == evicted.seq) {
            order.remove(pos);
        }
    }
}
