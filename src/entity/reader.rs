// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The DataReader entity: GUID, topic, QoS, history cache,
//! matched remote writers, and the C6 per-instance filtering chain
//! (OWNERSHIP, TIME_BASED_FILTER, DEADLINE, LIVELINESS).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::guid::Guid;
use crate::history::{derive_instance_handle, HistoryCache, InstanceHandle, Sample};
use crate::qos::{
    compat::IncompatiblePolicy, deadline::DeadlineTracker, liveliness::LivelinessMonitor,
    ownership::OwnershipArbiter, time_based_filter::TimeBasedFilterChecker, OwnershipKind, Partition, QosSet,
};
use crate::reliability::ReaderReliability;
use crate::waitset::{Condition, HasStatusCondition, StatusCondition, StatusMask};

use super::topic::Topic;

/// Mirrors the DDS `RequestedIncompatibleQosStatus` structure: a running
/// count plus the most recent offending policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestedIncompatibleQosStatus {
    pub total_count: u32,
    pub last_policy_id: Option<IncompatiblePolicy>,
}

pub struct DataReader {
    pub guid: Guid,
    pub topic: Topic,
    pub qos: QosSet,
    history: HistoryCache,
    reliability: ReaderReliability,
    deadline: DeadlineTracker,
    liveliness: LivelinessMonitor,
    ownership: OwnershipArbiter,
    time_based_filter: TimeBasedFilterChecker,
    /// Matched writer GUID -> the OWNERSHIP strength it announced over
    /// SEDP, used by EXCLUSIVE arbitration.
    matched_writers: Mutex<HashMap<Guid, i32>>,
    status_condition: Arc<StatusCondition>,
    /// `PARTITION` is the one QoS policy this crate treats as mutable after
    /// creation; every other policy is fixed in `qos` for the reader's
    /// lifetime.
    partition: Mutex<Partition>,
    requested_incompatible_qos: Mutex<RequestedIncompatibleQosStatus>,
}

impl DataReader {
    /// # Errors
    /// `InconsistentPolicy` if `qos` fails self-validation.
    pub fn new(guid: Guid, topic: Topic, qos: QosSet) -> Result<Self> {
        qos.validate().map_err(Error::InconsistentPolicy)?;
        let partition = Mutex::new(qos.partition.clone());
        Ok(Self {
            history: HistoryCache::new(qos.history, qos.resource_limits, qos.lifespan),
            reliability: ReaderReliability::new(),
            deadline: DeadlineTracker::new(qos.deadline.period_ns),
            liveliness: LivelinessMonitor::new(),
            ownership: OwnershipArbiter::new(),
            time_based_filter: TimeBasedFilterChecker::new(qos.time_based_filter),
            qos,
            guid,
            topic,
            matched_writers: Mutex::new(HashMap::new()),
            status_condition: Arc::new(StatusCondition::new()),
            partition,
            requested_incompatible_qos: Mutex::new(RequestedIncompatibleQosStatus::default()),
        })
    }

    #[must_use]
    pub fn partition(&self) -> Partition {
        self.partition.lock().clone()
    }

    /// Effective QoS set for this reader, with `PARTITION` replaced by its
    /// current live value; this is what gets re-announced over SEDP on a
    /// partition change.
    #[must_use]
    pub fn effective_qos(&self) -> QosSet {
        let mut qos = self.qos.clone();
        qos.partition = self.partition();
        qos
    }

    pub fn set_partition(&self, partition: Partition) {
        *self.partition.lock() = partition;
    }

    pub fn match_writer(&self, writer: Guid, writer_ownership_strength: i32) {
        self.matched_writers.lock().insert(writer, writer_ownership_strength);
        self.reliability.match_writer(writer);
        self.liveliness.register(writer, self.qos.liveliness.lease_ns, crate::clock::now_ns());
        self.status_condition.raise(StatusMask::SUBSCRIPTION_MATCHED);
    }

    /// Assert `writer`'s liveliness lease without delivering a sample, for
    /// the AUTOMATIC and MANUAL_BY_PARTICIPANT kinds where the assertion is
    /// decoupled from any one write.
    pub fn assert_writer_liveliness(&self, writer: Guid, now_ns: u64) {
        self.liveliness.assert_liveliness(writer, now_ns);
    }

    /// Record a discovery-time QoS incompatibility against `policy` and
    /// raise `REQUESTED_INCOMPATIBLE_QOS`. Called by the matcher instead of
    /// connecting the pair.
    pub fn on_requested_incompatible_qos(&self, policy: IncompatiblePolicy) {
        let mut status = self.requested_incompatible_qos.lock();
        status.total_count += 1;
        status.last_policy_id = Some(policy);
        drop(status);
        self.status_condition.raise(StatusMask::REQUESTED_INCOMPATIBLE_QOS);
    }

    #[must_use]
    pub fn requested_incompatible_qos_status(&self) -> RequestedIncompatibleQosStatus {
        *self.requested_incompatible_qos.lock()
    }

    pub fn unmatch_writer(&self, writer: &Guid) {
        self.matched_writers.lock().remove(writer);
        self.reliability.unmatch_writer(writer);
        self.liveliness.unregister(writer);
        self.ownership.remove_writer_everywhere(writer);
        self.status_condition.raise(StatusMask::SUBSCRIPTION_MATCHED);
    }

    /// Admit one incoming sample from `writer`, applying the full C6
    /// filtering chain in spec order: OWNERSHIP arbitration, then
    /// TIME_BASED_FILTER, then C3 admission.
    ///
    /// Returns `Ok(true)` if the sample was delivered into the cache,
    /// `Ok(false)` if a filter dropped it (not an error).
    pub fn on_data(
        &self,
        writer: Guid,
        seq: u64,
        key_cdr_bytes: &[u8],
        payload: Vec<u8>,
        source_timestamp_ns: u64,
        disposed: bool,
    ) -> Result<bool> {
        let instance = derive_instance_handle(key_cdr_bytes);
        self.admit(writer, seq, instance, payload, source_timestamp_ns, disposed)
    }

    /// Admit a writer's own historical sample directly, bypassing key
    /// re-derivation, as TRANSIENT_LOCAL replay to a newly matched reader.
    /// The instance handle travels with the sample rather than being
    /// recomputed from key bytes we no longer have on hand.
    pub fn replay(&self, sample: &Sample) -> Result<bool> {
        self.admit(
            sample.writer_guid,
            sample.seq,
            sample.instance,
            sample.payload.clone(),
            sample.source_timestamp_ns,
            sample.disposed,
        )
    }

    fn admit(
        &self,
        writer: Guid,
        seq: u64,
        instance: InstanceHandle,
        payload: Vec<u8>,
        source_timestamp_ns: u64,
        disposed: bool,
    ) -> Result<bool> {
        self.reliability.on_data(&writer, seq);
        self.deadline.touch(instance, source_timestamp_ns);
        self.liveliness.assert_liveliness(writer, source_timestamp_ns);

        if self.qos.ownership == OwnershipKind::Exclusive {
            let strength = self.matched_writers.lock().get(&writer).copied().unwrap_or(0);
            if !self.ownership.admit(instance, writer, strength) {
                return Ok(false);
            }
        }

        if !self.time_based_filter.admit(instance, source_timestamp_ns) {
            return Ok(false);
        }

        let sample = Sample::new(writer, seq, instance, source_timestamp_ns, payload, disposed);
        let admitted = self.history.insert(sample)?;
        if admitted {
            self.status_condition.raise(StatusMask::DATA_AVAILABLE);
        }
        Ok(admitted)
    }

    /// Remove and return the oldest available sample, marking it read.
    pub fn take(&self) -> Result<Sample> {
        self.history.take_oldest().ok_or(Error::NoData)
    }

    /// Remove and return the oldest available sample belonging to `instance`.
    pub fn take_instance(&self, instance: InstanceHandle) -> Result<Sample> {
        self.history.take_instance(&instance).ok_or(Error::NoData)
    }

    /// Remove and return the oldest available sample of the instance that
    /// follows `previous` in the cache's arrival-ordered instance list (or
    /// the first instance if `previous` is `None`), wrapping DDS's
    /// `take_next_instance` iteration over multi-instance topics.
    pub fn take_next_instance(&self, previous: Option<InstanceHandle>) -> Result<Sample> {
        let instances = self.history.instances();
        if instances.is_empty() {
            return Err(Error::NoData);
        }
        let start = match previous {
            None => 0,
            Some(prev) => instances.iter().position(|i| *i == prev).map_or(0, |p| p + 1),
        };
        for instance in instances.into_iter().skip(start) {
            if let Some(sample) = self.history.take_instance(&instance) {
                return Ok(sample);
            }
        }
        Err(Error::NoData)
    }

    #[must_use]
    pub fn matched_writer_count(&self) -> usize {
        self.matched_writers.lock().len()
    }

    #[must_use]
    pub fn history_cache(&self) -> &HistoryCache {
        &self.history
    }

    #[must_use]
    pub fn reliability(&self) -> &ReaderReliability {
        &self.reliability
    }

    /// A clonable handle to this reader's status condition, for attaching
    /// to a [`crate::waitset::WaitSet`].
    #[must_use]
    pub fn status_condition_arc(&self) -> Arc<StatusCondition> {
        self.status_condition.clone()
    }

    pub fn tick_deadline(&self, now_ns: u64) -> Vec<InstanceHandle> {
        let missed = self.deadline.tick(now_ns);
        if !missed.is_empty() {
            self.status_condition.raise(StatusMask::REQUESTED_DEADLINE_MISSED);
        }
        missed
    }

    /// Tick LIVELINESS leases for matched writers, excluding any that just
    /// expired from ownership arbitration.
    pub fn tick_liveliness(&self, now_ns: u64) -> Vec<Guid> {
        let expired = self.liveliness.tick(now_ns);
        if !expired.is_empty() {
            for writer in &expired {
                self.ownership.remove_writer_everywhere(writer);
            }
            self.status_condition.raise(StatusMask::LIVELINESS_CHANGED);
        }
        expired
    }
}

impl HasStatusCondition for DataReader {
    fn status_condition(&self) -> &StatusCondition {
        &self.status_condition
    }
}
