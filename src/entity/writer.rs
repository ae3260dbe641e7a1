// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The DataWriter entity: GUID, topic, QoS, history cache,
//! reliability state and matched remote readers.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::guid::Guid;
use crate::history::{derive_instance_handle, HistoryCache, Sample};
use crate::qos::{compat::IncompatiblePolicy, deadline::DeadlineTracker, Partition, QosSet};
use crate::reliability::{SeqNumGenerator, WriterReliability, DEFAULT_HEARTBEAT_PERIOD};
use crate::waitset::{Condition, HasStatusCondition, StatusCondition, StatusMask};

use super::topic::Topic;

/// Mirrors the DDS `OfferedIncompatibleQosStatus` structure: a running
/// count plus the most recent offending policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfferedIncompatibleQosStatus {
    pub total_count: u32,
    pub last_policy_id: Option<IncompatiblePolicy>,
}

pub struct DataWriter {
    pub guid: Guid,
    pub topic: Topic,
    pub qos: QosSet,
    seq: SeqNumGenerator,
    history: HistoryCache,
    reliability: WriterReliability,
    deadline: DeadlineTracker,
    matched_readers: Mutex<HashSet<Guid>>,
    status_condition: Arc<StatusCondition>,
    /// `PARTITION` is the one QoS policy this crate treats as mutable after
    /// creation; every other policy is fixed in `qos` for the writer's
    /// lifetime.
    partition: Mutex<Partition>,
    offered_incompatible_qos: Mutex<OfferedIncompatibleQosStatus>,
}

impl DataWriter {
    /// # Errors
    /// `InconsistentPolicy` if `qos` fails self-validation.
    pub fn new(guid: Guid, topic: Topic, qos: QosSet) -> Result<Self> {
        qos.validate().map_err(Error::InconsistentPolicy)?;
        let partition = Mutex::new(qos.partition.clone());
        Ok(Self {
            guid,
            topic,
            history: HistoryCache::new(qos.history, qos.resource_limits, qos.lifespan),
            reliability: WriterReliability::new(DEFAULT_HEARTBEAT_PERIOD),
            deadline: DeadlineTracker::new(qos.deadline.period_ns),
            qos,
            seq: SeqNumGenerator::new(),
            matched_readers: Mutex::new(HashSet::new()),
            status_condition: Arc::new(StatusCondition::new()),
            partition,
            offered_incompatible_qos: Mutex::new(OfferedIncompatibleQosStatus::default()),
        })
    }

    #[must_use]
    pub fn partition(&self) -> Partition {
        self.partition.lock().clone()
    }

    /// Effective QoS set for this writer, with `PARTITION` replaced by its
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

    /// Encode and admit a sample, assigning it the next sequence number.
    ///
    /// # Errors
    /// Propagates `OUT_OF_RESOURCES` from the history cache under
    /// `KEEP_ALL`.
    pub fn write(&self, key_cdr_bytes: &[u8], payload: Vec<u8>, source_timestamp_ns: u64) -> Result<u64> {
        let seq = self.seq.next();
        let instance = derive_instance_handle(key_cdr_bytes);
        self.deadline.touch(instance, source_timestamp_ns);
        let sample = Sample::new(self.guid, seq, instance, source_timestamp_ns, payload, false);
        self.history.insert(sample)?;
        self.reliability.on_write(seq);
        Ok(seq)
    }

    pub fn match_reader(&self, reader: Guid) {
        self.matched_readers.lock().insert(reader);
        self.reliability.match_reader(reader);
        self.status_condition.raise(StatusMask::PUBLICATION_MATCHED);
    }

    pub fn unmatch_reader(&self, reader: &Guid) {
        self.matched_readers.lock().remove(reader);
        self.reliability.unmatch_reader(reader);
        self.status_condition.raise(StatusMask::PUBLICATION_MATCHED);
    }

    /// Record a discovery-time QoS incompatibility against `policy` and
    /// raise `OFFERED_INCOMPATIBLE_QOS`. Called by the matcher instead of
    /// connecting the pair.
    pub fn on_offered_incompatible_qos(&self, policy: IncompatiblePolicy) {
        let mut status = self.offered_incompatible_qos.lock();
        status.total_count += 1;
        status.last_policy_id = Some(policy);
        drop(status);
        self.status_condition.raise(StatusMask::OFFERED_INCOMPATIBLE_QOS);
    }

    #[must_use]
    pub fn offered_incompatible_qos_status(&self) -> OfferedIncompatibleQosStatus {
        *self.offered_incompatible_qos.lock()
    }

    #[must_use]
    pub fn matched_reader_count(&self) -> usize {
        self.matched_readers.lock().len()
    }

    #[must_use]
    pub fn matched_reader_guids(&self) -> Vec<Guid> {
        self.matched_readers.lock().iter().copied().collect()
    }

    #[must_use]
    pub fn history_cache(&self) -> &HistoryCache {
        &self.history
    }

    #[must_use]
    pub fn reliability(&self) -> &WriterReliability {
        &self.reliability
    }

    /// A clonable handle to this writer's status condition, for attaching
    /// to a [`crate::waitset::WaitSet`].
    #[must_use]
    pub fn status_condition_arc(&self) -> Arc<StatusCondition> {
        self.status_condition.clone()
    }

    /// Tick the per-instance DEADLINE timer, raising `OFFERED_DEADLINE_MISSED`
    /// on expiry.
    pub fn tick_deadline(&self, now_ns: u64) -> Vec<crate::history::InstanceHandle> {
        let missed = self.deadline.tick(now_ns);
        if !missed.is_empty() {
            self.status_condition.raise(StatusMask::OFFERED_DEADLINE_MISSED);
        }
        missed
    }
}

impl HasStatusCondition for DataWriter {
    fn status_condition(&self) -> &StatusCondition {
        &self.status_condition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guid(n: u8) -> Guid {
        Guid::new([n; 12], [0; 4])
    }

    #[test]
    fn write_assigns_strictly_increasing_sequences() {
        let w = DataWriter::new(guid(1), Topic::new("t", "T"), QosSet::default()).unwrap();
        assert_eq!(w.write(&[], vec![1], 0).unwrap(), 1);
        assert_eq!(w.write(&[], vec![2], 1).unwrap(), 2);
    }

    #[test]
    fn matching_a_reader_raises_publication_matched() {
        let w = DataWriter::new(guid(1), Topic::new("t", "T"), QosSet::default()).unwrap();
        assert!(!w.status_condition().is_triggered());
        w.match_reader(guid(2));
        assert!(w.status_condition().is_triggered());
        assert_eq!(w.matched_reader_count(), 1);
    }

    #[test]
    fn inconsistent_qos_is_rejected_at_creation() {
        let mut qos = QosSet::default();
        qos.history = crate::qos::History::KeepLast(0);
        let err = DataWriter::new(guid(1), Topic::new("t", "T"), qos).unwrap_err();
        assert!(matches!(err, Error::InconsistentPolicy(_)));
    }

    #[test]
    fn offered_incompatible_qos_records_the_offending_policy_and_raises_status() {
        let w = DataWriter::new(guid(1), Topic::new("t", "T"), QosSet::default()).unwrap();
        assert_eq!(w.offered_incompatible_qos_status().total_count, 0);
        w.on_offered_incompatible_qos(IncompatiblePolicy::Durability);
        assert!(w.status_condition().is_triggered());
        let status = w.offered_incompatible_qos_status();
        assert_eq!(status.total_count, 1);
        assert_eq!(status.last_policy_id, Some(IncompatiblePolicy::Durability));
    }
}
