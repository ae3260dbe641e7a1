// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The matching rule: topic-name/type-hash match, then QoS
//! compatibility, then partition overlap. Wires matches and unmatches into
//! locally-owned writers/readers and signals the owning participant's
//! graph guard condition exactly once per announcement processed.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::entity::registry::{Entity, EntityRegistry};
use crate::guid::Guid;
use crate::qos::compat::{check_compatibility, IncompatiblePolicy};
use crate::waitset::GuardCondition;

use super::sedp::{EndpointAnnouncement, EndpointKind, SedpDatabase};

/// Tracks which (writer, reader) pairs are currently matched so an
/// unmatch can be applied symmetrically without re-deriving compatibility.
pub struct Matcher {
    registry: Arc<EntityRegistry>,
    sedp: Arc<SedpDatabase>,
    graph_guard: Arc<GuardCondition>,
    matched_pairs: Mutex<HashSet<(Guid, Guid)>>,
}

impl Matcher {
    #[must_use]
    pub fn new(registry: Arc<EntityRegistry>, sedp: Arc<SedpDatabase>, graph_guard: Arc<GuardCondition>) -> Self {
        Self { registry, sedp, graph_guard, matched_pairs: Mutex::new(HashSet::new()) }
    }

    /// Process one SEDP sample: apply it to the database, then re-evaluate
    /// matches against every opposite-kind endpoint already known for the
    /// same topic.
    ///
    /// Re-announcing a still-live endpoint (e.g. after a `PARTITION` change)
    /// drops any of its existing matches the new QoS no longer permits
    /// before looking for new ones, so a live reconfiguration re-matches
    /// SEDP rather than sticking with stale pairs.
    pub fn on_endpoint_announced(&self, ann: EndpointAnnouncement) {
        let disposed = ann.disposed;
        let (guid, kind, topic) = (ann.guid, ann.kind, ann.topic.clone());
        self.sedp.apply(ann);

        if disposed {
            self.unmatch_all(guid);
            self.graph_guard.set_trigger_value(true);
            return;
        }

        let mut changed = self.revalidate_existing_matches(guid);

        let candidates = match kind {
            EndpointKind::Writer => self.sedp.readers_for_topic(&topic),
            EndpointKind::Reader => self.sedp.writers_for_topic(&topic),
        };

        for candidate in candidates {
            let (writer_guid, reader_guid, writer_qos, reader_qos) = match kind {
                EndpointKind::Writer => {
                    let ann = self.sedp.get(&guid).expect("just applied");
                    (guid, candidate.guid, ann.qos, candidate.qos)
                }
                EndpointKind::Reader => {
                    let ann = self.sedp.get(&guid).expect("just applied");
                    (candidate.guid, guid, candidate.qos, ann.qos)
                }
            };
            match check_compatibility(&reader_qos, &writer_qos) {
                Ok(()) => {
                    if self.connect(writer_guid, reader_guid, writer_qos.ownership_strength) {
                        changed = true;
                    }
                }
                Err(policy) => self.report_incompatible(writer_guid, reader_guid, policy),
            }
        }
        if changed {
            self.graph_guard.set_trigger_value(true);
        }
    }

    fn connect(&self, writer_guid: Guid, reader_guid: Guid, writer_strength: i32) -> bool {
        if !self.matched_pairs.lock().insert((writer_guid, reader_guid)) {
            return false;
        }
        log::debug!("[matcher] matched writer={writer_guid} reader={reader_guid}");
        let local_writer = self.registry.lookup_by_guid(&writer_guid);
        if let Some(Entity::Writer(writer)) = &local_writer {
            writer.match_reader(reader_guid);
        }
        if let Some(Entity::Reader(reader)) = self.registry.lookup_by_guid(&reader_guid) {
            reader.match_writer(writer_guid, writer_strength);
            if let Some(Entity::Writer(writer)) = &local_writer {
                if writer.qos.durability >= crate::qos::Durability::TransientLocal {
                    let replayed = writer.history_cache().replay_all();
                    log::debug!(
                        "[matcher] replaying {} retained sample(s) from writer={writer_guid} to reader={reader_guid}",
                        replayed.len()
                    );
                    for sample in replayed {
                        let _ = reader.replay(&sample);
                    }
                }
            }
        }
        true
    }

    fn unmatch_all(&self, guid: Guid) {
        let gone: Vec<(Guid, Guid)> = {
            let mut pairs = self.matched_pairs.lock();
            let gone: Vec<(Guid, Guid)> = pairs.iter().copied().filter(|(w, r)| *w == guid || *r == guid).collect();
            for pair in &gone {
                pairs.remove(pair);
            }
            gone
        };
        log::debug!("[matcher] endpoint={guid} disposed, unmatching {} pair(s)", gone.len());
        for (writer_guid, reader_guid) in gone {
            self.disconnect(writer_guid, reader_guid);
        }
    }

    fn disconnect(&self, writer_guid: Guid, reader_guid: Guid) {
        if let Some(Entity::Writer(writer)) = self.registry.lookup_by_guid(&writer_guid) {
            writer.unmatch_reader(&reader_guid);
        }
        if let Some(Entity::Reader(reader)) = self.registry.lookup_by_guid(&reader_guid) {
            reader.unmatch_writer(&writer_guid);
        }
    }

    /// Surface a QoS incompatibility on whichever side is locally owned:
    /// `REQUESTED_INCOMPATIBLE_QOS` on the reader, `OFFERED_INCOMPATIBLE_QOS`
    /// on the writer, both carrying the offending policy.
    fn report_incompatible(&self, writer_guid: Guid, reader_guid: Guid, policy: IncompatiblePolicy) {
        if let Some(Entity::Reader(reader)) = self.registry.lookup_by_guid(&reader_guid) {
            reader.on_requested_incompatible_qos(policy);
        }
        if let Some(Entity::Writer(writer)) = self.registry.lookup_by_guid(&writer_guid) {
            writer.on_offered_incompatible_qos(policy);
        }
    }

    /// Re-check every currently matched pair involving `guid` against the
    /// SEDP database's latest QoS for both sides, unmatching any pair the
    /// compatibility rule no longer accepts (e.g. the endpoint's
    /// `PARTITION` was changed to one that no longer overlaps its peer's).
    fn revalidate_existing_matches(&self, guid: Guid) -> bool {
        let stale: Vec<(Guid, Guid, IncompatiblePolicy)> = {
            let pairs = self.matched_pairs.lock();
            pairs
                .iter()
                .copied()
                .filter(|(w, r)| *w == guid || *r == guid)
                .filter_map(|(w, r)| {
                    let (Some(w_ann), Some(r_ann)) = (self.sedp.get(&w), self.sedp.get(&r)) else {
                        return None;
                    };
                    check_compatibility(&r_ann.qos, &w_ann.qos).err().map(|policy| (w, r, policy))
                })
                .collect()
        };
        if stale.is_empty() {
            return false;
        }
        log::debug!("[matcher] endpoint={guid} reconfigured, dropping {} stale pair(s)", stale.len());
        let mut pairs = self.matched_pairs.lock();
        for (w, r, _) in &stale {
            pairs.remove(&(*w, *r));
        }
        drop(pairs);
        for (writer_guid, reader_guid, policy) in stale {
            self.disconnect(writer_guid, reader_guid);
            self.report_incompatible(writer_guid, reader_guid, policy);
        }
        true
    }

    #[must_use]
    pub fn matched_pair_count(&self) -> usize {
        self.matched_pairs.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::reader::DataReader;
    use crate::entity::topic::Topic;
    use crate::entity::writer::DataWriter;
    use crate::error::Error;
    use crate::qos::QosSet;

    fn guid(n: u8) -> Guid {
        Guid::new([n; 12], [0; 4])
    }

    fn harness() -> (Arc<EntityRegistry>, Arc<SedpDatabase>, Arc<GuardCondition>, Matcher) {
        let registry = Arc::new(EntityRegistry::new());
        let sedp = Arc::new(SedpDatabase::new());
        let graph_guard = Arc::new(GuardCondition::new());
        let matcher = Matcher::new(registry.clone(), sedp.clone(), graph_guard.clone());
        (registry, sedp, graph_guard, matcher)
    }

    #[test]
    fn compatible_writer_and_reader_match_and_signal_graph() {
        let (registry, _sedp, graph_guard, matcher) = harness();
        let topic = Topic::new("t", "T");
        let writer = Arc::new(DataWriter::new(guid(1), topic.clone(), QosSet::default()).unwrap());
        let reader = Arc::new(DataReader::new(guid(2), topic.clone(), QosSet::default()).unwrap());
        registry.register(guid(1), Entity::Writer(writer.clone())).unwrap();
        registry.register(guid(2), Entity::Reader(reader.clone())).unwrap();

        matcher.on_endpoint_announced(EndpointAnnouncement::new(
            guid(1),
            guid(100),
            EndpointKind::Writer,
            topic.clone(),
            QosSet::default(),
        ));
        assert!(!graph_guard.is_triggered());

        matcher.on_endpoint_announced(EndpointAnnouncement::new(
            guid(2),
            guid(200),
            EndpointKind::Reader,
            topic,
            QosSet::default(),
        ));
        assert!(graph_guard.is_triggered());
        assert_eq!(writer.matched_reader_count(), 1);
        assert_eq!(reader.matched_writer_count(), 1);
    }

    #[test]
    fn incompatible_reliability_never_matches() {
        let (registry, _sedp, graph_guard, matcher) = harness();
        let topic = Topic::new("t", "T");
        let writer = Arc::new(DataWriter::new(guid(1), topic.clone(), QosSet::default()).unwrap());
        let mut reader_qos = QosSet::default();
        reader_qos.reliability = crate::qos::policy::Reliability::reliable(u64::MAX);
        let reader = Arc::new(DataReader::new(guid(2), topic.clone(), reader_qos.clone()).unwrap());
        registry.register(guid(1), Entity::Writer(writer.clone())).unwrap();
        registry.register(guid(2), Entity::Reader(reader.clone())).unwrap();

        matcher.on_endpoint_announced(EndpointAnnouncement::new(guid(1), guid(100), EndpointKind::Writer, topic.clone(), QosSet::default()));
        matcher.on_endpoint_announced(EndpointAnnouncement::new(guid(2), guid(200), EndpointKind::Reader, topic, reader_qos));
        assert!(!graph_guard.is_triggered());
        assert_eq!(writer.matched_reader_count(), 0);

        use crate::qos::IncompatiblePolicy;
        let reader_status = reader.requested_incompatible_qos_status();
        assert_eq!(reader_status.total_count, 1);
        assert_eq!(reader_status.last_policy_id, Some(IncompatiblePolicy::Reliability));
        let writer_status = writer.offered_incompatible_qos_status();
        assert_eq!(writer_status.total_count, 1);
        assert_eq!(writer_status.last_policy_id, Some(IncompatiblePolicy::Reliability));
    }

    #[test]
    fn transient_local_late_joiner_receives_replay() {
        let (registry, _sedp, _graph_guard, matcher) = harness();
        let topic = Topic::new("t", "T");
        let mut qos = QosSet::default();
        qos.durability = crate::qos::Durability::TransientLocal;
        qos.history = crate::qos::History::KeepLast(3);
        let writer = Arc::new(DataWriter::new(guid(1), topic.clone(), qos.clone()).unwrap());
        for i in 1..=5u64 {
            writer.write(b"k", vec![i as u8], i).unwrap();
        }
        registry.register(guid(1), Entity::Writer(writer.clone())).unwrap();
        matcher.on_endpoint_announced(EndpointAnnouncement::new(guid(1), guid(100), EndpointKind::Writer, topic.clone(), qos.clone()));

        let reader = Arc::new(DataReader::new(guid(2), topic.clone(), qos.clone()).unwrap());
        registry.register(guid(2), Entity::Reader(reader.clone())).unwrap();
        matcher.on_endpoint_announced(EndpointAnnouncement::new(guid(2), guid(200), EndpointKind::Reader, topic, qos));

        assert_eq!(reader.take().unwrap().payload, vec![3]);
        assert_eq!(reader.take().unwrap().payload, vec![4]);
        assert_eq!(reader.take().unwrap().payload, vec![5]);
        assert!(matches!(reader.take().unwrap_err(), Error::NoData));
    }

    #[test]
    fn reconfiguring_partition_unmatches_and_can_later_rematch() {
        use crate::qos::Partition;

        let (registry, _sedp, graph_guard, matcher) = harness();
        let topic = Topic::new("t", "T");
        let writer = Arc::new(DataWriter::new(guid(1), topic.clone(), QosSet::default()).unwrap());
        let reader = Arc::new(DataReader::new(guid(2), topic.clone(), QosSet::default()).unwrap());
        registry.register(guid(1), Entity::Writer(writer.clone())).unwrap();
        registry.register(guid(2), Entity::Reader(reader.clone())).unwrap();
        matcher.on_endpoint_announced(EndpointAnnouncement::new(guid(1), guid(100), EndpointKind::Writer, topic.clone(), QosSet::default()));
        matcher.on_endpoint_announced(EndpointAnnouncement::new(guid(2), guid(200), EndpointKind::Reader, topic.clone(), QosSet::default()));
        assert_eq!(writer.matched_reader_count(), 1);
        graph_guard.set_trigger_value(false);

        // Writer moves to a partition the reader's default partition no longer overlaps.
        let mut moved_qos = QosSet::default();
        moved_qos.partition = Partition::new(vec!["robots".into()]);
        matcher.on_endpoint_announced(EndpointAnnouncement::new(guid(1), guid(100), EndpointKind::Writer, topic.clone(), moved_qos.clone()));
        assert!(graph_guard.is_triggered());
        assert_eq!(writer.matched_reader_count(), 0);
        assert_eq!(reader.matched_writer_count(), 0);

        // Reader follows the writer into the same partition; they re-match.
        graph_guard.set_trigger_value(false);
        let mut reader_qos = QosSet::default();
        reader_qos.partition = Partition::new(vec!["robots".into()]);
        matcher.on_endpoint_announced(EndpointAnnouncement::new(guid(2), guid(200), EndpointKind::Reader, topic, reader_qos));
        assert!(graph_guard.is_triggered());
        assert_eq!(writer.matched_reader_count(), 1);
        assert_eq!(reader.matched_writer_count(), 1);
    }

    #[test]
    fn disposing_a_writer_unmatches_and_signals_graph() {
        let (registry, _sedp, graph_guard, matcher) = harness();
        let topic = Topic::new("t", "T");
        let writer = Arc::new(DataWriter::new(guid(1), topic.clone(), QosSet::default()).unwrap());
        let reader = Arc::new(DataReader::new(guid(2), topic.clone(), QosSet::default()).unwrap());
        registry.register(guid(1), Entity::Writer(writer.clone())).unwrap();
        registry.register(guid(2), Entity::Reader(reader.clone())).unwrap();
        matcher.on_endpoint_announced(EndpointAnnouncement::new(guid(1), guid(100), EndpointKind::Writer, topic.clone(), QosSet::default()));
        matcher.on_endpoint_announced(EndpointAnnouncement::new(guid(2), guid(200), EndpointKind::Reader, topic.clone(), QosSet::default()));
        graph_guard.set_trigger_value(false);

        let withdraw = EndpointAnnouncement::new(guid(1), guid(100), EndpointKind::Writer, topic, QosSet::default()).disposing();
        matcher.on_endpoint_announced(withdraw);
        assert!(graph_guard.is_triggered());
        assert_eq!(writer.matched_reader_count(), 0);
        assert_eq!(reader.matched_writer_count(), 0);
    }
}
