// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The Participant entity: owns a domain id, endpoints,
//! the discovery database and a graph-change guard condition.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::discovery::{EndpointAnnouncement, EndpointKind, Matcher, SedpDatabase, SpdpDatabase};
use crate::error::{Error, Result};
use crate::guid::{Guid, ENTITY_KIND_USER_READER, ENTITY_KIND_USER_WRITER};
use crate::qos::{LivelinessKind, Partition, QosSet};
use crate::telemetry::{MetricsSnapshot, Telemetry};
use crate::transport::TransportMode;
use crate::waitset::GuardCondition;

use super::guid_pool::ParticipantIdPool;
use super::reader::DataReader;
use super::registry::{Entity, EntityRegistry};
use super::topic::Topic;
use super::writer::DataWriter;

/// Maximum domain id per RTPS.
pub const MAX_DOMAIN_ID: u32 = 232;

pub struct Participant {
    pub guid: Guid,
    pub name: String,
    pub domain_id: u32,
    pub transport_mode: TransportMode,
    participant_id: u8,
    id_pool: Arc<ParticipantIdPool>,
    registry: Arc<EntityRegistry>,
    sedp: Arc<SedpDatabase>,
    spdp: Arc<SpdpDatabase>,
    matcher: Matcher,
    spdp_version: AtomicU64,
    entity_counter: AtomicU32,
    owned_readers: Mutex<Vec<Guid>>,
    owned_writers: Mutex<Vec<Guid>>,
    graph_guard: Arc<GuardCondition>,
    torn_down: Mutex<bool>,
    telemetry: Telemetry,
}

impl Participant {
    /// # Errors
    /// `BadParameter` for a malformed name or out-of-range domain id;
    /// `OutOfResources` if the host's 120-slot participant-id pool is exhausted.
    pub fn new(
        name: impl Into<String>,
        domain_id: u32,
        transport_mode: TransportMode,
        id_pool: Arc<ParticipantIdPool>,
        registry: Arc<EntityRegistry>,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::BadParameter("participant name must not be empty".into()));
        }
        if domain_id > MAX_DOMAIN_ID {
            return Err(Error::BadParameter(format!("domain id {domain_id} exceeds {MAX_DOMAIN_ID}")));
        }

        let participant_id = id_pool.allocate();
        if participant_id == crate::guid::PARTICIPANT_ID_SENTINEL {
            return Err(Error::OutOfResources("participant-id pool exhausted".into()));
        }

        let prefix = Guid::participant_prefix(u32::from(participant_id), std::process::id(), domain_id);
        let guid = Guid::participant_guid(prefix);
        let graph_guard = Arc::new(GuardCondition::new());
        let sedp = Arc::new(SedpDatabase::new());
        let matcher = Matcher::new(registry.clone(), sedp.clone(), graph_guard.clone());

        Ok(Self {
            guid,
            name,
            domain_id,
            transport_mode,
            participant_id,
            id_pool,
            registry,
            sedp,
            spdp: Arc::new(SpdpDatabase::new()),
            matcher,
            spdp_version: AtomicU64::new(0),
            entity_counter: AtomicU32::new(0),
            owned_readers: Mutex::new(Vec::new()),
            owned_writers: Mutex::new(Vec::new()),
            graph_guard,
            torn_down: Mutex::new(false),
            telemetry: Telemetry::new(),
        })
    }

    #[must_use]
    pub fn spdp_database(&self) -> &SpdpDatabase {
        &self.spdp
    }

    /// Live snapshot of this participant's send/receive counters.
    #[must_use]
    pub fn telemetry(&self) -> MetricsSnapshot {
        self.telemetry.snapshot()
    }

    #[must_use]
    pub fn sedp_database(&self) -> &SedpDatabase {
        &self.sedp
    }

    /// Bump and return the monotonic SPDP version counter for the next
    /// announcement.
    pub fn next_spdp_version(&self) -> u64 {
        self.spdp_version.fetch_add(1, Ordering::Relaxed) + 1
    }

    #[must_use]
    pub fn graph_guard_condition(&self) -> Arc<GuardCondition> {
        self.graph_guard.clone()
    }

    fn next_entity_id(&self, kind: u8) -> [u8; 4] {
        let counter = self.entity_counter.fetch_add(1, Ordering::Relaxed);
        Guid::user_entity_id(counter, kind)
    }

    /// # Errors
    /// `InconsistentPolicy` from `DataWriter::new`; `Error` on a GUID
    /// collision (should not occur given monotonic per-participant ids).
    pub fn create_writer(&self, topic: Topic, qos: QosSet) -> Result<Arc<DataWriter>> {
        let guid = Guid::new(self.guid.prefix, self.next_entity_id(ENTITY_KIND_USER_WRITER));
        log::debug!("[participant {}] creating writer={guid} topic={}", self.guid, topic.name);
        let writer = Arc::new(DataWriter::new(guid, topic.clone(), qos.clone())?);
        self.registry.register(guid, Entity::Writer(writer.clone()))?;
        self.owned_writers.lock().push(guid);
        self.matcher.on_endpoint_announced(EndpointAnnouncement::new(
            guid,
            self.guid,
            EndpointKind::Writer,
            topic,
            qos,
        ));
        Ok(writer)
    }

    /// # Errors
    /// `InconsistentPolicy` from `DataReader::new`; `Error` on a GUID
    /// collision (should not occur given monotonic per-participant ids).
    pub fn create_reader(&self, topic: Topic, qos: QosSet) -> Result<Arc<DataReader>> {
        let guid = Guid::new(self.guid.prefix, self.next_entity_id(ENTITY_KIND_USER_READER));
        let reader = Arc::new(DataReader::new(guid, topic.clone(), qos.clone())?);
        self.registry.register(guid, Entity::Reader(reader.clone()))?;
        self.owned_readers.lock().push(guid);
        self.matcher.on_endpoint_announced(EndpointAnnouncement::new(
            guid,
            self.guid,
            EndpointKind::Reader,
            topic,
            qos,
        ));
        Ok(reader)
    }

    /// Publish a sample through `writer`, delivering it to matched local
    /// readers under `INTRA_PROCESS`. Under `UDP_MULTICAST` this only admits the sample into the
    /// writer's own history and reliability state; wire delivery to remote
    /// readers happens on the transport's send path.
    ///
    /// A `MANUAL_BY_PARTICIPANT` writer's liveliness is asserted by any
    /// write on any of this participant's writers, so writing here also
    /// asserts every other `MANUAL_BY_PARTICIPANT` writer owned by this
    /// participant to its own matched readers. `MANUAL_BY_TOPIC` needs no
    /// extra step: a reader's `on_data` already asserts the writer that
    /// actually sent the sample.
    ///
    /// # Errors
    /// Propagates `OUT_OF_RESOURCES` from the writer's history cache.
    pub fn write(
        &self,
        writer: &DataWriter,
        key_cdr_bytes: &[u8],
        payload: Vec<u8>,
        source_timestamp_ns: u64,
    ) -> Result<u64> {
        let seq = writer.write(key_cdr_bytes, payload.clone(), source_timestamp_ns)?;
        self.telemetry.record_sent(payload.len());
        if self.transport_mode == TransportMode::IntraProcess {
            for reader_guid in writer.matched_reader_guids() {
                if let Some(Entity::Reader(reader)) = self.registry.lookup_by_guid(&reader_guid) {
                    match reader.on_data(writer.guid, seq, key_cdr_bytes, payload.clone(), source_timestamp_ns, false) {
                        Ok(true) => self.telemetry.record_received(),
                        Ok(false) | Err(_) => self.telemetry.record_dropped(),
                    }
                }
            }
        }
        if writer.qos.liveliness.kind == LivelinessKind::ManualByParticipant {
            for other_guid in self.owned_writers.lock().iter().copied().collect::<Vec<_>>() {
                if other_guid == writer.guid {
                    continue;
                }
                if let Some(Entity::Writer(other)) = self.registry.lookup_by_guid(&other_guid) {
                    if other.qos.liveliness.kind == LivelinessKind::ManualByParticipant {
                        self.assert_writer_liveliness(&other, source_timestamp_ns);
                    }
                }
            }
        }
        Ok(seq)
    }

    /// Assert `writer`'s liveliness to every one of its currently matched
    /// readers, without delivering a sample.
    fn assert_writer_liveliness(&self, writer: &DataWriter, now_ns: u64) {
        for reader_guid in writer.matched_reader_guids() {
            if let Some(Entity::Reader(reader)) = self.registry.lookup_by_guid(&reader_guid) {
                reader.assert_writer_liveliness(writer.guid, now_ns);
            }
        }
    }

    /// Drive the `AUTOMATIC` liveliness beat: assert every owned writer
    /// whose `LIVELINESS` kind is `AUTOMATIC` to its matched readers,
    /// independent of whether that writer has written recently. Call this
    /// from the same periodic tick that drives `DEADLINE`/`LIFESPAN`
    /// sweeps, the participant-wide analogue of a discovery beat.
    pub fn tick_automatic_liveliness(&self, now_ns: u64) {
        for writer_guid in self.owned_writers.lock().iter().copied().collect::<Vec<_>>() {
            if let Some(Entity::Writer(writer)) = self.registry.lookup_by_guid(&writer_guid) {
                if writer.qos.liveliness.kind == LivelinessKind::Automatic {
                    self.assert_writer_liveliness(&writer, now_ns);
                }
            }
        }
    }

    /// Reconfigure `writer`'s `PARTITION` and re-announce it over SEDP,
    /// re-matching against every known opposite-kind endpoint and dropping
    /// any existing match the new partition no longer overlaps.
    pub fn set_writer_partition(&self, writer: &DataWriter, partition: Partition) {
        writer.set_partition(partition);
        self.matcher.on_endpoint_announced(EndpointAnnouncement::new(
            writer.guid,
            self.guid,
            EndpointKind::Writer,
            writer.topic.clone(),
            writer.effective_qos(),
        ));
    }

    /// Reconfigure `reader`'s `PARTITION` and re-announce it over SEDP; see
    /// [`Self::set_writer_partition`].
    pub fn set_reader_partition(&self, reader: &DataReader, partition: Partition) {
        reader.set_partition(partition);
        self.matcher.on_endpoint_announced(EndpointAnnouncement::new(
            reader.guid,
            self.guid,
            EndpointKind::Reader,
            reader.topic.clone(),
            reader.effective_qos(),
        ));
    }

    pub fn destroy_writer(&self, guid: &Guid) {
        log::debug!("[participant {}] destroying writer={guid}", self.guid);
        if let Some(ann) = self.sedp.get(guid) {
            self.matcher.on_endpoint_announced(ann.disposing());
        }
        self.registry.unregister(guid);
        self.owned_writers.lock().retain(|g| g != guid);
    }

    pub fn destroy_reader(&self, guid: &Guid) {
        log::debug!("[participant {}] destroying reader={guid}", self.guid);
        if let Some(ann) = self.sedp.get(guid) {
            self.matcher.on_endpoint_announced(ann.disposing());
        }
        self.registry.unregister(guid);
        self.owned_readers.lock().retain(|g| g != guid);
    }

    /// Destroy the participant: readers, then writers, then the
    /// participant itself. Signals the graph guard
    /// condition exactly once, after every owned endpoint is gone.
    ///
    /// # Errors
    /// `PreconditionNotMet` if called twice.
    pub fn destroy(&self) -> Result<()> {
        let mut torn_down = self.torn_down.lock();
        if *torn_down {
            return Err(Error::PreconditionNotMet("participant already destroyed".into()));
        }
        *torn_down = true;
        drop(torn_down);

        for reader in self.owned_readers.lock().drain(..).collect::<Vec<_>>() {
            self.destroy_reader(&reader);
        }
        for writer in self.owned_writers.lock().drain(..).collect::<Vec<_>>() {
            self.destroy_writer(&writer);
        }
        self.id_pool.release(self.participant_id);
        self.graph_guard.set_trigger_value(true);
        Ok(())
    }
}
