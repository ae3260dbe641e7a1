// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SEDP: reliable, transient-local endpoint discovery. One
//! sample per local writer or reader, carrying GUID, topic name, type
//! name, type hash and the full QoS set. A disposed sample withdraws the
//! endpoint.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::entity::topic::Topic;
use crate::guid::Guid;
use crate::qos::QosSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    Writer,
    Reader,
}

#[derive(Debug, Clone)]
pub struct EndpointAnnouncement {
    pub guid: Guid,
    pub participant: Guid,
    pub kind: EndpointKind,
    pub topic: Topic,
    pub qos: QosSet,
    pub disposed: bool,
}

impl EndpointAnnouncement {
    #[must_use]
    pub fn new(guid: Guid, participant: Guid, kind: EndpointKind, topic: Topic, qos: QosSet) -> Self {
        Self { guid, participant, kind, topic, qos, disposed: false }
    }

    #[must_use]
    pub fn disposing(mut self) -> Self {
        self.disposed = true;
        self
    }
}

/// The transient-local sample store of remote writer/reader announcements,
/// one participant's view of every other participant's endpoints.
pub struct SedpDatabase {
    endpoints: Mutex<HashMap<Guid, EndpointAnnouncement>>,
}

impl SedpDatabase {
    #[must_use]
    pub fn new() -> Self {
        Self { endpoints: Mutex::new(HashMap::new()) }
    }

    /// Apply an announcement, returning the prior entry it replaced (if
    /// any) so the caller (the matcher) can diff proxies.
    pub fn apply(&self, ann: EndpointAnnouncement) -> Option<EndpointAnnouncement> {
        if ann.disposed {
            return self.endpoints.lock().remove(&ann.guid);
        }
        self.endpoints.lock().insert(ann.guid, ann)
    }

    #[must_use]
    pub fn get(&self, guid: &Guid) -> Option<EndpointAnnouncement> {
        self.endpoints.lock().get(guid).cloned()
    }

    #[must_use]
    pub fn writers_for_topic(&self, topic: &Topic) -> Vec<EndpointAnnouncement> {
        self.endpoints
            .lock()
            .values()
            .filter(|e| e.kind == EndpointKind::Writer && e.topic.matches(topic))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn readers_for_topic(&self, topic: &Topic) -> Vec<EndpointAnnouncement> {
        self.endpoints
            .lock()
            .values()
            .filter(|e| e.kind == EndpointKind::Reader && e.topic.matches(topic))
            .cloned()
            .collect()
    }

    /// Withdraw every endpoint owned by a participant whose SPDP lease expired.
    pub fn withdraw_participant(&self, participant: &Guid) -> Vec<Guid> {
        let mut withdrawn = Vec::new();
        self.endpoints.lock().retain(|guid, ann| {
            let keep = ann.participant != *participant;
            if !keep {
                withdrawn.push(*guid);
            }
            keep
        });
        withdrawn
    }
}

impl Default for SedpDatabase {
    fn default() -> Self {
        Self::new()
    }
}
