// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! C1: the entity registry. GUID-addressable lookup for
//! every live participant, writer and reader in the process, plus the
//! destroy-order and graph-guard-condition bookkeeping that spans them.

use std::sync::Arc;

use dashmap::DashMap;

use crate::error::{Error, Result};
use crate::guid::Guid;

use super::reader::DataReader;
use super::writer::DataWriter;

#[derive(Clone)]
pub enum Entity {
    Writer(Arc<DataWriter>),
    Reader(Arc<DataReader>),
}

/// Process-wide table of live entities, keyed by GUID.
#[derive(Default)]
pub struct EntityRegistry {
    entities: DashMap<Guid, Entity>,
}

impl EntityRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { entities: DashMap::new() }
    }

    /// Register a newly created entity under its GUID.
    ///
    /// # Errors
    /// Returns [`Error::Error`] on a GUID collision, which should never
    /// happen given how GUIDs are allocated, but the registry defends the
    /// invariant that a GUID is never reused while live.
    pub fn register(&self, guid: Guid, entity: Entity) -> Result<()> {
        if self.entities.contains_key(&guid) {
            return Err(Error::Error);
        }
        self.entities.insert(guid, entity);
        Ok(())
    }

    #[must_use]
    pub fn lookup_by_guid(&self, guid: &Guid) -> Option<Entity> {
        self.entities.get(guid).map(|e| e.clone())
    }

    /// Remove the entity from the registry. Does not itself enforce the
    /// readers-before-writers destroy order; that ordering
    /// is the caller's (participant's) responsibility since only it knows
    /// the full parent/child graph.
    pub fn unregister(&self, guid: &Guid) {
        self.entities.remove(guid);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
