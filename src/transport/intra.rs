// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `INTRA_PROCESS` transport: an in-memory ring per topic.
//! Still runs the full discovery/QoS matching pipeline for parity with
//! `UDP_MULTICAST`, only the bytes-on-the-wire step is skipped.

use std::collections::HashMap;
use std::sync::Arc;

use crossbeam::channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;

use crate::entity::topic::Topic;
use crate::guid::Guid;

/// One wire-format-equivalent message handed directly to matched readers.
#[derive(Debug, Clone)]
pub struct IntraMessage {
    pub writer: Guid,
    pub seq: u64,
    pub key_cdr_bytes: Vec<u8>,
    pub payload: Vec<u8>,
    pub source_timestamp_ns: u64,
    pub disposed: bool,
}

/// A per-topic fanout ring: every subscriber gets its own receiver fed by
/// a shared sender, so slow readers never block writers or each other.
pub struct IntraBus {
    topics: Mutex<HashMap<String, Vec<Sender<IntraMessage>>>>,
}

impl IntraBus {
    #[must_use]
    pub fn new() -> Self {
        Self { topics: Mutex::new(HashMap::new()) }
    }

    #[must_use]
    pub fn subscribe(&self, topic: &Topic) -> Receiver<IntraMessage> {
        let (tx, rx) = unbounded();
        self.topics.lock().entry(topic.name.clone()).or_default().push(tx);
        rx
    }

    pub fn publish(&self, topic: &Topic, msg: IntraMessage) {
        if let Some(subs) = self.topics.lock().get(&topic.name) {
            for tx in subs {
                let _ = tx.send(msg.clone());
            }
        }
    }
}

impl Default for IntraBus {
    fn default() -> Self {
        Self::new()
    }
}

pub type SharedIntraBus = Arc<IntraBus>;
