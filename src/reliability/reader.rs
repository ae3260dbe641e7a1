// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reader-side reliability state: per matched writer,
//! `missing_changes` / `received_changes`, a bitmap window anchored at the
//! next expected sequence number.

use std::collections::{BTreeSet, HashMap};

use parking_lot::Mutex;

use crate::guid::Guid;

use super::messages::{AckNackMsg, HeartbeatMsg};

/// Reliability bookkeeping for one remote writer matched to a local reader.
#[derive(Debug, Default)]
struct WriterProxy {
    /// Next sequence this reader expects to receive in order.
    next_expected: u64,
    received: BTreeSet<u64>,
    missing: BTreeSet<u64>,
    acknack_count: u32,
}

/// Drives ACKNACK generation for one reader across all of its matched writers.
pub struct ReaderReliability {
    proxies: Mutex<HashMap<Guid, WriterProxy>>,
}

impl ReaderReliability {
    #[must_use]
    pub fn new() -> Self {
        Self { proxies: Mutex::new(HashMap::new()) }
    }

    pub fn match_writer(&self, writer: Guid) {
        self.proxies.lock().entry(writer).or_insert(WriterProxy {
            next_expected: 1,
            ..WriterProxy::default()
        });
    }

    pub fn unmatch_writer(&self, writer: &Guid) {
        self.proxies.lock().remove(writer);
    }

    /// Record that a DATA submessage for `seq` arrived from `writer`.
    pub fn on_data(&self, writer: &Guid, seq: u64) {
        let Some(proxy) = self.proxies.lock().get_mut(writer) else { return };
        proxy.received.insert(seq);
        proxy.missing.remove(&seq);
        while proxy.received.contains(&proxy.next_expected) {
            proxy.next_expected += 1;
        }
    }

    /// Process a HEARTBEAT, discovering any sequences in `[1, last_seq]`
    /// this reader has not received and is not already tracking as missing.
    pub fn on_heartbeat(&self, hb: &HeartbeatMsg) {
        let Some(proxy) = self.proxies.lock().get_mut(&hb.writer) else { return };
        for seq in proxy.next_expected..=hb.last_seq {
            if !proxy.received.contains(&seq) {
                proxy.missing.insert(seq);
            }
        }
    }

    /// Build the ACKNACK to send in response to the writer's last HEARTBEAT.
    #[must_use]
    pub fn build_acknack(&self, reader: Guid, writer: &Guid) -> Option<AckNackMsg> {
        let mut proxies = self.proxies.lock();
        let proxy = proxies.get_mut(writer)?;
        let count = proxy.acknack_count;
        proxy.acknack_count = proxy.acknack_count.wrapping_add(1);
        Some(AckNackMsg {
            reader,
            base: proxy.next_expected,
            missing: proxy.missing.clone(),
            count,
        })
    }

    #[must_use]
    pub fn missing_for(&self, writer: &Guid) -> BTreeSet<u64> {
        self.proxies.lock().get(writer).map(|p| p.missing.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn next_expected(&self, writer: &Guid) -> u64 {
        self.proxies.lock().get(writer).map(|p| p.next_expected).unwrap_or(1)
    }
}

impl Default for ReaderReliability {
    fn default() -> Self {
        Self::new()
    }
}
