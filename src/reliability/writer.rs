// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Writer-side reliability state: per matched reader,
//! `unsent_changes` / `unacked_changes` / `highest_ack`, plus heartbeat
//! cadence and NACK-driven retransmission.

use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::guid::Guid;

use super::backoff::Backoff;
use super::messages::{AckNackMsg, HeartbeatMsg};

/// Reliability bookkeeping for one remote reader matched to a local writer.
#[derive(Debug, Default)]
struct ReaderProxy {
    unsent: BTreeSet<u64>,
    unacked: BTreeSet<u64>,
    highest_ack: u64,
}

pub const DEFAULT_HEARTBEAT_PERIOD: Duration = Duration::from_millis(100);

/// Drives the HEARTBEAT/ACKNACK protocol for one RELIABLE writer across
/// all of its matched readers.
pub struct WriterReliability {
    heartbeat_period: Duration,
    heartbeat_count: Mutex<u32>,
    next_heartbeat_at: Mutex<Instant>,
    proxies: Mutex<HashMap<Guid, ReaderProxy>>,
    backoff: Mutex<Backoff>,
}

impl WriterReliability {
    #[must_use]
    pub fn new(heartbeat_period: Duration) -> Self {
        Self {
            heartbeat_period,
            heartbeat_count: Mutex::new(0),
            next_heartbeat_at: Mutex::new(Instant::now() + heartbeat_period),
            proxies: Mutex::new(HashMap::new()),
            backoff: Mutex::new(Backoff::new()),
        }
    }

    pub fn match_reader(&self, reader: Guid) {
        self.proxies.lock().entry(reader).or_default();
    }

    pub fn unmatch_reader(&self, reader: &Guid) {
        self.proxies.lock().remove(reader);
    }

    /// Record that `seq` was just written: every matched reader owes it,
    /// starting as unsent.
    pub fn on_write(&self, seq: u64) {
        for proxy in self.proxies.lock().values_mut() {
            proxy.unsent.insert(seq);
        }
    }

    /// Move `seq` from unsent to unacked for `reader` once placed on the wire.
    pub fn on_sent(&self, reader: &Guid, seq: u64) {
        if let Some(proxy) = self.proxies.lock().get_mut(reader) {
            proxy.unsent.remove(&seq);
            proxy.unacked.insert(seq);
        }
    }

    /// Apply an ACKNACK: sequences below `base` are acknowledged and dropped
    /// from `unacked`; sequences in `missing` are moved back to `unsent` so
    /// they are retransmitted.
    pub fn on_acknack(&self, ack: &AckNackMsg) {
        let mut proxies = self.proxies.lock();
        let Some(proxy) = proxies.get_mut(&ack.reader) else { return };
        proxy.highest_ack = proxy.highest_ack.max(ack.base.saturating_sub(1));
        proxy.unacked.retain(|&seq| seq >= ack.base);
        for &missing in &ack.missing {
            proxy.unacked.remove(&missing);
            proxy.unsent.insert(missing);
        }
    }

    /// True once every matched reader has ACKed at least up through `seq`
    /// ; the writer may garbage-collect the sample from its history cache.
    #[must_use]
    pub fn fully_acked(&self, seq: u64) -> bool {
        self.proxies.lock().values().all(|p| p.highest_ack >= seq)
    }

    #[must_use]
    pub fn unsent_for(&self, reader: &Guid) -> BTreeSet<u64> {
        self.proxies.lock().get(reader).map(|p| p.unsent.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn highest_ack(&self, reader: &Guid) -> u64 {
        self.proxies.lock().get(reader).map(|p| p.highest_ack).unwrap_or(0)
    }

    /// Build and schedule the next HEARTBEAT if its deadline has passed.
    pub fn maybe_build_heartbeat(
        &self,
        writer: Guid,
        first_seq: u64,
        last_seq: u64,
        now: Instant,
    ) -> Option<HeartbeatMsg> {
        let mut deadline = self.next_heartbeat_at.lock();
        if now < *deadline {
            return None;
        }
        *deadline = now + self.heartbeat_period;
        let mut count = self.heartbeat_count.lock();
        let msg = HeartbeatMsg::new(writer, first_seq, last_seq, *count);
        *count = count.wrapping_add(1);
        Some(msg)
    }

    /// Record a transport `WOULD_BLOCK` and return the backoff delay before retrying.
    pub fn on_would_block(&self) -> Duration {
        self.backoff.lock().next_delay()
    }

    pub fn on_send_succeeded(&self) {
        self.backoff.lock().reset();
    }

    #[must_use]
    pub fn would_block_count(&self) -> u64 {
        self.backoff.lock().would_block_count()
    }
}
