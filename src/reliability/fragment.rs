// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fragmentation and reassembly for samples larger than the path MTU.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::guid::Guid;

/// Split `payload` into `mtu`-sized fragments. The caller is responsible
/// for numbering them on the wire; this just chunks the bytes.
#[must_use]
pub fn fragment(payload: &[u8], mtu: usize) -> Vec<&[u8]> {
    if payload.is_empty() {
        return vec![&[]];
    }
    payload.chunks(mtu.max(1)).collect()
}

struct PartialSample {
    total_fragments: u32,
    fragments: HashMap<u32, Vec<u8>>,
    started_at: Instant,
}

/// Reassembles fragments into whole samples, keyed by (writer GUID, seq).
/// Partially received samples are discarded after `reassembly_timeout`.
pub struct Reassembler {
    reassembly_timeout: Duration,
    partials: Mutex<HashMap<(Guid, u64), PartialSample>>,
}

impl Reassembler {
    #[must_use]
    pub fn new(reassembly_timeout: Duration) -> Self {
        Self {
            reassembly_timeout,
            partials: Mutex::new(HashMap::new()),
        }
    }

    /// Feed one fragment. Returns the whole payload once every fragment for
    /// `(writer, seq)` has arrived.
    pub fn on_fragment(
        &self,
        writer: Guid,
        seq: u64,
        fragment_index: u32,
        total_fragments: u32,
        data: &[u8],
    ) -> Option<Vec<u8>> {
        let mut partials = self.partials.lock();
        let key = (writer, seq);
        let partial = partials.entry(key).or_insert_with(|| PartialSample {
            total_fragments,
            fragments: HashMap::new(),
            started_at: Instant::now(),
        });
        partial.fragments.insert(fragment_index, data.to_vec());

        if partial.fragments.len() as u32 == partial.total_fragments {
            let partial = partials.remove(&key).unwrap();
            let mut whole = Vec::new();
            for i in 0..partial.total_fragments {
                whole.extend(partial.fragments.get(&i).into_iter().flatten());
            }
            return Some(whole);
        }
        None
    }

    /// Drop any partial sample whose first fragment arrived longer than
    /// `reassembly_timeout` ago. Call from the shared clock tick.
    pub fn sweep_expired(&self, now: Instant) -> usize {
        let mut partials = self.partials.lock();
        let before = partials.len();
        partials.retain(|_, p| now.duration_since(p.started_at) < self.reassembly_timeout);
        before - partials.len()
    }
}
