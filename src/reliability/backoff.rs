// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Exponential backoff with jitter for transport `WOULD_BLOCK` retries:
//! never drop a RELIABLE sample silently, retry instead.

use std::time::{Duration, Instant};

const DEFAULT_INITIAL: Duration = Duration::from_millis(1);
const DEFAULT_MAX: Duration = Duration::from_millis(500);

#[derive(Debug)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    attempt: u32,
    would_block_count: u64,
}

impl Backoff {
    #[must_use]
    pub fn new() -> Self {
        Self::with_bounds(DEFAULT_INITIAL, DEFAULT_MAX)
    }

    #[must_use]
    pub fn with_bounds(initial: Duration, max: Duration) -> Self {
        Self { initial, max, attempt: 0, would_block_count: 0 }
    }

    /// Record a `WOULD_BLOCK` and return how long to wait before retrying.
    pub fn next_delay(&mut self) -> Duration {
        self.would_block_count += 1;
        let shift = self.attempt.min(16);
        self.attempt += 1;
        let scaled = self.initial.saturating_mul(1u32 << shift).min(self.max);
        jitter(scaled, self.attempt)
    }

    /// Reset after a successful send.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    #[must_use]
    pub fn would_block_count(&self) -> u64 {
        self.would_block_count
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply +/-25% jitter derived from the wall clock and attempt count, so
/// concurrent writers backing off on the same congested path don't retry
/// in lockstep.
fn jitter(base: Duration, attempt: u32) -> Duration {
    let seed = u128::from(Instant::now().elapsed().as_nanos() as u64 ^ u64::from(attempt));
    let pct = (seed % 51) as i64 - 25; // -25..=25
    let base_ns = base.as_nanos() as i128;
    let jittered_ns = base_ns + base_ns * i128::from(pct) / 100;
    Duration::from_nanos(jittered_ns.max(1) as u64)
}
