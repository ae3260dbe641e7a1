// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The shared monotonic tick source: a dedicated timer
//! thread that periodically calls back into the C6 state machines
//! (DEADLINE, LIVELINESS, LIFESPAN, TIME_BASED_FILTER already implement
//! their own `tick(now_ns)`; this just supplies the periodic call and the
//! clock reading).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Current wall-clock time as nanoseconds since the Unix epoch, the unit
/// every `*_ns` field in this crate is expressed in.
#[must_use]
pub fn now_ns() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos() as u64
}

/// Drives a callback on a fixed period from a dedicated OS thread, e.g.
/// SPDP announcement cadence or the DEADLINE/LIVELINESS/LIFESPAN tick.
pub struct TickTimer {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TickTimer {
    pub fn spawn(period: Duration, mut on_tick: impl FnMut(u64) + Send + 'static) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = stop.clone();
        let handle = std::thread::spawn(move || {
            let mut next = Instant::now() + period;
            while !stop_clone.load(Ordering::Relaxed) {
                let now = Instant::now();
                if now < next {
                    std::thread::sleep((next - now).min(Duration::from_millis(50)));
                    continue;
                }
                on_tick(now_ns());
                next += period;
            }
        });
        Self { stop, handle: Some(handle) }
    }

    /// Stop the timer thread and block until it exits.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for TickTimer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn now_ns_is_monotonically_nondecreasing_across_two_reads() {
        let a = now_ns();
        let b = now_ns();
        assert!(b >= a);
    }

    #[test]
    fn timer_invokes_the_callback_at_least_once_before_stop() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let timer = TickTimer::spawn(Duration::from_millis(5), move |_now| {
            count_clone.fetch_add(1, Ordering::Relaxed);
        });
        std::thread::sleep(Duration::from_millis(50));
        timer.stop();
        assert!(count.load(Ordering::Relaxed) >= 1);
    }
}
