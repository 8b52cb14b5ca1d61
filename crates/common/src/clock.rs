//! Clock and pacing utilities for frame production.
//!
//! Capture timestamps are nanoseconds on a monotonic clock anchored when
//! the camera opens. They identify frames while they are owned by the
//! encoder, so the clock never hands out the same value twice.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Monotonic capture clock producing strictly increasing timestamps.
#[derive(Debug)]
pub struct FrameClock {
    /// The instant the clock was started.
    epoch: Instant,

    /// Wall-clock time at epoch (RFC 3339).
    epoch_wall: String,

    /// Last timestamp handed out.
    last_ns: AtomicU64,
}

impl FrameClock {
    /// Create a new clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
            last_ns: AtomicU64::new(0),
        }
    }

    /// Nanoseconds elapsed since the epoch.
    pub fn elapsed_ns(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    /// Next capture timestamp. Always greater than every previous one.
    pub fn next_timestamp_ns(&self) -> i64 {
        let now = self.elapsed_ns().max(1);
        let mut prev = self.last_ns.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match self
                .last_ns
                .compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next as i64,
                Err(actual) => prev = actual,
            }
        }
    }

    /// Wall-clock time at the epoch.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// Convert a nanosecond value to seconds.
    pub fn ns_to_secs(ns: u64) -> f64 {
        ns as f64 / 1_000_000_000.0
    }
}

/// Frame rate controller for paced producers.
#[derive(Debug)]
pub struct RateController {
    target_interval_ns: u64,
    last_tick_ns: Option<u64>,
}

impl RateController {
    /// Create a controller targeting the given frame rate. Zero is treated as 1 fps.
    pub fn new(target_fps: u32) -> Self {
        Self {
            target_interval_ns: 1_000_000_000 / target_fps.max(1) as u64,
            last_tick_ns: None,
        }
    }

    /// Returns true and records the tick if a frame is due.
    /// The first call always returns true.
    pub fn should_tick(&mut self, current_ns: u64) -> bool {
        match self.last_tick_ns {
            None => {
                self.last_tick_ns = Some(current_ns);
                true
            }
            Some(last) if current_ns >= last + self.target_interval_ns => {
                self.last_tick_ns = Some(current_ns);
                true
            }
            _ => false,
        }
    }

    /// Nanoseconds until the next frame is due.
    pub fn remaining_ns(&self, current_ns: u64) -> u64 {
        match self.last_tick_ns {
            None => 0,
            Some(last) => (last + self.target_interval_ns).saturating_sub(current_ns),
        }
    }

    /// Target interval in nanoseconds.
    pub fn interval_ns(&self) -> u64 {
        self.target_interval_ns
    }
}
