//! Frames handed to the encoder and not yet returned.
//!
//! A camera buffer must not be reused while the encoder still reads from
//! it. Every frame is registered here before submission and removed when
//! the encoder reports completion for its timestamp. The ledger performs
//! no locking of its own: it lives inside the session state and is only
//! touched under the session guard.

use std::collections::HashMap;

use devcam_platform_core::BufferHandle;

/// A captured buffer currently owned by the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InFlightFrame {
    pub buffer: BufferHandle,
    pub timestamp_ns: i64,
    pub rotation: i32,
}

/// Rejected registration: another in-flight frame already uses the timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("timestamp {timestamp_ns} already in flight")]
pub struct DuplicateTimestamp {
    pub timestamp_ns: i64,
}

/// Ledger of in-flight frames keyed by capture timestamp.
#[derive(Debug, Default)]
pub struct FrameBufferLedger {
    in_flight: HashMap<i64, InFlightFrame>,
    registered_total: u64,
    released_total: u64,
    drained_total: u64,
}

/// Counters describing ledger traffic since creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct LedgerStats {
    pub in_flight: usize,
    pub registered: u64,
    pub released: u64,
    pub drained: u64,
}

impl FrameBufferLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame as owned by the encoder.
    pub fn register(&mut self, frame: InFlightFrame) -> Result<(), DuplicateTimestamp> {
        if self.in_flight.contains_key(&frame.timestamp_ns) {
            return Err(DuplicateTimestamp {
                timestamp_ns: frame.timestamp_ns,
            });
        }
        self.in_flight.insert(frame.timestamp_ns, frame);
        self.registered_total += 1;
        Ok(())
    }

    /// Remove the frame the encoder finished with. `None` for unknown timestamps.
    pub fn release(&mut self, timestamp_ns: i64) -> Option<InFlightFrame> {
        let frame = self.in_flight.remove(&timestamp_ns)?;
        self.released_total += 1;
        Some(frame)
    }

    /// Remove a frame whose submission was rejected; it was never owned by the encoder.
    pub fn reclaim(&mut self, timestamp_ns: i64) -> Option<InFlightFrame> {
        let frame = self.in_flight.remove(&timestamp_ns)?;
        self.registered_total -= 1;
        Some(frame)
    }

    /// Take every remaining frame regardless of encoder state.
    pub fn drain(&mut self) -> Vec<InFlightFrame> {
        let mut frames: Vec<InFlightFrame> = self.in_flight.drain().map(|(_, f)| f).collect();
        frames.sort_by_key(|f| f.timestamp_ns);
        self.drained_total += frames.len() as u64;
        frames
    }

    pub fn contains(&self, timestamp_ns: i64) -> bool {
        self.in_flight.contains_key(&timestamp_ns)
    }

    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }

    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            in_flight: self.in_flight.len(),
            registered: self.registered_total,
            released: self.released_total,
            drained: self.drained_total,
        }
    }
}
