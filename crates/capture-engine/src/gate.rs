//! One-shot readiness gate.
//!
//! Starts closed, opens exactly once, never closes again. Readers block
//! until it is open so they never observe a half-bound service.

use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct ReadinessGate {
    open: Mutex<bool>,
    opened: Condvar,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the gate and wake every waiter. Returns false if it was already open.
    pub fn open(&self) -> bool {
        let mut open = self.open.lock().unwrap_or_else(|p| p.into_inner());
        if *open {
            return false;
        }
        *open = true;
        self.opened.notify_all();
        true
    }

    pub fn is_open(&self) -> bool {
        *self.open.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Block until the gate opens.
    pub fn wait(&self) {
        let mut open = self.open.lock().unwrap_or_else(|p| p.into_inner());
        while !*open {
            open = self.opened.wait(open).unwrap_or_else(|p| p.into_inner());
        }
    }

    /// Block until the gate opens or `timeout` elapses. Returns whether it is open.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut open = self.open.lock().unwrap_or_else(|p| p.into_inner());
        while !*open {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = self
                .opened
                .wait_timeout(open, deadline - now)
                .unwrap_or_else(|p| p.into_inner());
            open = guard;
        }
        true
    }
}
