//! Client callbacks and the thread they are delivered on.
//!
//! Each callback kind occupies a single optional slot: registering a new
//! one replaces the previous one. Size-change and rotation callbacks are
//! never invoked on the thread that mutated the session; they are posted
//! to a [`ListenerExecutor`] so a callback that re-enters the service
//! cannot deadlock on the session guard.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{channel, Sender};
use std::sync::Arc;

use devcam_common::error::DevcamResult;
use devcam_platform_core::Size;

/// Invoked with the new preview size after a renegotiation.
pub type PreviewSizeListener = Arc<dyn Fn(Size) + Send + Sync>;

/// Invoked with the normalized UI rotation in `[-179, 180]`.
pub type RotationListener = Arc<dyn Fn(i32) + Send + Sync>;

/// Invoked once, right before the service tears down.
pub type DestroyedCallback = Box<dyn FnOnce() + Send>;

type Job = Box<dyn FnOnce() + Send>;

/// Single worker thread that runs posted callbacks in order.
pub struct ListenerExecutor {
    tx: Option<Sender<Job>>,
}

impl ListenerExecutor {
    /// Spawn the worker thread.
    pub fn spawn(name: &str) -> DevcamResult<Self> {
        let (tx, rx) = channel::<Job>();
        std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                for job in rx {
                    if catch_unwind(AssertUnwindSafe(job)).is_err() {
                        tracing::error!("Listener panicked; continuing with next callback");
                    }
                }
                tracing::debug!("Listener executor exited");
            })?;
        Ok(Self { tx: Some(tx) })
    }

    /// Queue a callback. Returns false after shutdown.
    pub fn post(&self, job: impl FnOnce() + Send + 'static) -> bool {
        match &self.tx {
            Some(tx) => tx.send(Box::new(job)).is_ok(),
            None => false,
        }
    }

    /// Stop accepting callbacks. Already queued callbacks still run.
    ///
    /// Does not join the worker: a queued callback may be blocked on the
    /// caller's own lock.
    pub fn shutdown(&mut self) {
        self.tx = None;
    }
}

impl Drop for ListenerExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
