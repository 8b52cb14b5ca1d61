//! Single mutual-exclusion domain around the session state.
//!
//! Every externally invocable operation goes through [`SessionGuard`]:
//! acquire, check that the session is running, act, release. Once the
//! session is torn down, operations log the violation and return their
//! neutral default instead of failing the caller.

use std::sync::{Mutex, MutexGuard};

use devcam_common::error::{DevcamError, DevcamResult};

/// Lifecycle of a guarded session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum SessionState {
    /// Created, native setup not yet attempted.
    Uninitialized,
    /// Native setup succeeded; operations are accepted.
    Running,
    /// Torn down. Terminal.
    Destroyed,
}

struct Guarded<T> {
    state: SessionState,
    value: Option<T>,
}

/// Mutex-guarded session value with a one-way lifecycle.
pub struct SessionGuard<T> {
    inner: Mutex<Guarded<T>>,
}

impl<T> SessionGuard<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Guarded {
                state: SessionState::Uninitialized,
                value: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Guarded<T>> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Session lock poisoned by a panicking caller; recovering");
            poisoned.into_inner()
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == SessionState::Running
    }

    /// Perform the one-time setup while holding the guard.
    ///
    /// `setup` returns the session value on success, or `None` when setup
    /// failed; the guard then moves straight to `Destroyed`. Calling this
    /// more than once is a logged no-op returning `default`.
    pub fn initialize<R>(
        &self,
        default: R,
        setup: impl FnOnce() -> (Option<T>, R),
    ) -> R {
        let mut guard = self.lock();
        if guard.state != SessionState::Uninitialized {
            tracing::error!(state = ?guard.state, "Session initialized more than once");
            return default;
        }
        let (value, result) = setup();
        match value {
            Some(value) => {
                guard.value = Some(value);
                guard.state = SessionState::Running;
            }
            None => {
                guard.state = SessionState::Destroyed;
            }
        }
        result
    }

    /// Run `f` against the session if it is running.
    pub fn try_run<R>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut T) -> R,
    ) -> DevcamResult<R> {
        let mut guard = self.lock();
        if guard.state != SessionState::Running {
            return Err(DevcamError::precondition(operation));
        }
        match guard.value.as_mut() {
            Some(value) => Ok(f(value)),
            None => Err(DevcamError::precondition(operation)),
        }
    }

    /// Run `f` against the session, or log and return `default` once torn down.
    pub fn run<R>(&self, operation: &'static str, default: R, f: impl FnOnce(&mut T) -> R) -> R {
        match self.try_run(operation, f) {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(operation, "{e}");
                default
            }
        }
    }

    /// Move to `Destroyed` and hand back the session value.
    ///
    /// Only the first caller observing `Running` gets `Some`; concurrent and
    /// repeated calls get `None`. Tearing down a guard that never started
    /// also makes it terminal.
    pub fn tear_down(&self) -> Option<T> {
        let mut guard = self.lock();
        match guard.state {
            SessionState::Running => {
                guard.state = SessionState::Destroyed;
                guard.value.take()
            }
            SessionState::Uninitialized => {
                guard.state = SessionState::Destroyed;
                None
            }
            SessionState::Destroyed => None,
        }
    }
}

impl<T> Default for SessionGuard<T> {
    fn default() -> Self {
        Self::new()
    }
}
