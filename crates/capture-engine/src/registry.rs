//! Non-owning handles for callers outside the service's ownership tree.
//!
//! Native encoder threads and camera callbacks hold a [`RegistryHandle`],
//! never the service itself. The registry stores weak references, and a
//! handle stops resolving as soon as it is unregistered, even if other
//! owners still keep the target alive.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

/// Opaque key into a [`HandleRegistry`]. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistryHandle(u64);

impl RegistryHandle {
    /// A handle no registry ever issues.
    #[cfg(test)]
    pub(crate) fn dangling() -> Self {
        RegistryHandle(0)
    }
}

impl fmt::Display for RegistryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle#{}", self.0)
    }
}

pub struct HandleRegistry<T> {
    next: AtomicU64,
    entries: RwLock<HashMap<u64, Weak<T>>>,
}

impl<T> HandleRegistry<T> {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Register `target`, dropping entries whose targets are gone.
    pub fn register(&self, target: &Arc<T>) -> RegistryHandle {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.entries.write().unwrap_or_else(|p| p.into_inner());
        entries.retain(|_, weak| weak.strong_count() > 0);
        entries.insert(id, Arc::downgrade(target));
        RegistryHandle(id)
    }

    /// The target, if the handle is still registered and the target alive.
    pub fn resolve(&self, handle: RegistryHandle) -> Option<Arc<T>> {
        self.entries
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(&handle.0)
            .and_then(Weak::upgrade)
    }

    /// Returns false if the handle was not registered.
    pub fn unregister(&self, handle: RegistryHandle) -> bool {
        self.entries
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&handle.0)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for HandleRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
