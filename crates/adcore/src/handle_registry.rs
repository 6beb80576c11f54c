//! Lookup of ad handles by adapter identity.
//!
//! The registry is never an owner: it holds `Weak` references only, so an entry
//! can't keep a handle alive. Owners must still call `remove` when they release
//! a handle; the weak reference only guarantees a forgotten entry never leaks
//! the handle itself.

use std::hash::Hash;
use std::sync::{Arc, Weak};

use dashmap::DashMap;

pub struct EphemeralHandleRegistry<K, H: ?Sized> {
    entries: DashMap<K, Weak<H>>,
}

impl<K, H> EphemeralHandleRegistry<K, H>
where
    K: Eq + Hash + Clone,
    H: ?Sized,
{
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Associate `handle` with `key`, replacing any previous association.
    pub fn store(&self, key: K, handle: &Arc<H>) {
        self.entries.insert(key, Arc::downgrade(handle));
    }

    /// Look up the handle for `key`, if it is still registered and alive.
    pub fn retrieve(&self, key: &K) -> Option<Arc<H>> {
        let handle = self.entries.get(key).and_then(|entry| entry.upgrade());
        if handle.is_none() {
            // Guard must be released before remove_if takes the shard lock.
            self.entries.remove_if(key, |_, weak| weak.strong_count() == 0);
        }
        handle
    }

    /// Drop the association for `key`. Returns whether a live entry was removed.
    pub fn remove(&self, key: &K) -> bool {
        self.entries
            .remove(key)
            .is_some_and(|(_, weak)| weak.strong_count() > 0)
    }

    /// Drop the association for `key` only if it still points at `handle`.
    ///
    /// Lets an owner release its own registration without clobbering a newer
    /// one stored under the same key.
    pub fn remove_if_same(&self, key: &K, handle: &Arc<H>) -> bool {
        self.entries
            .remove_if(key, |_, weak| {
                std::ptr::addr_eq(weak.as_ptr(), Arc::as_ptr(handle))
            })
            .is_some()
    }

    /// Snapshot of keys whose handles are alive right now.
    pub fn keys(&self) -> Vec<K> {
        self.entries
            .iter()
            .filter(|entry| entry.value().strong_count() > 0)
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Number of registered entries, including ones whose handle has died.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop entries whose handle has already been freed.
    pub fn purge(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, weak| weak.strong_count() > 0);
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            tracing::debug!(purged, "Purged dead handle registry entries");
        }
        purged
    }
}

impl<K, H> Default for EphemeralHandleRegistry<K, H>
where
    K: Eq + Hash + Clone,
    H: ?Sized,
{
    fn default() -> Self {
        Self::new()
    }
}
