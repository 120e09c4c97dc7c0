//! Keyed async locks acquired in a deterministic order
//!
//! Ledger writes lock every account they touch. Keys are sorted before
//! locking, so two transfers over the same pair of accounts always take the
//! locks in the same order and cannot deadlock. Operations on disjoint keys
//! never wait on each other.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// A set of per-key mutexes
pub struct KeyedLocks<K> {
    slots: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

/// Holds the locks for a set of keys until dropped
#[must_use = "locks are released as soon as the guard is dropped"]
pub struct KeyedGuard {
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl<K: Ord + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Lock every key in `keys`, smallest first
    ///
    /// Duplicate keys are locked once.
    pub async fn lock_all(&self, keys: &[K]) -> KeyedGuard {
        let mut keys = keys.to_vec();
        keys.sort();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in &keys {
            let slot = self.slot(key);
            guards.push(slot.lock_owned().await);
        }
        KeyedGuard { _guards: guards }
    }

    fn slot(&self, key: &K) -> Arc<AsyncMutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        // Slots nobody holds or waits on can go
        slots.retain(|_, slot| Arc::strong_count(slot) > 1);
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    /// Number of keys currently held or awaited
    pub fn active(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|slot| Arc::strong_count(slot) > 1).count()
    }
}

impl<K: Ord + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}
