//! Exclusive key locks with a bounded wait.
//!
//! Backends use a `LockTable` to give transactions row-level exclusion:
//! `acquire` blocks until no other guard holds the key, or fails with
//! `StoreError::LockTimeout` once the table's timeout elapses.

use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::StoreError;

/// Default upper bound on how long a transaction waits for a lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

pub struct LockTable<K> {
    held: Mutex<HashSet<K>>,
    released: Condvar,
    timeout: Duration,
}

impl<K: Hash + Eq + Clone + Debug> LockTable<K> {
    pub fn new(timeout: Duration) -> Self {
        Self {
            held: Mutex::new(HashSet::new()),
            released: Condvar::new(),
            timeout,
        }
    }

    /// Block until `key` is free, then hold it until the guard drops.
    pub fn acquire(&self, key: K) -> Result<LockGuard<'_, K>, StoreError> {
        let deadline = Instant::now() + self.timeout;
        let mut held = self.held.lock().map_err(|_| poisoned())?;
        while held.contains(&key) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(StoreError::LockTimeout(format!("{key:?}")));
            }
            let (guard, _) = self
                .released
                .wait_timeout(held, remaining)
                .map_err(|_| poisoned())?;
            held = guard;
        }
        held.insert(key.clone());
        Ok(LockGuard { table: self, key })
    }

    /// Whether any guard currently holds `key`.
    pub fn is_locked(&self, key: &K) -> bool {
        self.held.lock().map(|h| h.contains(key)).unwrap_or(false)
    }

    fn release(&self, key: &K) {
        // A poisoned table still has to release, or waiters would time out.
        let mut held = match self.held.lock() {
            Ok(h) => h,
            Err(poisoned) => poisoned.into_inner(),
        };
        held.remove(key);
        drop(held);
        self.released.notify_all();
    }
}

impl<K: Hash + Eq + Clone + Debug> Default for LockTable<K> {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_TIMEOUT)
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("lock table poisoned".to_string())
}

/// Holds one key in a [`LockTable`]; releases it on drop.
pub struct LockGuard<'a, K: Hash + Eq + Clone + Debug> {
    table: &'a LockTable<K>,
    key: K,
}

impl<K: Hash + Eq + Clone + Debug> LockGuard<'_, K> {
    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<K: Hash + Eq + Clone + Debug> Drop for LockGuard<'_, K> {
    fn drop(&mut self) {
        self.table.release(&self.key);
    }
}
