//! Key Locker
//!
//! Lets many threads lock against a string key. Locks for keys nobody holds
//! are dropped from the map so it does not grow with every key ever touched.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};

/// Per-key mutual exclusion
#[derive(Default)]
pub struct KeyLocker {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

/// Holds the lock for one key until dropped
pub struct KeyGuard<'a> {
    locker: &'a KeyLocker,
    key: String,
    guard: Option<ArcMutexGuard<RawMutex, ()>>,
}

impl KeyLocker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `key` is free, then hold it
    pub fn lock(&self, key: &str) -> KeyGuard<'_> {
        let mutex = {
            let mut locks = self.locks.lock();
            Arc::clone(locks.entry(key.to_string()).or_default())
        };

        KeyGuard {
            locker: self,
            key: key.to_string(),
            guard: Some(mutex.lock_arc()),
        }
    }

    /// Number of keys currently held or waited on
    pub fn active_keys(&self) -> usize {
        self.locks.lock().len()
    }
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        // Release first so the map's Arc is the last one when uncontended
        drop(self.guard.take());

        let mut locks = self.locker.locks.lock();
        if let Some(mutex) = locks.get(&self.key) {
            if Arc::strong_count(mutex) == 1 {
                locks.remove(&self.key);
            }
        }
    }
}
