//! Per-row async locks.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// A registry of async mutexes keyed by row id.
///
/// [`RowLocks::acquire`] hands out an owned guard, so a transaction can hold
/// the lock across await points until it commits or rolls back. The registry
/// itself is only locked long enough to look up or create the entry, never
/// across an await.
pub struct RowLocks<K> {
    inner: Arc<StdMutex<HashMap<K, Arc<AsyncMutex<()>>>>>,
}

impl<K> Clone for RowLocks<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K> Default for RowLocks<K> {
    fn default() -> Self {
        Self {
            inner: Arc::new(StdMutex::new(HashMap::new())),
        }
    }
}

impl<K: Eq + Hash + Clone> RowLocks<K> {
    /// Creates an empty lock registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for `key`, waiting if another holder has it.
    pub async fn acquire(&self, key: K) -> OwnedMutexGuard<()> {
        let lock = {
            let mut registry = self.inner.lock().unwrap();
            Arc::clone(
                registry
                    .entry(key)
                    .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
            )
        };
        lock.lock_owned().await
    }
}
