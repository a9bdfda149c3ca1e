use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

/// Async mutexes created on demand, one per key (room id, identity).
///
/// Callers clone the `Arc` out of the map and lock it outside the map lock.
/// Entries are dropped with [`KeyedLocks::release_if_idle`] once nobody holds
/// or waits on them.
pub struct KeyedLocks<K> {
    locks: RwLock<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self {
            locks: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &K) -> Arc<Mutex<()>> {
        {
            let guard = self.locks.read().await;
            if let Some(lock) = guard.get(key) {
                return lock.clone();
            }
        }

        let mut guard = self.locks.write().await;
        guard
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Removes the entry unless another caller still holds a handle to it.
    /// The map's write lock stops anyone cloning a handle while we look.
    pub async fn release_if_idle(&self, key: &K) -> bool {
        let mut guard = self.locks.write().await;
        if guard
            .get(key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            guard.remove(key);
            return true;
        }
        false
    }

    pub async fn len(&self) -> usize {
        self.locks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.locks.read().await.is_empty()
    }
}
