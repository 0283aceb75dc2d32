use std::sync::{Mutex, MutexGuard, PoisonError};

use moka::sync::Cache;
use tracing::instrument;

use crate::{
    base_libs::_errors::StoreError,
    classes::kvstore::_kvstore::{KeyValueStore, StoreResult},
};

/// In-memory store with an optional byte quota over keys and values.
pub struct KvMemory {
    store: Cache<String, String>,
    quota_bytes: Option<usize>,
    // Held by every mutation so a quota check sees a stable store
    write_lock: Mutex<()>,
}

impl KvMemory {
    pub fn new(quota_bytes: Option<usize>) -> Self {
        KvMemory {
            store: Cache::builder().build(),
            quota_bytes,
            write_lock: Mutex::new(()),
        }
    }

    pub fn used_bytes(&self) -> usize {
        self.store
            .iter()
            .map(|(key, value)| key.len() + value.len())
            .sum()
    }

    pub fn len(&self) -> usize {
        self.store.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for KvMemory {
    #[instrument(level = "debug", skip_all)]
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.store.get(key))
    }

    #[instrument(level = "debug", skip_all)]
    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let _guard = self.lock_writes();

        if let Some(limit) = self.quota_bytes {
            let replaced = self
                .store
                .get(key)
                .map(|previous| key.len() + previous.len())
                .unwrap_or(0);
            let requested = self.used_bytes().saturating_sub(replaced) + key.len() + value.len();
            if requested > limit {
                return Err(StoreError::QuotaExceeded { requested, limit });
            }
        }

        self.store.insert(key.to_string(), value.to_string());
        Ok(())
    }

    #[instrument(level = "debug", skip_all)]
    fn remove(&self, key: &str) -> StoreResult<()> {
        let _guard = self.lock_writes();
        self.store.invalidate(key);
        Ok(())
    }

    #[instrument(level = "debug", skip_all)]
    fn clear(&self) -> StoreResult<()> {
        let _guard = self.lock_writes();
        self.store.invalidate_all();
        self.store.run_pending_tasks();
        Ok(())
    }
}
