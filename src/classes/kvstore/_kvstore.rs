use std::sync::Arc;

use tracing::info;

use crate::{
    base_libs::_errors::StoreError,
    classes::{
        config::_config::{StoreBackend, StoreConfig},
        kvstore::{_kvstore_memory::KvMemory, _kvstore_persistent::KvPersistent},
    },
};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Flat string-keyed store the coalescer writes through to.
///
/// Every call is synchronous and may fail, e.g. when a quota is exceeded.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove(&self, key: &str) -> StoreResult<()>;
    fn clear(&self) -> StoreResult<()>;
}

pub fn open_store(config: &StoreConfig) -> StoreResult<Arc<dyn KeyValueStore>> {
    match config.backend {
        StoreBackend::Memory => {
            info!("[INIT] Using in-memory store, quota: {:?}", config.quota_bytes);
            Ok(Arc::new(KvMemory::new(config.quota_bytes)))
        }
        StoreBackend::Rocksdb => {
            info!("[INIT] Using RocksDB store at {}", config.path);
            Ok(Arc::new(KvPersistent::new(&config.path)?))
        }
    }
}
