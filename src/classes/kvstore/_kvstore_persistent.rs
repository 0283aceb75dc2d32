use rocksdb::{IteratorMode, WriteBatch, DB};
use tracing::instrument;

use crate::{
    base_libs::_errors::StoreError,
    classes::kvstore::_kvstore::{KeyValueStore, StoreResult},
};

/// RocksDB-backed store, values kept as UTF-8 JSON text under their own key.
pub struct KvPersistent {
    rocks_db: DB,
}

impl KvPersistent {
    pub fn new(db_path: &str) -> StoreResult<Self> {
        let rocks_db = DB::open_default(db_path).map_err(backend)?;
        Ok(KvPersistent { rocks_db })
    }
}

fn backend(error: rocksdb::Error) -> StoreError {
    StoreError::Backend(error.into_string())
}

impl KeyValueStore for KvPersistent {
    #[inline(always)]
    #[instrument(level = "debug", skip_all)]
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        match self.rocks_db.get(key).map_err(backend)? {
            Some(value) => String::from_utf8(value)
                .map(Some)
                .map_err(|e| StoreError::Backend(format!("value is not UTF-8: {}", e))),
            None => Ok(None),
        }
    }

    #[inline(always)]
    #[instrument(level = "debug", skip_all)]
    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.rocks_db.put(key, value).map_err(backend)
    }

    #[inline(always)]
    #[instrument(level = "debug", skip_all)]
    fn remove(&self, key: &str) -> StoreResult<()> {
        self.rocks_db.delete(key).map_err(backend)
    }

    #[instrument(level = "debug", skip_all)]
    fn clear(&self) -> StoreResult<()> {
        let mut batch = WriteBatch::default();
        for item in self.rocks_db.iterator(IteratorMode::Start) {
            let (key, _) = item.map_err(backend)?;
            batch.delete(key);
        }
        self.rocks_db.write(batch).map_err(backend)
    }
}
