//! Deferred, coalescing writes over a slow synchronous key-value store.
//!
//! Writes are queued on an idle scheduler and executed later; repeated writes
//! to one key before that point collapse into a single write of the latest
//! value.

pub mod base_libs;
pub mod classes;
pub mod config;

pub use base_libs::{
    _errors::{ConfigError, ReadError, StoreError, WriteError},
    _types::{IdleDeadline, IdleOptions, IdleToken, SetOptions, WriteValue},
};
pub use classes::{
    coalescer::{
        _coalescer_stats::{CoalescerStats, CommitReport},
        _write_coalescer::WriteCoalescer,
    },
    kvstore::{
        _kvstore::KeyValueStore, _kvstore_memory::KvMemory, _kvstore_persistent::KvPersistent,
    },
    scheduler::{
        _idle_scheduler::{IdleCallback, IdleScheduler},
        _manual_scheduler::ManualIdleScheduler,
        _tokio_scheduler::TokioIdleScheduler,
    },
};
pub use config::_pending_write::{WriteHandle, WriteResult};
