use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, instrument, warn};

use crate::{
    base_libs::{
        _errors::{ReadError, StoreError, WriteError},
        _types::{IdleDeadline, IdleOptions, IdleToken, PendingValue, SetOptions, WriteValue},
    },
    classes::{
        coalescer::{
            _coalescer_stats::{CoalescerStats, CommitReport},
            _latency_tracker::LatencyTracker,
            _pending_table::PendingTable,
        },
        config::_config::CoalescerConfig,
        kvstore::_kvstore::{KeyValueStore, StoreResult},
        scheduler::_idle_scheduler::IdleScheduler,
    },
    config::_pending_write::{PendingWrite, WriteHandle},
};

enum Applied {
    Written,
    Removed,
    RemoveRefused(StoreError),
}

struct CoalescerState {
    pending: PendingTable,
    latency: LatencyTracker,
    stats: CoalescerStats,
}

struct CoalescerCore {
    store: Arc<dyn KeyValueStore>,
    scheduler: Arc<dyn IdleScheduler>,
    default_timeout: Duration,
    state: Mutex<CoalescerState>,
}

/// Defers writes to a slow store until the scheduler reports idle time, and
/// collapses repeated writes to a key into one write of its latest value.
///
/// Clones share the same pending writes. Separately constructed coalescers
/// are fully independent, even over the same store.
#[derive(Clone)]
pub struct WriteCoalescer {
    core: Arc<CoalescerCore>,
}

impl WriteCoalescer {
    pub fn new(store: Arc<dyn KeyValueStore>, scheduler: Arc<dyn IdleScheduler>) -> Self {
        WriteCoalescer::with_config(store, scheduler, &CoalescerConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn KeyValueStore>,
        scheduler: Arc<dyn IdleScheduler>,
        config: &CoalescerConfig,
    ) -> Self {
        WriteCoalescer {
            core: Arc::new(CoalescerCore {
                store,
                scheduler,
                default_timeout: config.default_timeout(),
                state: Mutex::new(CoalescerState {
                    pending: PendingTable::new(),
                    latency: LatencyTracker::new(config.adaptive_deferral),
                    stats: CoalescerStats::default(),
                }),
            }),
        }
    }

    /// Queues `value` for `key` with the default timeout.
    pub fn set<T>(&self, key: &str, value: T) -> WriteHandle
    where
        T: Serialize + Send + 'static,
    {
        self.set_when_idle(key, WriteValue::Value(value), SetOptions::default())
    }

    /// Queues removal of `key`, coalesced like any other write.
    pub fn remove_when_idle(&self, key: &str) -> WriteHandle {
        self.enqueue(key, WriteValue::Absent, SetOptions::default())
    }

    /// Queues a write of `value`, or a removal if it is `Absent`.
    ///
    /// While a write for `key` is pending, further calls only replace its
    /// value and return the same handle; `options` of those calls are ignored.
    pub fn set_when_idle<T>(
        &self,
        key: &str,
        value: WriteValue<T>,
        options: SetOptions,
    ) -> WriteHandle
    where
        T: Serialize + Send + 'static,
    {
        self.enqueue(key, value.boxed(), options)
    }

    #[instrument(level = "debug", skip_all, fields(key = %key))]
    fn enqueue(&self, key: &str, value: PendingValue, options: SetOptions) -> WriteHandle {
        if key.is_empty() {
            return WriteHandle::settled(Err(WriteError::InvalidKey));
        }

        let timeout = options.timeout.unwrap_or(self.core.default_timeout);
        let mut state = self.core.lock();
        state.stats.requested += 1;

        let outcome = state.pending.upsert(key, value, timeout, |generation| {
            self.core.schedule_execution(key, generation, timeout)
        });

        if outcome.merged {
            state.stats.coalesced += 1;
            debug!("[SET] Coalesced into pending write for {}", key);
        } else {
            debug!("[SET] Scheduled write for {} with timeout {:?}", key, timeout);
        }

        outcome.handle
    }

    /// Reads the durably stored value, ignoring anything still pending.
    pub fn get<T>(&self, key: &str) -> Result<Option<T>, ReadError>
    where
        T: DeserializeOwned,
    {
        match self.core.store.get(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| ReadError::Deserialization {
                    key: key.to_string(),
                    message: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    /// Stored JSON text for `key`, as the store holds it.
    pub fn get_raw(&self, key: &str) -> StoreResult<Option<String>> {
        self.core.store.get(key)
    }

    /// Removes `key` from the store now. A pending write for it is cancelled
    /// and its handle resolves successfully, even if the store fails.
    #[instrument(level = "debug", skip_all, fields(key = %key))]
    pub fn remove(&self, key: &str) -> StoreResult<()> {
        let mut state = self.core.lock();
        let result = self.core.store.remove(key);

        if let Some(entry) = state.pending.take(key) {
            self.core.scheduler.cancel(entry.token);
            state.stats.cleared += 1;
            debug!("[REMOVE] Dropped pending write for {}", key);
            entry.settle(Ok(()));
        }

        if let Err(e) = &result {
            warn!("[REMOVE] Store failed to remove {}: {}", key, e);
        }
        result
    }

    /// Writes every pending entry right away. Write failures only reach the
    /// handle of the key they belong to; removals the store refuses are
    /// returned in the report and their handles still resolve successfully.
    #[instrument(level = "debug", skip_all)]
    pub fn commit(&self) -> CommitReport {
        let core = &self.core;
        let mut guard = core.lock();
        let CoalescerState {
            pending,
            latency,
            stats,
        } = &mut *guard;
        let mut report = CommitReport::default();

        pending.for_each_and_clear(|entry| {
            core.scheduler.cancel(entry.token);
            let result = core.apply(&entry, latency);
            match &result {
                Ok(Applied::Written) => report.written += 1,
                Ok(Applied::Removed) => report.removed += 1,
                Ok(Applied::RemoveRefused(e)) => {
                    report.remove_errors.push((entry.key.clone(), e.clone()))
                }
                Err(_) => report.failed += 1,
            }
            stats.committed += 1;
            finish(stats, entry, result);
        });

        debug!("[COMMIT] {:?}", report);
        report
    }

    /// Empties the store. Pending writes become moot and resolve successfully,
    /// and latency records of the wiped keys are forgotten.
    #[instrument(level = "debug", skip_all)]
    pub fn clear(&self) -> StoreResult<()> {
        let core = &self.core;
        let mut guard = core.lock();
        let result = core.store.clear();

        let CoalescerState {
            pending,
            latency,
            stats,
        } = &mut *guard;
        latency.clear();
        pending.for_each_and_clear(|entry| {
            core.scheduler.cancel(entry.token);
            stats.cleared += 1;
            entry.settle(Ok(()));
        });

        if let Err(e) = &result {
            warn!("[CLEAR] Store failed to clear: {}", e);
        }
        result
    }

    pub fn has_pending(&self) -> bool {
        !self.core.lock().pending.is_empty()
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.core.lock().pending.contains(key)
    }

    pub fn pending_len(&self) -> usize {
        self.core.lock().pending.len()
    }

    pub fn pending_keys(&self) -> Vec<String> {
        self.core.lock().pending.keys()
    }

    pub fn stats(&self) -> CoalescerStats {
        self.core.lock().stats
    }

    /// How long the last physical write of `key` took, if one happened.
    pub fn last_write_latency(&self, key: &str) -> Option<Duration> {
        self.core.lock().latency.last_write(key)
    }
}

impl CoalescerCore {
    fn lock(&self) -> MutexGuard<'_, CoalescerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn schedule_execution(
        self: &Arc<Self>,
        key: &str,
        generation: u64,
        timeout: Duration,
    ) -> IdleToken {
        // Weak so a queued callback does not keep a dropped coalescer alive
        let core = Arc::downgrade(self);
        let key = key.to_string();

        self.scheduler.schedule(
            Box::new(move |deadline| {
                if let Some(core) = core.upgrade() {
                    core.process_pending(&key, generation, deadline);
                }
            }),
            IdleOptions { timeout },
        )
    }

    #[instrument(level = "debug", skip_all, fields(key = %key))]
    fn process_pending(self: &Arc<Self>, key: &str, generation: u64, deadline: IdleDeadline) {
        let mut guard = self.lock();
        let state = &mut *guard;

        // Removed, cleared, committed or replaced since this was scheduled
        let Some(entry) = state.pending.get_current_mut(key, generation) else {
            debug!("[IDLE] Nothing pending for {}, skipping", key);
            return;
        };

        if !entry.is_absent() && state.latency.should_defer(key, &deadline, entry.deferred_once) {
            entry.token = self.schedule_execution(key, generation, entry.timeout);
            entry.deferred_once = true;
            state.stats.deferred += 1;
            debug!(
                "[IDLE] Deferring {}, {:?} left but last write took {:?}",
                key,
                deadline.time_remaining,
                state.latency.last_write(key)
            );
            return;
        }

        if let Some(entry) = state.pending.take(key) {
            let result = self.apply(&entry, &mut state.latency);
            finish(&mut state.stats, entry, result);
        }
    }

    fn apply(
        &self,
        entry: &PendingWrite,
        latency: &mut LatencyTracker,
    ) -> Result<Applied, WriteError> {
        let key = entry.key.as_str();

        match &entry.value {
            WriteValue::Absent => match self.store.remove(key) {
                Ok(()) => Ok(Applied::Removed),
                Err(e) => Ok(Applied::RemoveRefused(e)),
            },
            WriteValue::Value(value) => {
                let serialized = value
                    .encode()
                    .map_err(|e| WriteError::serialization(key, &e))?;

                let start = Instant::now();
                self.store
                    .set(key, &serialized)
                    .map_err(|e| WriteError::store_write(key, e))?;
                latency.record(key, start.elapsed());

                Ok(Applied::Written)
            }
        }
    }
}

fn finish(stats: &mut CoalescerStats, entry: PendingWrite, result: Result<Applied, WriteError>) {
    match &result {
        Ok(Applied::Written) => stats.written += 1,
        Ok(Applied::Removed) => stats.removed += 1,
        Ok(Applied::RemoveRefused(e)) => {
            stats.failed += 1;
            warn!("[REMOVE] Store failed to remove {}: {}", entry.key, e);
        }
        Err(e) => {
            stats.failed += 1;
            warn!("[WRITE] {}", e);
        }
    }

    entry.settle(result.map(|_| ()));
}
