use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use deferkv::{
    classes::config::_config::CoalescerConfig, IdleDeadline, KeyValueStore, ManualIdleScheduler,
    StoreError, WriteCoalescer,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Get(String),
    Set(String, String),
    Remove(String),
    Clear,
}

/// In-memory store that records every call and can be told to misbehave.
#[derive(Default)]
pub struct RecordingStore {
    data: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<StoreCall>>,
    failing_writes: Mutex<HashSet<String>>,
    failing_removals: Mutex<bool>,
    write_delay: Mutex<Duration>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_calls(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Set(key, value) => Some((key, value)),
                _ => None,
            })
            .collect()
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.data.lock().unwrap().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.data.lock().unwrap().len()
    }

    /// Seeds a value without recording a call.
    pub fn seed(&self, key: &str, value: &str) {
        self.data
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn fail_writes_to(&self, key: &str) {
        self.failing_writes.lock().unwrap().insert(key.to_string());
    }

    pub fn heal_writes_to(&self, key: &str) {
        self.failing_writes.lock().unwrap().remove(key);
    }

    pub fn fail_removals(&self) {
        *self.failing_removals.lock().unwrap() = true;
    }

    /// Makes every successful write take at least `delay`.
    pub fn slow_writes(&self, delay: Duration) {
        *self.write_delay.lock().unwrap() = delay;
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl KeyValueStore for RecordingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.record(StoreCall::Get(key.to_string()));
        Ok(self.value(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.record(StoreCall::Set(key.to_string(), value.to_string()));
        if self.failing_writes.lock().unwrap().contains(key) {
            return Err(StoreError::QuotaExceeded {
                requested: value.len(),
                limit: 0,
            });
        }

        let delay = *self.write_delay.lock().unwrap();
        if !delay.is_zero() {
            thread::sleep(delay);
        }

        self.seed(key, value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.record(StoreCall::Remove(key.to_string()));
        if *self.failing_removals.lock().unwrap() {
            return Err(StoreError::Backend("removal refused".to_string()));
        }
        self.data.lock().unwrap().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.record(StoreCall::Clear);
        self.data.lock().unwrap().clear();
        Ok(())
    }
}

pub struct Fixture {
    pub coalescer: WriteCoalescer,
    pub store: Arc<RecordingStore>,
    pub scheduler: Arc<ManualIdleScheduler>,
}

pub fn fixture() -> Fixture {
    fixture_with(&CoalescerConfig::default())
}

pub fn fixture_with(config: &CoalescerConfig) -> Fixture {
    let store = Arc::new(RecordingStore::new());
    let scheduler = Arc::new(ManualIdleScheduler::new());
    let coalescer = WriteCoalescer::with_config(store.clone(), scheduler.clone(), config);

    Fixture {
        coalescer,
        store,
        scheduler,
    }
}

/// Plenty of idle time left, nothing timed out.
pub fn ample() -> IdleDeadline {
    IdleDeadline::idle(Duration::from_secs(1))
}

/// No idle time left, but not timed out either.
pub fn exhausted() -> IdleDeadline {
    IdleDeadline::idle(Duration::ZERO)
}
