use std::{collections::HashMap, time::Duration};

use crate::base_libs::_types::IdleDeadline;

/// Remembers how long the last physical write of each key took.
///
/// Only a heuristic: a key whose payload size swings wildly between writes
/// will be deferred on stale numbers.
#[derive(Debug)]
pub struct LatencyTracker {
    last_write: HashMap<String, Duration>,
    adaptive: bool,
}

impl Default for LatencyTracker {
    fn default() -> Self {
        LatencyTracker::new(true)
    }
}

impl LatencyTracker {
    pub fn new(adaptive: bool) -> Self {
        LatencyTracker {
            last_write: HashMap::new(),
            adaptive,
        }
    }

    pub fn record(&mut self, key: &str, elapsed: Duration) {
        self.last_write.insert(key.to_string(), elapsed);
    }

    pub fn last_write(&self, key: &str) -> Option<Duration> {
        self.last_write.get(key).copied()
    }

    pub fn clear(&mut self) {
        self.last_write.clear();
    }

    /// A write is pushed back at most once, and never once the scheduler's
    /// timeout has elapsed.
    pub fn should_defer(&self, key: &str, deadline: &IdleDeadline, deferred_once: bool) -> bool {
        if !self.adaptive || deadline.did_timeout || deferred_once {
            return false;
        }

        matches!(self.last_write(key), Some(last) if last > deadline.time_remaining)
    }
}
