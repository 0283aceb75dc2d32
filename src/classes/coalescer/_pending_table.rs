use std::{collections::HashMap, time::Duration};

use crate::{
    base_libs::_types::{IdleToken, PendingValue},
    config::_pending_write::{PendingWrite, WriteHandle},
};

pub struct UpsertOutcome {
    pub handle: WriteHandle,
    /// True when the value was folded into an already pending write
    pub merged: bool,
}

/// At most one pending write per key.
///
/// Every entry carries a generation so a callback scheduled for an entry that
/// has since been replaced can tell it is stale.
#[derive(Debug, Default)]
pub struct PendingTable {
    entries: HashMap<String, PendingWrite>,
    next_generation: u64,
}

impl PendingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the value of the pending write for `key`, or creates one and
    /// asks `schedule` for its token.
    pub fn upsert<F>(
        &mut self,
        key: &str,
        value: PendingValue,
        timeout: Duration,
        schedule: F,
    ) -> UpsertOutcome
    where
        F: FnOnce(u64) -> IdleToken,
    {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.value = value;
            return UpsertOutcome {
                handle: entry.handle(),
                merged: true,
            };
        }

        let generation = self.next_generation;
        self.next_generation += 1;

        let token = schedule(generation);
        let entry = PendingWrite::new(key, value, generation, token, timeout);
        let handle = entry.handle();
        self.entries.insert(key.to_string(), entry);

        UpsertOutcome {
            handle,
            merged: false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&PendingWrite> {
        self.entries.get(key)
    }

    /// The entry for `key`, only if it is still the one created as `generation`.
    pub fn get_current_mut(&mut self, key: &str, generation: u64) -> Option<&mut PendingWrite> {
        self.entries
            .get_mut(key)
            .filter(|entry| entry.generation == generation)
    }

    /// Removes and returns the entry, leaving its handle unsettled.
    pub fn take(&mut self, key: &str) -> Option<PendingWrite> {
        self.entries.remove(key)
    }

    /// Empties the table before handing each entry to `f`.
    pub fn for_each_and_clear<F>(&mut self, mut f: F)
    where
        F: FnMut(PendingWrite),
    {
        let entries = std::mem::take(&mut self.entries);
        for (_, entry) in entries {
            f(entry);
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }
}
