use serde::{Deserialize, Serialize};

use crate::base_libs::_errors::StoreError;

/// Running counters of a coalescer, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoalescerStats {
    /// Accepted `set` calls, merged or not
    pub requested: u64,
    /// `set` calls folded into an already pending write
    pub coalesced: u64,
    pub written: u64,
    pub removed: u64,
    /// Executions pushed back because the idle slice was too short
    pub deferred: u64,
    pub failed: u64,
    /// Entries flushed by `commit`
    pub committed: u64,
    /// Entries settled by `clear` or `remove` without being written
    pub cleared: u64,
}

/// What a single `commit` did with the entries it flushed.
///
/// A removal the store refused still settles its handle successfully; the
/// store error is handed back here instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub written: usize,
    pub removed: usize,
    /// Handles settled with an error
    pub failed: usize,
    pub remove_errors: Vec<(String, StoreError)>,
}

impl CommitReport {
    pub fn total(&self) -> usize {
        self.written + self.removed + self.failed + self.remove_errors.len()
    }
}
