use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
};

use tracing::debug;

use crate::{
    base_libs::_types::{IdleDeadline, IdleOptions, IdleToken},
    classes::scheduler::_idle_scheduler::{IdleCallback, IdleScheduler},
};

struct QueuedCallback {
    token: IdleToken,
    callback: IdleCallback,
}

#[derive(Default)]
struct ManualState {
    queue: VecDeque<QueuedCallback>,
    // Cancelled callbacks are kept so a late fire can still be simulated
    retired: HashMap<IdleToken, IdleCallback>,
    scheduled: Vec<(IdleToken, IdleOptions)>,
    cancelled: Vec<IdleToken>,
}

/// Scheduler that only runs callbacks when told to.
///
/// Callbacks fire in the order they were scheduled, with whatever deadline
/// the caller passes in.
#[derive(Default)]
pub struct ManualIdleScheduler {
    next_token: AtomicU64,
    state: Mutex<ManualState>,
}

impl ManualIdleScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of callbacks waiting to fire.
    pub fn queued(&self) -> usize {
        self.lock().queue.len()
    }

    /// Every `schedule` call so far, in order.
    pub fn scheduled(&self) -> Vec<(IdleToken, IdleOptions)> {
        self.lock().scheduled.clone()
    }

    pub fn schedule_count(&self) -> usize {
        self.lock().scheduled.len()
    }

    /// Every `cancel` call so far, in order.
    pub fn cancelled(&self) -> Vec<IdleToken> {
        self.lock().cancelled.clone()
    }

    pub fn last_token(&self) -> Option<IdleToken> {
        self.lock().scheduled.last().map(|(token, _)| *token)
    }

    /// Fires the oldest queued callback. Returns false if nothing was queued.
    pub fn fire_next(&self, deadline: IdleDeadline) -> bool {
        // The guard must be gone before the callback runs, it may reschedule
        let next = self.lock().queue.pop_front();
        match next {
            Some(queued) => {
                debug!("[IDLE] Firing {} with {:?}", queued.token, deadline);
                (queued.callback)(deadline);
                true
            }
            None => false,
        }
    }

    /// Fires every callback queued at the time of the call, but not the ones
    /// those callbacks schedule. Returns how many fired.
    pub fn fire_all(&self, deadline: IdleDeadline) -> usize {
        let count = self.queued();
        (0..count).filter(|_| self.fire_next(deadline)).count()
    }

    /// Fires a specific token, even one that was already cancelled.
    pub fn fire_token(&self, token: IdleToken, deadline: IdleDeadline) -> bool {
        let callback = {
            let mut state = self.lock();
            match state.queue.iter().position(|queued| queued.token == token) {
                Some(index) => state.queue.remove(index).map(|queued| queued.callback),
                None => state.retired.remove(&token),
            }
        };

        match callback {
            Some(callback) => {
                callback(deadline);
                true
            }
            None => false,
        }
    }
}

impl IdleScheduler for ManualIdleScheduler {
    fn schedule(&self, callback: IdleCallback, options: IdleOptions) -> IdleToken {
        let token = IdleToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        let mut state = self.lock();
        state.scheduled.push((token, options));
        state.queue.push_back(QueuedCallback { token, callback });
        token
    }

    fn cancel(&self, token: IdleToken) {
        let mut state = self.lock();
        state.cancelled.push(token);
        if let Some(index) = state.queue.iter().position(|queued| queued.token == token) {
            if let Some(queued) = state.queue.remove(index) {
                state.retired.insert(token, queued.callback);
            }
        }
    }
}
