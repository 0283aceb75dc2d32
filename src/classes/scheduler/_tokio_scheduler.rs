use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use tokio::{
    runtime::{Handle, TryCurrentError},
    task::JoinHandle,
};
use tracing::debug;

use crate::{
    base_libs::_types::{IdleDeadline, IdleOptions, IdleToken},
    classes::{
        config::_config::SchedulerConfig,
        scheduler::_idle_scheduler::{IdleCallback, IdleScheduler},
    },
};

type TaskMap = Arc<Mutex<HashMap<IdleToken, JoinHandle<()>>>>;

fn lock_tasks(tasks: &TaskMap) -> MutexGuard<'_, HashMap<IdleToken, JoinHandle<()>>> {
    tasks.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Idle scheduler on a tokio runtime.
///
/// A callback runs once the runtime had `idle_delay` to get through other
/// work, reporting `idle_slice` of remaining time. When the requested timeout
/// is shorter than the idle delay it fires at the timeout instead, flagged as
/// timed out.
pub struct TokioIdleScheduler {
    handle: Handle,
    idle_delay: Duration,
    idle_slice: Duration,
    next_token: AtomicU64,
    tasks: TaskMap,
}

impl TokioIdleScheduler {
    pub fn new(handle: Handle, idle_delay: Duration, idle_slice: Duration) -> Self {
        TokioIdleScheduler {
            handle,
            idle_delay,
            idle_slice,
            next_token: AtomicU64::new(0),
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Scheduler bound to the runtime the caller is running on.
    pub fn try_current(config: &SchedulerConfig) -> Result<Self, TryCurrentError> {
        Ok(TokioIdleScheduler::new(
            Handle::try_current()?,
            config.idle_delay(),
            config.idle_slice(),
        ))
    }

    /// Callbacks scheduled but not yet fired or cancelled.
    pub fn outstanding(&self) -> usize {
        lock_tasks(&self.tasks).len()
    }
}

impl IdleScheduler for TokioIdleScheduler {
    fn schedule(&self, callback: IdleCallback, options: IdleOptions) -> IdleToken {
        let token = IdleToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        let idle_delay = self.idle_delay;
        let idle_slice = self.idle_slice;
        let tasks = self.tasks.clone();

        // Held across spawn so the task cannot deregister before it is registered
        let mut registered = lock_tasks(&self.tasks);
        let task = self.handle.spawn(async move {
            tokio::task::yield_now().await;

            let deadline = if idle_delay < options.timeout {
                tokio::time::sleep(idle_delay).await;
                IdleDeadline::idle(idle_slice)
            } else {
                tokio::time::sleep(options.timeout).await;
                IdleDeadline::timed_out()
            };

            lock_tasks(&tasks).remove(&token);
            debug!("[IDLE] Firing {} with {:?}", token, deadline);
            callback(deadline);
        });
        registered.insert(token, task);

        token
    }

    fn cancel(&self, token: IdleToken) {
        if let Some(task) = lock_tasks(&self.tasks).remove(&token) {
            debug!("[IDLE] Cancelling {}", token);
            task.abort();
        }
    }
}
