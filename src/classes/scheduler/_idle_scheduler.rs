use crate::base_libs::_types::{IdleDeadline, IdleOptions, IdleToken};

pub type IdleCallback = Box<dyn FnOnce(IdleDeadline) + Send + 'static>;

/// Deferred-execution primitive the coalescer runs its writes on.
///
/// `schedule` must never run `callback` before returning. `cancel` is best
/// effort and a no-op for tokens that already fired or were never issued.
pub trait IdleScheduler: Send + Sync {
    fn schedule(&self, callback: IdleCallback, options: IdleOptions) -> IdleToken;
    fn cancel(&self, token: IdleToken);
}
