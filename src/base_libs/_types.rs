use core::fmt;
use std::time::Duration;

use serde::Serialize;

/// Value queued for a key: something to encode, or the request to drop the key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteValue<T> {
    Value(T),
    Absent,
}

impl<T> WriteValue<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, WriteValue::Absent)
    }
}

impl<T> WriteValue<T>
where
    T: Serialize + Send + 'static,
{
    pub fn boxed(self) -> PendingValue {
        match self {
            WriteValue::Value(value) => WriteValue::Value(Box::new(value)),
            WriteValue::Absent => WriteValue::Absent,
        }
    }
}

/// Type-erased value that is only encoded once its write actually runs.
pub trait EncodeValue: Send {
    fn encode(&self) -> Result<String, serde_json::Error>;
}

impl<T> EncodeValue for T
where
    T: Serialize + Send,
{
    fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

pub type PendingValue = WriteValue<Box<dyn EncodeValue>>;

/// Deadline handed to an idle callback by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleDeadline {
    pub time_remaining: Duration,
    pub did_timeout: bool,
}

impl IdleDeadline {
    pub fn idle(time_remaining: Duration) -> Self {
        IdleDeadline {
            time_remaining,
            did_timeout: false,
        }
    }

    pub fn timed_out() -> Self {
        IdleDeadline {
            time_remaining: Duration::ZERO,
            did_timeout: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleOptions {
    pub timeout: Duration,
}

/// Opaque handle returned by a scheduler, used only to cancel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdleToken(pub u64);

impl fmt::Display for IdleToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "idle#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    // Falls back to the coalescer's default timeout when unset
    pub timeout: Option<Duration>,
}

impl SetOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        SetOptions {
            timeout: Some(timeout),
        }
    }
}
