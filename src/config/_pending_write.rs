use core::fmt;
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

use futures::future::{FutureExt, Shared};
use tokio::sync::oneshot;

use crate::base_libs::{
    _errors::WriteError,
    _types::{IdleToken, PendingValue},
};

pub type WriteResult = Result<(), WriteError>;

/// Buffer type for a deferred write, awaiting its idle slot
pub struct PendingWrite {
    pub key: String,
    pub value: PendingValue,
    pub generation: u64,
    pub token: IdleToken,
    pub timeout: Duration,
    pub deferred_once: bool,
    handle: WriteHandle,
    // Wrap sender in Option to allow moving it out exactly once
    response: Option<oneshot::Sender<WriteResult>>,
}

impl PendingWrite {
    pub fn new(
        key: &str,
        value: PendingValue,
        generation: u64,
        token: IdleToken,
        timeout: Duration,
    ) -> Self {
        let (response, handle) = WriteHandle::channel();

        PendingWrite {
            key: key.to_string(),
            value,
            generation,
            token,
            timeout,
            deferred_once: false,
            handle,
            response: Some(response),
        }
    }

    pub fn handle(&self) -> WriteHandle {
        self.handle.clone()
    }

    pub fn is_absent(&self) -> bool {
        self.value.is_absent()
    }

    /// Resolves every handle coalesced on this entry.
    pub fn settle(mut self, result: WriteResult) {
        if let Some(response) = self.response.take() {
            // Nobody awaiting the handle is not an error
            let _ = response.send(result);
        }
    }
}

impl fmt::Debug for PendingWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingWrite")
            .field("key", &self.key)
            .field("absent", &self.is_absent())
            .field("generation", &self.generation)
            .field("token", &self.token)
            .field("timeout", &self.timeout)
            .field("deferred_once", &self.deferred_once)
            .finish()
    }
}

/// Shared future returned by every `set` coalesced into one pending write.
///
/// Resolves to `Err(WriteError::Abandoned)` if the pending write is dropped
/// without being settled, e.g. when its coalescer goes away.
#[derive(Clone)]
pub struct WriteHandle {
    inner: Shared<oneshot::Receiver<WriteResult>>,
}

impl WriteHandle {
    fn channel() -> (oneshot::Sender<WriteResult>, Self) {
        let (sender, receiver) = oneshot::channel();
        (
            sender,
            WriteHandle {
                inner: receiver.shared(),
            },
        )
    }

    /// Handle that is already resolved with `result`.
    pub fn settled(result: WriteResult) -> Self {
        let (sender, handle) = WriteHandle::channel();
        let _ = sender.send(result);
        handle
    }

    /// Result of the write if it already settled, without waiting.
    pub fn try_result(&self) -> Option<WriteResult> {
        self.clone().now_or_never()
    }

    pub fn is_settled(&self) -> bool {
        self.try_result().is_some()
    }
}

impl Future for WriteHandle {
    type Output = WriteResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.inner)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(WriteError::Abandoned)))
    }
}

impl fmt::Debug for WriteHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteHandle")
            .field("settled", &self.is_settled())
            .finish()
    }
}
