//! Handle for a processor whose run loop was spawned in the background.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use crate::core::state::{Lifecycle, ProcessorState};
use crate::error::BulkError;
use crate::stats::Stats;

/// # Completion
///
/// Resolves to the processor's final [`Stats`] once it reaches
/// [`ProcessorState::Terminated`].
pub struct Completion {
    /// The underlying channel receiver
    receiver: oneshot::Receiver<Stats>,
}

impl Completion {
    pub(crate) fn new(receiver: oneshot::Receiver<Stats>) -> Self {
        Self { receiver }
    }
}

impl Future for Completion {
    type Output = Result<Stats, BulkError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().receiver)
            .poll(cx)
            .map(|received| received.map_err(|_| BulkError::Closed))
    }
}

/// A handle for a processor run spawned with
/// [`BulkProcessor::start`](crate::BulkProcessor::start).
///
/// Dropping the handle without calling [`wait`](Self::wait) or
/// [`shutdown`](Self::shutdown) requests a stop. The loop still drains, it
/// just has nobody left to report to.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use bulky::{Batch, BoxError, BulkProcessor, EventSink, Options};
///
/// struct Noop;
///
/// #[async_trait]
/// impl EventSink<u8> for Noop {
///     async fn on_process(&self, _batch: &Batch<u8>) -> Result<(), BoxError> {
///         Ok(())
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), bulky::BulkError> {
/// let processor = BulkProcessor::new(Noop, Options::default().batch_size(2))?;
/// let handle = processor.start();
///
/// for n in 0..5 {
///     processor.schedule(n).await;
/// }
///
/// let stats = handle.shutdown().await?;
/// assert_eq!(stats.dispatched_batches, 3);
/// # Ok(())
/// # }
/// ```
pub struct ProcessorHandle {
    lifecycle: Arc<Lifecycle>,

    /// Handle to the spawned run loop, becomes `None` once handed off
    task: Option<JoinHandle<()>>,

    /// Becomes `None` once handed to a [`Completion`]
    completion: Option<oneshot::Receiver<Stats>>,
}

impl ProcessorHandle {
    /// Creates a handle by spawning the run loop through `task`, which is
    /// given the sender to signal termination on.
    pub(crate) fn new<F>(lifecycle: Arc<Lifecycle>, task: F) -> Self
    where
        F: FnOnce(oneshot::Sender<Stats>) -> JoinHandle<()>,
    {
        let (tx, rx) = oneshot::channel();
        let task = task(tx);
        Self {
            lifecycle,
            task: Some(task),
            completion: Some(rx),
        }
    }

    /// Requests a stop without waiting for it. Idempotent.
    pub fn stop(&self) {
        self.lifecycle.request_stop();
    }

    pub fn state(&self) -> ProcessorState {
        self.lifecycle.state()
    }

    /// Whether the run loop task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Hands off to a [`Completion`] that resolves when someone else stops the
    /// processor and the drain has finished.
    pub fn wait(mut self) -> Completion {
        self.task.take();
        match self.completion.take() {
            Some(receiver) => Completion::new(receiver),
            None => {
                let (_, receiver) = oneshot::channel();
                Completion::new(receiver)
            }
        }
    }

    /// Requests a stop and waits for the drain to finish.
    pub fn shutdown(self) -> Completion {
        self.stop();
        self.wait()
    }
}

impl Drop for ProcessorHandle {
    fn drop(&mut self) {
        if self.completion.is_some() {
            self.stop();
        }
    }
}
