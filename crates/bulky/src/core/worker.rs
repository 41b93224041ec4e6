//! Per-batch processing under a deadline.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, warn};
use crate::batch::Batch;
use crate::core::limiter::InFlightSlot;
use crate::sink::EventSink;
use crate::stats::Counters;

/// How a single batch resolved. The first of deadline and callback wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// `on_process` returned `Ok` before the deadline
    Succeeded,
    /// `on_process` returned an error or panicked, with its description
    Failed(String),
    /// The deadline elapsed first
    TimedOut,
}

/// Runs batches through the sink and reports their outcome back to it.
///
/// # Type Parameters
///
/// * `T` - The item type carried by each batch
/// * `E` - The [`EventSink`] doing the work
pub(crate) struct Worker<T, E> {
    sink: Arc<E>,

    /// `None` when no deadline is enforced
    timeout: Option<Duration>,

    counters: Arc<Counters>,

    _marker: PhantomData<fn(T)>,
}

impl<T, E> Clone for Worker<T, E> {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            timeout: self.timeout,
            counters: Arc::clone(&self.counters),
            _marker: PhantomData,
        }
    }
}

impl<T, E> Worker<T, E>
where T: Send + Sync + 'static, E: EventSink<T>
{
    pub(crate) fn new(sink: Arc<E>, timeout: Option<Duration>, counters: Arc<Counters>) -> Self {
        Self {
            sink,
            timeout,
            counters,
            _marker: PhantomData,
        }
    }

    /// Processes `batch` on its own task, holding `slot` until the outcome has
    /// been reported.
    pub(crate) fn spawn(&self, batch: Batch<T>, slot: InFlightSlot) -> JoinHandle<BatchOutcome> {
        let worker = self.clone();
        tokio::spawn(async move {
            let _slot = slot;
            worker.process(batch).await
        })
    }

    /// Processes `batch` and notifies the sink of a failure or timeout.
    /// Success is silent.
    pub(crate) async fn process(&self, batch: Batch<T>) -> BatchOutcome {
        Counters::incr(&self.counters.dispatched_batches);
        debug!(batch_id = %batch.id(), len = batch.len(), "processing batch");

        let outcome = self.race_deadline(&batch).await;
        match &outcome {
            BatchOutcome::Succeeded => {
                Counters::incr(&self.counters.succeeded_batches);
                debug!(batch_id = %batch.id(), "batch processed");
            }
            BatchOutcome::Failed(cause) => {
                Counters::incr(&self.counters.failed_batches);
                warn!(batch_id = %batch.id(), len = batch.len(), cause = %cause, "batch failed");
                self.sink.on_process_error(cause, &batch).await;
            }
            BatchOutcome::TimedOut => {
                Counters::incr(&self.counters.timed_out_batches);
                warn!(batch_id = %batch.id(), len = batch.len(), timeout = ?self.timeout, "batch timed out");
                self.sink.on_process_timeout(&batch).await;
            }
        }
        outcome
    }

    /// Runs the callback on a separate task so the deadline can fire while it
    /// is still busy. A callback that loses the race keeps running detached.
    async fn race_deadline(&self, batch: &Batch<T>) -> BatchOutcome {
        let mut task = {
            let sink = Arc::clone(&self.sink);
            let batch = batch.clone();
            tokio::spawn(async move { sink.on_process(&batch).await })
        };

        let joined = match self.timeout {
            None => (&mut task).await,
            Some(deadline) => match time::timeout(deadline, &mut task).await {
                Ok(joined) => joined,
                Err(_) => return BatchOutcome::TimedOut,
            },
        };

        match joined {
            Ok(Ok(())) => BatchOutcome::Succeeded,
            Ok(Err(err)) => BatchOutcome::Failed(err.to_string()),
            Err(err) if err.is_panic() => BatchOutcome::Failed(String::from("on_process panicked")),
            Err(err) => BatchOutcome::Failed(err.to_string()),
        }
    }
}
