use async_trait::async_trait;
use tracing::warn;
use crate::batch::Batch;
use crate::error::BoxError;

/// The external collaborator that performs the actual work on each batch and
/// receives outcome notifications.
///
/// The processor never assumes a particular implementation; everything it
/// knows about a batch's fate is expressed through these four calls.
///
/// # Type Parameters
///
/// * `T` - The item type carried by each [`Batch`]
///
/// # Implementation Notes
///
/// * `on_process` runs on its own spawned task, concurrently with other batches,
///   and may be abandoned by a deadline while still executing.
/// * Every notification is terminal for its batch. The processor never retries,
///   so any retry or compensation policy belongs to the sink.
/// * The notification methods default to logging at `warn` level.
/// * `on_schedule_failed`, and `on_process` during a forced flush, run while
///   the pending buffer is locked. Re-submitting items from there must happen
///   on a spawned task; awaiting `schedule` inline deadlocks.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use bulky::{Batch, BoxError, EventSink};
///
/// struct Printer;
///
/// #[async_trait]
/// impl EventSink<u32> for Printer {
///     async fn on_process(&self, batch: &Batch<u32>) -> Result<(), BoxError> {
///         if batch.iter().any(|n| *n == 13) {
///             return Err("unlucky batch".into());
///         }
///         println!("processing {:?}", batch.items());
///         Ok(())
///     }
///
///     async fn on_schedule_failed(&self, batch: Batch<u32>) {
///         println!("dropped {:?}", batch.items());
///     }
/// }
/// ```
#[async_trait]
pub trait EventSink<T>: Send + Sync + 'static
where T: Send + Sync + 'static
{
    /// Performs the work for one batch. Returning an error reports an
    /// application failure through [`on_process_error`](Self::on_process_error).
    async fn on_process(&self, batch: &Batch<T>) -> Result<(), BoxError>;

    /// Called when [`on_process`](Self::on_process) returned an error (or
    /// panicked) before the deadline.
    async fn on_process_error(&self, cause: &str, batch: &Batch<T>) {
        warn!(batch_id = %batch.id(), len = batch.len(), cause, "batch processing failed");
    }

    /// Called when the deadline elapsed before [`on_process`](Self::on_process)
    /// returned. The callback may still be running.
    async fn on_process_timeout(&self, batch: &Batch<T>) {
        warn!(batch_id = %batch.id(), len = batch.len(), "batch processing timed out");
    }

    /// Called when a full batch could not be queued because the dispatch queue
    /// is at capacity. The batch is handed over and not retried.
    async fn on_schedule_failed(&self, batch: Batch<T>) {
        warn!(batch_id = %batch.id(), len = batch.len(), "batch dropped, dispatch queue full");
    }
}
