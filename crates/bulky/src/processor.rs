use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::sync::oneshot;
use tracing::warn;
use crate::config::Options;
use crate::core::engine::Engine;
use crate::core::handle::ProcessorHandle;
use crate::core::scheduler::scheduling_loop;
use crate::core::state::ProcessorState;
use crate::core::worker::BatchOutcome;
use crate::error::BulkError;
use crate::sink::EventSink;
use crate::stats::Stats;

/// Groups individually scheduled items into fixed-size batches and dispatches
/// them to an [`EventSink`] with bounded concurrency.
///
/// The processor is cheap to clone; clones share the same engine, so any
/// number of tasks may call [`schedule`](Self::schedule) while one of them
/// runs the scheduler loop through [`process`](Self::process) or
/// [`start`](Self::start).
///
/// # Type Parameters
///
/// * `T` - The item type, opaque to the processor
/// * `E` - The sink performing the work and receiving notifications
pub struct BulkProcessor<T, E> {
    engine: Arc<Engine<T, E>>,
}

impl<T, E> Clone for BulkProcessor<T, E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<T, E> BulkProcessor<T, E>
where T: Send + Sync + 'static, E: EventSink<T>
{
    /// Creates a processor in [`ProcessorState::Running`].
    ///
    /// # Errors
    ///
    /// [`BulkError::Config`] when `options` fail validation.
    pub fn new(sink: E, options: Options) -> Result<Self, BulkError> {
        options.validate()?;
        Ok(Self {
            engine: Arc::new(Engine::new(sink, options)),
        })
    }

    /// Adds `item` to the working batch.
    ///
    /// Once the batch reaches `batch_size` it is queued for dispatch, or
    /// handed to [`EventSink::on_schedule_failed`] if the queue is full. Never
    /// fails; after [`stop`](Self::stop) items are refused and counted in
    /// [`Stats::rejected_items`] without reaching the sink.
    pub async fn schedule(&self, item: T) {
        self.engine.schedule(item).await;
    }

    /// Processes the pending partial batch immediately, bypassing the queue
    /// and the in-flight limit. Returns `None` if there was nothing pending.
    pub async fn consume_buffer(&self) -> Option<BatchOutcome> {
        self.engine.consume_buffer().await
    }

    /// Requests a stop. In-flight batches are not cancelled; queued and
    /// pending items are drained before the processor terminates.
    pub fn stop(&self) {
        self.engine.lifecycle.request_stop();
    }

    /// Runs the scheduler loop until the processor terminates, then sends the
    /// final stats on `done`.
    ///
    /// # Errors
    ///
    /// [`BulkError::AlreadyStarted`] if the loop has been entered before.
    pub async fn process(&self, done: oneshot::Sender<Stats>) -> Result<(), BulkError> {
        if self.engine.started.swap(true, Ordering::SeqCst) {
            return Err(BulkError::AlreadyStarted);
        }
        scheduling_loop(&self.engine).await;
        // the caller may have stopped listening
        let _ = done.send(self.stats());
        Ok(())
    }

    /// Spawns [`process`](Self::process) on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// When called outside a tokio runtime.
    pub fn start(&self) -> ProcessorHandle {
        let processor = self.clone();
        ProcessorHandle::new(Arc::clone(&self.engine.lifecycle), move |done| {
            tokio::spawn(async move {
                if let Err(err) = processor.process(done).await {
                    warn!(error = %err, "run loop not started");
                }
            })
        })
    }

    pub fn state(&self) -> ProcessorState {
        self.engine.lifecycle.state()
    }

    pub fn options(&self) -> &Options {
        &self.engine.options
    }

    /// Batches currently being processed by a worker.
    pub fn in_flight(&self) -> usize {
        self.engine.limiter.in_flight()
    }

    /// Batches waiting in the dispatch queue.
    pub fn queued(&self) -> usize {
        self.engine.queue.len()
    }

    /// Items in the working batch.
    pub async fn pending(&self) -> usize {
        self.engine.accumulator.len().await
    }

    pub fn stats(&self) -> Stats {
        self.engine.counters.snapshot()
    }
}
