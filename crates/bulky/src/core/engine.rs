use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::{debug, warn};
use crate::config::Options;
use crate::core::accumulator::Accumulator;
use crate::core::limiter::ConcurrencyLimiter;
use crate::core::queue::DispatchQueue;
use crate::core::state::Lifecycle;
use crate::core::worker::{BatchOutcome, Worker};
use crate::sink::EventSink;
use crate::stats::Counters;

/// State shared by the caller-facing operations and the scheduler loop.
pub(crate) struct Engine<T, E> {
    pub(crate) options: Options,

    pub(crate) lifecycle: Arc<Lifecycle>,

    /// Items waiting to fill the next batch
    pub(crate) accumulator: Accumulator<T>,

    /// Full batches waiting for a worker slot
    pub(crate) queue: DispatchQueue<T>,

    pub(crate) limiter: Arc<ConcurrencyLimiter>,

    pub(crate) worker: Worker<T, E>,

    pub(crate) sink: Arc<E>,

    pub(crate) counters: Arc<Counters>,

    /// Set once the scheduler loop has been entered
    pub(crate) started: AtomicBool,
}

impl<T, E> Engine<T, E>
where T: Send + Sync + 'static, E: EventSink<T>
{
    /// Builds an engine from options that have already been validated.
    pub(crate) fn new(sink: E, options: Options) -> Self {
        let sink = Arc::new(sink);
        let counters = Arc::new(Counters::default());
        Self {
            accumulator: Accumulator::new(options.batch_size),
            queue: DispatchQueue::new(options.queue_capacity()),
            limiter: Arc::new(ConcurrencyLimiter::new(options.max_in_flight)),
            worker: Worker::new(Arc::clone(&sink), options.timeout(), Arc::clone(&counters)),
            lifecycle: Arc::new(Lifecycle::new()),
            started: AtomicBool::new(false),
            sink,
            counters,
            options,
        }
    }

    /// Appends `item` to the working batch, queueing the batch once it is
    /// full. A full queue drops the batch and reports it to the sink.
    ///
    /// The running check happens under the buffer lock, which the drain also
    /// takes, so every accepted item is either drained or reported.
    pub(crate) async fn schedule(&self, item: T) {
        let mut buffer = self.accumulator.lock().await;
        if !self.lifecycle.is_running() {
            Counters::incr(&self.counters.rejected_items);
            warn!(state = %self.lifecycle.state(), "processor is shutting down, item rejected");
            return;
        }
        Counters::incr(&self.counters.scheduled_items);

        let Some(batch) = buffer.push(item) else {
            return;
        };
        match self.queue.try_push(batch) {
            Ok(()) => debug!(queued = self.queue.len(), "batch queued"),
            Err(batch) => {
                Counters::incr(&self.counters.schedule_failures);
                warn!(
                    batch_id = %batch.id(),
                    len = batch.len(),
                    capacity = self.queue.capacity(),
                    "dispatch queue full, batch not scheduled"
                );
                self.sink.on_schedule_failed(batch).await;
            }
        }
    }

    /// Processes the working batch right away, outside the queue and the
    /// in-flight limit. Does nothing when the buffer is empty.
    pub(crate) async fn consume_buffer(&self) -> Option<BatchOutcome> {
        let mut buffer = self.accumulator.lock().await;
        let batch = buffer.take()?;
        debug!(batch_id = %batch.id(), len = batch.len(), "flushing pending buffer");
        Some(self.worker.process(batch).await)
    }
}
