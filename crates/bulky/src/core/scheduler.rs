use tracing::{debug, info};
use crate::core::engine::Engine;
use crate::core::state::ProcessorState;
use crate::sink::EventSink;

/// Drives `engine` from `Running` to `Terminated`.
///
/// While running, the loop sleeps until a batch is queued, then until a slot is
/// free, admitting batches in FIFO order. A slot is only taken once a batch is
/// there to fill it, so the in-flight count never covers an idle wait. A stop
/// request interrupts either wait. The drain that follows flushes the pending buffer and every batch
/// queued at drain start, then waits for in-flight workers.
pub(crate) async fn scheduling_loop<T, E>(engine: &Engine<T, E>)
where T: Send + Sync + 'static, E: EventSink<T>
{
    info!(
        max_in_flight = engine.options.max_in_flight,
        queue_capacity = engine.queue.capacity(),
        batch_size = engine.options.batch_size,
        process_timeout = ?engine.options.process_timeout,
        "scheduler started"
    );

    loop {
        tokio::select! {
            biased;
            _ = engine.lifecycle.stopped() => break,
            _ = engine.queue.ready() => {}
        }
        let slot = tokio::select! {
            biased;
            _ = engine.lifecycle.stopped() => break,
            slot = engine.limiter.acquire() => slot,
        };
        // sole consumer while running, so the batch seen by ready is still queued
        let Some(batch) = engine.queue.try_pop() else {
            continue;
        };
        debug!(batch_id = %batch.id(), in_flight = engine.limiter.in_flight(), "admitting batch");
        engine.worker.spawn(batch, slot);
    }

    drain(engine).await;

    engine.limiter.wait_idle().await;
    engine.lifecycle.advance(ProcessorState::Terminated);
    info!(stats = ?engine.counters.snapshot(), "processor terminated");
}

/// Admits the pending buffer as one final batch, then the batches queued at
/// drain start. Admission still goes through the limiter.
async fn drain<T, E>(engine: &Engine<T, E>)
where T: Send + Sync + 'static, E: EventSink<T>
{
    // enqueues only happen under the buffer lock, so the queue length read
    // here is final: schedule refuses items once the state has left Running
    let (remainder, queued) = {
        let mut buffer = engine.accumulator.lock().await;
        engine.lifecycle.advance(ProcessorState::Draining);
        (buffer.take(), engine.queue.len())
    };
    info!(
        pending = remainder.as_ref().map_or(0, |batch| batch.len()),
        queued,
        "draining"
    );

    if let Some(batch) = remainder {
        let slot = engine.limiter.acquire().await;
        debug!(batch_id = %batch.id(), len = batch.len(), "admitting final partial batch");
        engine.worker.spawn(batch, slot);
    }

    for _ in 0..queued {
        let Some(batch) = engine.queue.try_pop() else {
            break;
        };
        let slot = engine.limiter.acquire().await;
        debug!(batch_id = %batch.id(), "admitting queued batch");
        engine.worker.spawn(batch, slot);
    }
}
