use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time snapshot of a processor's counters.
///
/// All counters only ever increase over the lifetime of a processor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Items accepted by `schedule`
    pub scheduled_items: u64,
    /// Items refused because stop had already been requested
    pub rejected_items: u64,
    /// Batches handed to a worker, forced flushes included
    pub dispatched_batches: u64,
    pub succeeded_batches: u64,
    pub failed_batches: u64,
    pub timed_out_batches: u64,
    /// Full batches dropped because the dispatch queue was at capacity
    pub schedule_failures: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) scheduled_items: AtomicU64,
    pub(crate) rejected_items: AtomicU64,
    pub(crate) dispatched_batches: AtomicU64,
    pub(crate) succeeded_batches: AtomicU64,
    pub(crate) failed_batches: AtomicU64,
    pub(crate) timed_out_batches: AtomicU64,
    pub(crate) schedule_failures: AtomicU64,
}

impl Counters {
    #[inline]
    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> Stats {
        Stats {
            scheduled_items: self.scheduled_items.load(Ordering::Relaxed),
            rejected_items: self.rejected_items.load(Ordering::Relaxed),
            dispatched_batches: self.dispatched_batches.load(Ordering::Relaxed),
            succeeded_batches: self.succeeded_batches.load(Ordering::Relaxed),
            failed_batches: self.failed_batches.load(Ordering::Relaxed),
            timed_out_batches: self.timed_out_batches.load(Ordering::Relaxed),
            schedule_failures: self.schedule_failures.load(Ordering::Relaxed),
        }
    }
}
