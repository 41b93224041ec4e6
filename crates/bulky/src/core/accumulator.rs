use tokio::sync::{Mutex, MutexGuard};
use crate::batch::Batch;

/// The working batch that incoming items are appended to.
///
/// The buffer lock is exposed through [`Accumulator::lock`] so a caller can
/// hold it across an entire check-and-act (push then enqueue, or take then
/// process) instead of re-locking between steps.
pub(crate) struct Accumulator<T> {
    pending: Mutex<Vec<T>>,
    batch_size: usize,
}

impl<T> Accumulator<T> {
    pub(crate) fn new(batch_size: usize) -> Self {
        Self {
            pending: Mutex::new(Vec::with_capacity(batch_size)),
            batch_size,
        }
    }

    pub(crate) async fn lock(&self) -> PendingBuffer<'_, T> {
        PendingBuffer {
            items: self.pending.lock().await,
            batch_size: self.batch_size,
        }
    }

    /// Length of the working batch.
    pub(crate) async fn len(&self) -> usize {
        self.pending.lock().await.len()
    }
}

/// Exclusive access to the working batch for as long as it is held.
pub(crate) struct PendingBuffer<'a, T> {
    items: MutexGuard<'a, Vec<T>>,
    batch_size: usize,
}

impl<T> PendingBuffer<'_, T> {
    /// Appends `item` and returns the completed batch once the buffer reaches
    /// the batch size. The buffer is empty again afterwards.
    pub(crate) fn push(&mut self, item: T) -> Option<Batch<T>> {
        self.items.push(item);
        if self.items.len() >= self.batch_size {
            return self.take();
        }
        None
    }

    /// Empties the buffer, returning its contents as a batch when non-empty.
    pub(crate) fn take(&mut self) -> Option<Batch<T>> {
        if self.items.is_empty() {
            return None;
        }
        let items = std::mem::replace(&mut *self.items, Vec::with_capacity(self.batch_size));
        Some(Batch::new(items))
    }
}
