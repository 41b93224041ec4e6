//! Bounded FIFO of ready batches.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use crate::batch::Batch;

/// A bounded FIFO holding batches that are waiting for a worker slot.
///
/// Pushing never blocks: a full queue hands the batch straight back so the
/// caller can report backpressure. Popping never blocks either; the scheduler
/// loop waits on [`ready`](Self::ready), woken through a [`Notify`] instead of
/// re-polling, and only then reserves a worker slot and pops.
pub(crate) struct DispatchQueue<T> {
    batches: Mutex<VecDeque<Batch<T>>>,
    capacity: usize,
    available: Notify,
}

impl<T> DispatchQueue<T> {
    /// Creates a queue holding at most `capacity` batches, never less than one.
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            batches: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            available: Notify::new(),
        }
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, VecDeque<Batch<T>>> {
        self.batches.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueues `batch`, or returns it untouched when the queue is full.
    pub(crate) fn try_push(&self, batch: Batch<T>) -> Result<(), Batch<T>> {
        {
            let mut batches = self.lock();
            if batches.len() >= self.capacity {
                return Err(batch);
            }
            batches.push_back(batch);
        }
        // single consumer, a stored permit covers a push that races the wait
        self.available.notify_one();
        Ok(())
    }

    pub(crate) fn try_pop(&self) -> Option<Batch<T>> {
        self.lock().pop_front()
    }

    /// Waits until at least one batch is queued, without dequeuing it.
    pub(crate) async fn ready(&self) {
        // a leftover permit from an earlier push only costs one extra check
        while self.len() == 0 {
            self.available.notified().await;
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time;

    #[test]
    fn test_zero_capacity_holds_one_batch() {
        let queue = DispatchQueue::new(0);
        assert_eq!(queue.capacity(), 1);
        assert!(queue.try_push(Batch::new(vec![1])).is_ok());
        assert!(queue.try_push(Batch::new(vec![2])).is_err());
    }

    #[test]
    fn test_full_queue_returns_batch() {
        let queue = DispatchQueue::new(2);
        queue.try_push(Batch::new(vec![1])).unwrap();
        queue.try_push(Batch::new(vec![2])).unwrap();

        let rejected = queue.try_push(Batch::new(vec![3])).unwrap_err();
        assert_eq!(rejected.items(), &[3]);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_fifo_order() {
        let queue = DispatchQueue::new(3);
        for n in 0..3 {
            queue.try_push(Batch::new(vec![n])).unwrap();
        }
        let order: Vec<i32> = std::iter::from_fn(|| queue.try_pop())
            .map(|batch| batch.items()[0])
            .collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_pop_is_not_an_error() {
        let queue: DispatchQueue<u8> = DispatchQueue::new(1);
        assert!(queue.try_pop().is_none());
    }

    #[tokio::test]
    async fn test_ready_wakes_on_push() {
        let queue = Arc::new(DispatchQueue::new(1));
        let consumer = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.ready().await })
        };

        time::sleep(Duration::from_millis(20)).await;
        assert!(!consumer.is_finished());

        queue.try_push(Batch::new(vec![7])).unwrap();
        time::timeout(Duration::from_secs(1), consumer)
            .await
            .expect("consumer woke up")
            .unwrap();
        // ready only observes, the batch is still there
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.try_pop().unwrap().items(), &[7]);
    }

    #[tokio::test]
    async fn test_ready_returns_at_once_when_not_empty() {
        let queue = DispatchQueue::new(2);
        queue.try_push(Batch::new(vec![1])).unwrap();
        // consume the stored permit so ready has to rely on the length check
        queue.try_pop().unwrap();
        queue.try_push(Batch::new(vec![2])).unwrap();
        time::timeout(Duration::from_millis(10), queue.ready())
            .await
            .expect("queue already holds a batch");
        assert_eq!(queue.len(), 1);
    }
}
