//! In-flight accounting for dispatched batches.

use std::pin::pin;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::sync::Arc;
use tokio::sync::Notify;

/// Caps the number of batches processing at once.
///
/// The counter sits behind a lock shared by the scheduler loop and every
/// worker's finalizer. Admission is a lock-held check-and-increment, so the
/// count never exceeds `max_in_flight`. Releases wake anyone waiting for a
/// free slot or for the limiter to go idle.
pub(crate) struct ConcurrencyLimiter {
    count: Mutex<usize>,
    max_in_flight: usize,
    freed: Notify,
}

impl ConcurrencyLimiter {
    pub(crate) fn new(max_in_flight: usize) -> Self {
        Self {
            count: Mutex::new(0),
            max_in_flight,
            freed: Notify::new(),
        }
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of batches currently holding a slot.
    pub(crate) fn in_flight(&self) -> usize {
        *self.lock()
    }

    /// Takes a slot if one is free.
    pub(crate) fn try_acquire(self: &Arc<Self>) -> Option<InFlightSlot> {
        let mut count = self.lock();
        if *count >= self.max_in_flight {
            return None;
        }
        *count += 1;
        Some(InFlightSlot {
            limiter: Arc::clone(self),
        })
    }

    /// Waits for a free slot and takes it.
    pub(crate) async fn acquire(self: &Arc<Self>) -> InFlightSlot {
        loop {
            let mut freed = pin!(self.freed.notified());
            // register before checking so a release in between is not lost
            freed.as_mut().enable();
            if let Some(slot) = self.try_acquire() {
                return slot;
            }
            freed.await;
        }
    }

    /// Waits until no batch holds a slot.
    pub(crate) async fn wait_idle(&self) {
        loop {
            let mut freed = pin!(self.freed.notified());
            freed.as_mut().enable();
            if self.in_flight() == 0 {
                return;
            }
            freed.await;
        }
    }

    fn release(&self) {
        {
            let mut count = self.lock();
            *count = count.saturating_sub(1);
        }
        self.freed.notify_waiters();
    }
}

/// One admitted batch's claim on the limiter.
///
/// Dropping the slot gives it back exactly once, whichever way the worker
/// finished, panics included.
#[must_use = "dropping the slot releases it immediately"]
pub(crate) struct InFlightSlot {
    limiter: Arc<ConcurrencyLimiter>,
}

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        self.limiter.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time;

    #[test]
    fn test_never_exceeds_max() {
        let limiter = Arc::new(ConcurrencyLimiter::new(2));
        let first = limiter.try_acquire();
        let second = limiter.try_acquire();
        let third = limiter.try_acquire();

        assert!(first.is_some());
        assert!(second.is_some());
        assert!(third.is_none());
        assert_eq!(limiter.in_flight(), 2);
    }

    #[test]
    fn test_drop_releases_exactly_once() {
        let limiter = Arc::new(ConcurrencyLimiter::new(1));
        let slot = limiter.try_acquire().unwrap();
        assert_eq!(limiter.in_flight(), 1);

        drop(slot);
        assert_eq!(limiter.in_flight(), 0);
        assert!(limiter.try_acquire().is_some());
    }

    #[tokio::test]
    async fn test_acquire_waits_for_release() {
        let limiter = Arc::new(ConcurrencyLimiter::new(1));
        let held = limiter.try_acquire().unwrap();

        let waiter = {
            let limiter = limiter.clone();
            tokio::spawn(async move {
                let _slot = limiter.acquire().await;
            })
        };

        time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(held);
        time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter acquired the freed slot")
            .unwrap();
        assert_eq!(limiter.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_wait_idle_returns_after_last_release() {
        let limiter = Arc::new(ConcurrencyLimiter::new(3));
        let slots: Vec<_> = (0..3).map(|_| limiter.try_acquire().unwrap()).collect();

        let idle = {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.wait_idle().await })
        };

        time::sleep(Duration::from_millis(20)).await;
        assert!(!idle.is_finished());

        drop(slots);
        time::timeout(Duration::from_secs(1), idle)
            .await
            .expect("limiter went idle")
            .unwrap();
    }

    #[tokio::test]
    async fn test_slot_released_when_task_panics() {
        let limiter = Arc::new(ConcurrencyLimiter::new(1));
        let slot = limiter.try_acquire().unwrap();

        let task = tokio::spawn(async move {
            let _slot = slot;
            panic!("worker blew up");
        });
        assert!(task.await.is_err());
        assert_eq!(limiter.in_flight(), 0);
    }
}
