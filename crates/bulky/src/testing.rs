//! Recording sink for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use async_trait::async_trait;
use crate::batch::Batch;
use crate::error::BoxError;
use crate::sink::EventSink;

/// What `on_process` does with each batch.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Behavior {
    Succeed,
    Fail(&'static str),
    /// Never returns
    Hang,
    Panic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event<T> {
    Processed(Vec<T>),
    Error(String, Vec<T>),
    Timeout(Vec<T>),
    ScheduleFailed(Vec<T>),
}

/// Sink that records every call it receives and tracks how many `on_process`
/// calls overlap.
pub(crate) struct RecordingSink<T> {
    behavior: Behavior,
    delay: Duration,
    events: Mutex<Vec<Event<T>>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl<T: Clone> RecordingSink<T> {
    pub(crate) fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            delay: Duration::ZERO,
            events: Mutex::new(vec![]),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Makes each `on_process` call sleep for `delay` before behaving.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn record(&self, event: Event<T>) {
        self.events.lock().unwrap().push(event);
    }

    pub(crate) fn events(&self) -> Vec<Event<T>> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn processed(&self) -> Vec<Vec<T>> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Processed(items) => Some(items),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn errors(&self) -> Vec<(String, Vec<T>)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Error(cause, items) => Some((cause, items)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn timeouts(&self) -> Vec<Vec<T>> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Timeout(items) => Some(items),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn schedule_failures(&self) -> Vec<Vec<T>> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::ScheduleFailed(items) => Some(items),
                _ => None,
            })
            .collect()
    }

    /// Highest number of `on_process` calls observed running at once.
    pub(crate) fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl<T> EventSink<T> for RecordingSink<T>
where T: Clone + Send + Sync + 'static
{
    async fn on_process(&self, batch: &Batch<T>) -> Result<(), BoxError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _active = ActiveGuard(&self.active);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.behavior {
            Behavior::Succeed => {
                self.record(Event::Processed(batch.to_vec()));
                Ok(())
            }
            Behavior::Fail(cause) => Err(cause.into()),
            Behavior::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
            Behavior::Panic => panic!("sink exploded"),
        }
    }

    async fn on_process_error(&self, cause: &str, batch: &Batch<T>) {
        self.record(Event::Error(cause.to_string(), batch.to_vec()));
    }

    async fn on_process_timeout(&self, batch: &Batch<T>) {
        self.record(Event::Timeout(batch.to_vec()));
    }

    async fn on_schedule_failed(&self, batch: Batch<T>) {
        self.record(Event::ScheduleFailed(batch.into_vec()));
    }
}
