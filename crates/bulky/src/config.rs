//! Processor configuration.

use std::time::Duration;
use crate::error::ConfigError;

/// Configuration for a [`BulkProcessor`](crate::BulkProcessor).
///
/// | option | effect |
/// |---|---|
/// | `max_in_flight` | hard cap on concurrently processing batches |
/// | `max_queued_batches` | capacity of the dispatch queue, `0` is treated as `1` |
/// | `batch_size` | number of items accumulated before a batch is dispatched |
/// | `process_timeout` | per-batch deadline, [`Duration::ZERO`] disables it |
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use bulky::Options;
///
/// let options = Options::default()
///     .batch_size(50)
///     .max_in_flight(4)
///     .process_timeout(Duration::from_millis(250));
///
/// assert!(options.validate().is_ok());
/// assert_eq!(options.queue_capacity(), 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub max_in_flight: usize,
    pub max_queued_batches: usize,
    pub batch_size: usize,
    pub process_timeout: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_in_flight: 10,
            max_queued_batches: 10,
            batch_size: 10,
            process_timeout: Duration::from_secs(1),
        }
    }
}

impl Options {
    pub fn max_in_flight(mut self, n: usize) -> Self {
        self.max_in_flight = n;
        self
    }

    pub fn max_queued_batches(mut self, n: usize) -> Self {
        self.max_queued_batches = n;
        self
    }

    pub fn batch_size(mut self, n: usize) -> Self {
        self.batch_size = n;
        self
    }

    pub fn process_timeout(mut self, timeout: Duration) -> Self {
        self.process_timeout = timeout;
        self
    }

    /// Effective dispatch queue capacity. A zero setting still yields a
    /// single slot, never an unbounded queue.
    pub fn queue_capacity(&self) -> usize {
        self.max_queued_batches.max(1)
    }

    /// The per-batch deadline, or `None` when enforcement is disabled.
    pub fn timeout(&self) -> Option<Duration> {
        if self.process_timeout.is_zero() {
            None
        } else {
            Some(self.process_timeout)
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_in_flight == 0 {
            return Err(ConfigError::ZeroMaxInFlight);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        Ok(())
    }
}
