//! # Bulky
//!
//! An asynchronous **bulk** batching engine: items submitted one at a time are
//! grouped into fixed-size batches and handed to a user-supplied sink under a
//! bounded level of concurrency, with a per-batch deadline and explicit
//! backpressure reporting.
//!
//! ## Overview
//!
//! ```text
//! schedule(item) ─▶ pending buffer ─(full)─▶ dispatch queue ─▶ scheduler loop ─▶ worker ─▶ EventSink
//!                                      │                                             │
//!                                      └─ queue full: on_schedule_failed             └─ error / timeout notifications
//! ```
//!
//! - The pending buffer emits a batch once it holds `batch_size` items.
//! - The dispatch queue holds at most `max_queued_batches` batches (at least
//!   one). When it is full the new batch is dropped and reported through
//!   [`EventSink::on_schedule_failed`]; nothing is buffered beyond it.
//! - The scheduler loop admits queued batches in FIFO order while fewer than
//!   `max_in_flight` batches are processing. It sleeps on signals rather than
//!   spinning.
//! - Each worker races [`EventSink::on_process`] against `process_timeout`.
//!   Errors and timeouts are terminal for their batch and are reported to the
//!   sink. Success is silent.
//!
//! ## Lifecycle
//!
//! A processor moves through [`ProcessorState`]: `Running → Stopping →
//! Draining → Terminated`. [`BulkProcessor::stop`] ends admission of new
//! items. The drain then flushes the partial batch and everything already
//! queued, and termination waits for every in-flight worker. After
//! termination the sink is never called again.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use async_trait::async_trait;
//! use bulky::{Batch, BoxError, BulkProcessor, EventSink, Options};
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl EventSink<u32> for Printer {
//!     async fn on_process(&self, batch: &Batch<u32>) -> Result<(), BoxError> {
//!         println!("processing {:?}", batch.items());
//!         Ok(())
//!     }
//!
//!     async fn on_process_timeout(&self, batch: &Batch<u32>) {
//!         println!("timed out: {:?}", batch.items());
//!     }
//!
//!     async fn on_process_error(&self, cause: &str, batch: &Batch<u32>) {
//!         println!("failed: {:?} cause: {}", batch.items(), cause);
//!     }
//!
//!     async fn on_schedule_failed(&self, batch: Batch<u32>) {
//!         println!("dropped: {:?}", batch.items());
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), bulky::BulkError> {
//! let options = Options::default()
//!     .max_in_flight(10)
//!     .max_queued_batches(10)
//!     .batch_size(10)
//!     .process_timeout(Duration::from_secs(1));
//! let processor = BulkProcessor::new(Printer, options)?;
//!
//! let producer = {
//!     let processor = processor.clone();
//!     tokio::spawn(async move {
//!         for n in 0..100 {
//!             processor.schedule(n).await;
//!         }
//!         processor.stop();
//!     })
//! };
//!
//! let (done, finished) = tokio::sync::oneshot::channel();
//! processor.process(done).await?;
//! let stats = finished.await.expect("processor signals completion");
//! # producer.await.unwrap();
//! assert_eq!(stats.dispatched_batches, 10);
//! # Ok(())
//! # }
//! ```

mod batch;
mod config;
mod error;
mod processor;
mod sink;
mod stats;

pub mod core;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::Batch;
pub use config::Options;
pub use error::{BoxError, BulkError, ConfigError};
pub use processor::BulkProcessor;
pub use sink::EventSink;
pub use stats::Stats;

pub use crate::core::handle::{Completion, ProcessorHandle};
pub use crate::core::state::ProcessorState;
pub use crate::core::worker::BatchOutcome;
