//! # Core Engine
//!
//! The moving parts behind [`BulkProcessor`](crate::BulkProcessor).
//!
//! ## Module Structure
//!
//! * [`accumulator`] - The pending buffer items are appended to until a batch
//!   is full. Its lock is shared by `schedule` and the forced flush.
//!
//! * [`queue`] - Bounded FIFO of full batches. Enqueue never blocks; a full
//!   queue is backpressure and the batch is reported to the sink.
//!
//! * [`limiter`] - Lock-guarded in-flight counter with RAII slots, so every
//!   worker gives its slot back exactly once.
//!
//! * [`worker`] - Processes a single batch, racing the sink callback against
//!   the configured deadline.
//!
//! * [`scheduler`] - The control loop admitting queued batches to workers, and
//!   the drain protocol run on stop.
//!
//! * [`handle`] - Background run handle and its completion future.
//!
//! ## Lock Ordering
//!
//! The pending buffer lock may be held while taking the queue or limiter
//! locks, never the other way round. The queue and limiter locks are never
//! held across an await.
pub(crate) mod accumulator;
pub(crate) mod engine;
pub mod handle;
pub(crate) mod limiter;
pub(crate) mod queue;
pub(crate) mod scheduler;
pub mod state;
pub mod worker;
