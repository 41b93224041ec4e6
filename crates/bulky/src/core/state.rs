use std::fmt;
use std::pin::pin;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::Notify;
use tracing::info;

/// Lifecycle of a processor.
///
/// `Running → Stopping → Draining → Terminated`, never backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ProcessorState {
    /// Accepting items and dispatching batches
    Running = 0,
    /// Stop was requested, the scheduler loop has not picked it up yet
    Stopping = 1,
    /// Flushing the pending buffer and queued batches
    Draining = 2,
    /// All work finished, no further sink calls will happen
    Terminated = 3,
}

impl ProcessorState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Running,
            1 => Self::Stopping,
            2 => Self::Draining,
            _ => Self::Terminated,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Draining => "draining",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for ProcessorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Atomic cell holding a [`ProcessorState`].
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(ProcessorState::Running as u8))
    }

    pub(crate) fn get(&self) -> ProcessorState {
        ProcessorState::from_u8(self.0.load(Ordering::SeqCst))
    }

    /// Moves `from → to`, returning whether this call made the transition.
    pub(crate) fn transition(&self, from: ProcessorState, to: ProcessorState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Forward-only store, used by the scheduler loop, which owns every
    /// transition after `Stopping`.
    pub(crate) fn advance(&self, to: ProcessorState) {
        self.0.fetch_max(to as u8, Ordering::SeqCst);
    }
}

/// Processor state plus the signal that wakes the scheduler loop on stop.
///
/// Shared between the engine and any [`ProcessorHandle`](crate::ProcessorHandle)
/// so a stop can be requested without knowing the item or sink types.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    state: StateCell,
    stop_signal: Notify,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            state: StateCell::new(),
            stop_signal: Notify::new(),
        }
    }

    pub(crate) fn state(&self) -> ProcessorState {
        self.state.get()
    }

    pub(crate) fn is_running(&self) -> bool {
        self.state() == ProcessorState::Running
    }

    pub(crate) fn advance(&self, to: ProcessorState) {
        self.state.advance(to);
    }

    /// Requests a stop. Safe to call any number of times from anywhere.
    pub(crate) fn request_stop(&self) {
        if self.state.transition(ProcessorState::Running, ProcessorState::Stopping) {
            info!("stop requested");
        }
        self.stop_signal.notify_waiters();
    }

    /// Resolves once the processor has left [`ProcessorState::Running`].
    pub(crate) async fn stopped(&self) {
        loop {
            let mut notified = pin!(self.stop_signal.notified());
            // register before checking so a concurrent stop is not lost
            notified.as_mut().enable();
            if !self.is_running() {
                return;
            }
            notified.await;
        }
    }
}
