use thiserror::Error;

/// Error type returned by [`EventSink::on_process`](crate::EventSink::on_process).
///
/// Its `Display` output becomes the description handed to
/// [`EventSink::on_process_error`](crate::EventSink::on_process_error).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Rejected [`Options`](crate::Options).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("max_in_flight must be greater than zero")]
    ZeroMaxInFlight,

    #[error("batch_size must be greater than zero")]
    ZeroBatchSize,
}

/// Errors surfaced by the processor lifecycle.
///
/// Per-batch failures never show up here, they are reported through the
/// [`EventSink`](crate::EventSink).
#[derive(Debug, Error)]
pub enum BulkError {
    #[error("invalid options: {0}")]
    Config(#[from] ConfigError),

    /// The run entry point was entered a second time.
    #[error("processor has already been started")]
    AlreadyStarted,

    /// The completion channel was dropped before termination was signalled.
    #[error("processor exited without signalling completion")]
    Closed,
}
