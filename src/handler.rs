//! The capability a dispatching logger depends on.
//!
//! Sinks never filter by level themselves: the [`Logger`](crate::logger::Logger)
//! checks [`LogSink::level`] before calling [`LogSink::log`].

use serde_json::Value;
use thiserror::Error;

use crate::level::Level;

/// Errors reported to the caller through an [`Ack`].
#[derive(Debug, Error)]
pub enum SinkError {
    /// The broker rejected or failed to accept the published payload.
    #[error("publish failed: {0}")]
    Publish(String),
    /// The envelope could not be encoded.
    #[error("failed to serialise envelope: {0}")]
    Serialise(#[from] serde_json::Error),
    /// The sink stopped publishing before the record could be handed over.
    #[error("publisher has stopped")]
    Closed,
    /// The acknowledgement was dropped before the outcome was known.
    #[error("acknowledgement lost before the record was handled")]
    AckLost,
}

/// Completion callback invoked exactly once per record.
pub type Ack = Box<dyn FnOnce(Result<(), SinkError>) + Send + 'static>;

/// Build an [`Ack`] that discards the outcome.
pub fn ignore_ack() -> Ack {
    Box::new(|_| {})
}

/// Trait implemented by every destination records can be routed to.
///
/// Implementations must be `Send + Sync` because the logger may be shared
/// across threads and invoked concurrently.
pub trait LogSink: Send + Sync {
    /// Name stamped onto every record handled by this sink.
    fn name(&self) -> &str;

    /// Least severe level this sink accepts.
    fn level(&self) -> Level;

    /// Accept a record without blocking the caller.
    ///
    /// `ack` is invoked once the sink has either buffered the record or
    /// finished issuing it to the destination.
    fn log(&self, level: Level, message: &str, meta: Option<Value>, ack: Ack);
}
