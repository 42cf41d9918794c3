//! Handler builders and associated traits.
//!
//! Provides a minimal builder API for constructing sinks in a type-safe
//! manner. Each builder implements [`HandlerBuilderTrait`], which returns
//! either the concrete sink or a boxed [`LogSink`] ready for registration
//! with a [`Logger`](crate::logger::Logger).

use thiserror::Error;

use crate::handler::LogSink;

pub mod amqp_builder;

pub use amqp_builder::AmqpTransportBuilder;

/// Errors that may occur while building a handler.
#[derive(Debug, Error)]
pub enum HandlerBuildError {
    /// Invalid user supplied configuration.
    #[error("invalid handler configuration: {0}")]
    InvalidConfig(String),
    /// No async runtime was supplied and none is running on this thread.
    #[error("no tokio runtime available to drive the broker link")]
    NoRuntime,
}

/// Trait implemented by all handler builders.
pub trait HandlerBuilderTrait: Send + Sync {
    type Handler: LogSink + 'static;

    /// Build the concrete handler instance.
    fn build_inner(&self) -> Result<Self::Handler, HandlerBuildError>;

    /// Build the handler as a trait object.
    fn build(&self) -> Result<Box<dyn LogSink>, HandlerBuildError> {
        Ok(Box::new(self.build_inner()?))
    }
}
