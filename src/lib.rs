//! Log sink that forwards records to an AMQP exchange.
//!
//! Records reach an [`AmqpTransport`] through the [`LogSink`] capability,
//! usually via a [`Logger`] that filters by level first. The transport
//! buffers records until its broker channel is ready, drains the buffer
//! once, and publishes directly from then on.

pub mod amqp_transport;
pub mod file_config;
pub mod handler;
pub mod handlers;
pub mod level;
pub mod log_compat;
pub mod log_record;
pub mod logger;
pub mod rate_limited_warner;

#[cfg(any(test, feature = "test-util"))]
pub mod test_utils;

pub use amqp_transport::{
    AmqpTransport, AmqpTransportConfig, BrokerChannel, BrokerConnection, BrokerConnector,
    BrokerError, ConnectionSource, EstablishError, ExchangeKind, ExchangeOptions, LinkStatus,
    PublishProperties,
};
pub use file_config::{ConfigFileError, builder_from_ini_file, builder_from_ini_str};
pub use handler::{Ack, LogSink, SinkError, ignore_ack};
pub use handlers::{AmqpTransportBuilder, HandlerBuildError, HandlerBuilderTrait};
pub use level::{Level, ParseLevelError};
pub use log_compat::{LogBridge, install_global_logger};
pub use log_record::LogEnvelope;
pub use logger::Logger;
