//! AMQP-based log transport.
//!
//! This module defines [`AmqpTransport`], a sink that turns each record into
//! a [`LogEnvelope`](crate::log_record::LogEnvelope), encodes it as JSON, and
//! publishes it to a direct exchange. Establishing the broker link runs in
//! the background: records that arrive before the channel is ready are
//! buffered and drained exactly once when it becomes ready. A single
//! publisher task owns the channel: it drains the buffer first, then
//! publishes later records in the order `log` accepted them.
//!
//! # Failure semantics
//!
//! - Establishment is attempted once. If connecting, opening the channel, or
//!   declaring the exchange fails, the transport keeps buffering for the rest
//!   of its life.
//! - A failed publish on the direct path is reported through that record's
//!   acknowledgement.
//! - A failed publish while draining is logged and does not stop the
//!   remaining buffered records from being published.

mod broker;
mod config;
mod handler;
#[cfg(feature = "lapin")]
mod lapin_backend;
mod serialise;
mod state;
mod transport;


pub use broker::{
    BrokerChannel, BrokerConnection, BrokerConnector, BrokerError, ExchangeKind, ExchangeOptions,
    PublishProperties,
};
pub use config::{
    AmqpTransportConfig, ConnectionSource, DEFAULT_AMQP_URL, DEFAULT_EXCHANGE, DEFAULT_LEVEL,
    DEFAULT_NAME, DEFAULT_ROUTING_KEY,
};
pub use handler::{AmqpTransport, LinkStatus};
#[cfg(feature = "lapin")]
pub use lapin_backend::{LapinChannel, LapinConnection, LapinConnector};
pub use serialise::{CONTENT_ENCODING, CONTENT_TYPE, deserialise_envelope, serialise_envelope};
pub use transport::{EstablishError, establish};
