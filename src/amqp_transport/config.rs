//! Configuration structures consumed by the AMQP transport lifecycle.
//!
//! [`AmqpTransportBuilder`](crate::handlers::AmqpTransportBuilder) validates
//! user input and produces these values before handing them to
//! [`AmqpTransport`](super::AmqpTransport).

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::level::Level;
use crate::rate_limited_warner::DEFAULT_WARN_INTERVAL;

use super::broker::{BrokerConnection, BrokerConnector, ExchangeOptions};

/// Default name stamped on every envelope.
pub const DEFAULT_NAME: &str = "amqp-transport";
/// Default minimum level accepted by the transport.
pub const DEFAULT_LEVEL: Level = Level::Info;
/// Default broker address used when no connection is supplied.
pub const DEFAULT_AMQP_URL: &str = "amqp://localhost";
/// Default exchange receiving log envelopes.
pub const DEFAULT_EXCHANGE: &str = "logs";
/// Default routing key attached to every publish.
pub const DEFAULT_ROUTING_KEY: &str = "amqp-transport";

/// Where the transport obtains its broker connection.
#[derive(Clone)]
pub enum ConnectionSource {
    /// Reuse a connection owned by the caller; no new connection is opened.
    Existing(Arc<dyn BrokerConnection>),
    /// Open a fresh connection to `url` through `connector`.
    Url {
        url: String,
        connector: Arc<dyn BrokerConnector>,
    },
}

impl fmt::Debug for ConnectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Existing(_) => f.write_str("Existing(..)"),
            Self::Url { url, .. } => f.debug_struct("Url").field("url", url).finish(),
        }
    }
}

/// Resolved, immutable transport settings.
#[derive(Clone, Debug)]
pub struct AmqpTransportConfig {
    pub name: String,
    pub level: Level,
    pub connection: ConnectionSource,
    pub exchange: String,
    pub exchange_options: ExchangeOptions,
    pub routing_key: String,
    /// Minimum gap between warnings about failed drain publishes.
    pub warn_interval: Duration,
}

impl AmqpTransportConfig {
    /// Settings with every default applied around the given connection source.
    pub fn new(connection: ConnectionSource) -> Self {
        Self {
            name: DEFAULT_NAME.to_owned(),
            level: DEFAULT_LEVEL,
            connection,
            exchange: DEFAULT_EXCHANGE.to_owned(),
            exchange_options: ExchangeOptions::default(),
            routing_key: DEFAULT_ROUTING_KEY.to_owned(),
            warn_interval: DEFAULT_WARN_INTERVAL,
        }
    }
}
