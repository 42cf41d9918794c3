//! Builder for [`AmqpTransport`](crate::amqp_transport::AmqpTransport).
//!
//! Mirrors the transport's configuration surface: sink name and level, the
//! connection (caller-owned or opened from a url), the exchange and its
//! declaration options, and the routing key. Validation happens in
//! [`build_inner`](HandlerBuilderTrait::build_inner) so configuration errors
//! surface before any background work starts.

use std::{fmt, sync::Arc, time::Duration};

use tokio::runtime::Handle;

use crate::amqp_transport::{
    AmqpTransport, AmqpTransportConfig, BrokerConnection, BrokerConnector, ConnectionSource,
    DEFAULT_AMQP_URL, ExchangeOptions,
};
use crate::level::Level;

use super::{HandlerBuildError, HandlerBuilderTrait};

macro_rules! option_setter {
    ($(#[$meta:meta])* $fn_name:ident, $field:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: $ty) -> Self {
            self.$field = Some(value);
            self
        }
    };
}

/// Builder for constructing [`AmqpTransport`] instances.
#[derive(Clone)]
pub struct AmqpTransportBuilder {
    name: Option<String>,
    level: Option<String>,
    connection: Option<Arc<dyn BrokerConnection>>,
    url: Option<String>,
    connector: Option<Arc<dyn BrokerConnector>>,
    exchange: Option<String>,
    exchange_options: Option<ExchangeOptions>,
    routing_key: Option<String>,
    warn_interval: Option<Duration>,
    runtime: Option<Handle>,
}

impl Default for AmqpTransportBuilder {
    fn default() -> Self {
        Self {
            name: None,
            level: None,
            connection: None,
            url: Some(DEFAULT_AMQP_URL.to_owned()),
            connector: None,
            exchange: None,
            exchange_options: None,
            routing_key: None,
            warn_interval: None,
            runtime: None,
        }
    }
}

impl AmqpTransportBuilder {
    /// Create a builder with every option at its default.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the least severe level accepted, e.g. `"info"` or `"debug"`.
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    /// Reuse an existing connection. Takes precedence over any url.
    pub fn with_connection(mut self, connection: Arc<dyn BrokerConnection>) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Broker address used when no connection is supplied.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Clear the default url so only a supplied connection can be used.
    pub fn without_url(mut self) -> Self {
        self.url = None;
        self
    }

    /// Connector used to open a connection from the url.
    pub fn with_connector(mut self, connector: Arc<dyn BrokerConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn with_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = Some(exchange.into());
        self
    }

    pub fn with_routing_key(mut self, routing_key: impl Into<String>) -> Self {
        self.routing_key = Some(routing_key.into());
        self
    }

    option_setter!(
        #[doc = "Set the exchange declaration options."]
        with_exchange_options,
        exchange_options,
        ExchangeOptions
    );
    option_setter!(
        #[doc = "Set the minimum gap between warnings about failed buffered publishes."]
        with_warn_interval,
        warn_interval,
        Duration
    );
    option_setter!(
        #[doc = "Run the broker link on `runtime` instead of the current one."]
        with_runtime,
        runtime,
        Handle
    );

    fn usable_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.trim().is_empty())
    }

    fn validate(&self) -> Result<(), HandlerBuildError> {
        if self.connection.is_none() && self.usable_url().is_none() {
            return Err(HandlerBuildError::InvalidConfig(
                "missing AMQP connection: supply a connection or an amqp url".into(),
            ));
        }
        if self.exchange.as_deref().is_some_and(|e| e.trim().is_empty()) {
            return Err(HandlerBuildError::InvalidConfig(
                "exchange must not be empty".into(),
            ));
        }
        Ok(())
    }

    fn parse_level(&self) -> Result<Level, HandlerBuildError> {
        match &self.level {
            None => Ok(crate::amqp_transport::DEFAULT_LEVEL),
            Some(level) => level
                .parse()
                .map_err(|err| HandlerBuildError::InvalidConfig(format!("{err}"))),
        }
    }

    #[cfg(feature = "lapin")]
    fn default_connector() -> Option<Arc<dyn BrokerConnector>> {
        Some(Arc::new(crate::amqp_transport::LapinConnector::default()))
    }

    #[cfg(not(feature = "lapin"))]
    fn default_connector() -> Option<Arc<dyn BrokerConnector>> {
        None
    }

    fn build_connection_source(&self) -> Result<ConnectionSource, HandlerBuildError> {
        if let Some(connection) = &self.connection {
            return Ok(ConnectionSource::Existing(Arc::clone(connection)));
        }
        let url = self.usable_url().ok_or_else(|| {
            HandlerBuildError::InvalidConfig("missing AMQP connection".into())
        })?;
        let connector = self
            .connector
            .clone()
            .or_else(Self::default_connector)
            .ok_or_else(|| {
                HandlerBuildError::InvalidConfig(format!(
                    "amqp url '{url}' requires a broker connector"
                ))
            })?;
        Ok(ConnectionSource::Url {
            url: url.to_owned(),
            connector,
        })
    }

    fn build_config(&self) -> Result<AmqpTransportConfig, HandlerBuildError> {
        self.validate()?;
        let mut config = AmqpTransportConfig::new(self.build_connection_source()?);
        config.level = self.parse_level()?;
        self.apply_optional_fields(&mut config);
        Ok(config)
    }

    fn apply_optional_fields(&self, config: &mut AmqpTransportConfig) {
        if let Some(name) = &self.name {
            config.name.clone_from(name);
        }
        if let Some(exchange) = &self.exchange {
            config.exchange.clone_from(exchange);
        }
        if let Some(options) = self.exchange_options {
            config.exchange_options = options;
        }
        if let Some(routing_key) = &self.routing_key {
            config.routing_key.clone_from(routing_key);
        }
        if let Some(interval) = self.warn_interval {
            config.warn_interval = interval;
        }
    }

    fn runtime_handle(&self) -> Result<Handle, HandlerBuildError> {
        match &self.runtime {
            Some(handle) => Ok(handle.clone()),
            None => Handle::try_current().map_err(|_| HandlerBuildError::NoRuntime),
        }
    }
}

impl HandlerBuilderTrait for AmqpTransportBuilder {
    type Handler = AmqpTransport;

    fn build_inner(&self) -> Result<Self::Handler, HandlerBuildError> {
        let config = self.build_config()?;
        let runtime = self.runtime_handle()?;
        Ok(AmqpTransport::with_config(config, runtime))
    }
}

impl fmt::Debug for AmqpTransportBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AmqpTransportBuilder")
            .field("name", &self.name)
            .field("level", &self.level)
            .field("has_connection", &self.connection.is_some())
            .field("url", &self.url)
            .field("exchange", &self.exchange)
            .field("exchange_options", &self.exchange_options)
            .field("routing_key", &self.routing_key)
            .finish()
    }
}
