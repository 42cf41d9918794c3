//! Broker client backed by `lapin`.

use std::sync::Arc;

use async_trait::async_trait;
use lapin::{
    BasicProperties, Channel, Connection, ConnectionProperties,
    options::{BasicPublishOptions, ExchangeDeclareOptions},
    types::FieldTable,
};

use super::broker::{
    BrokerChannel, BrokerConnection, BrokerConnector, BrokerError, ExchangeKind, ExchangeOptions,
    PublishProperties,
};

fn lapin_kind(kind: ExchangeKind) -> lapin::ExchangeKind {
    match kind {
        ExchangeKind::Direct => lapin::ExchangeKind::Direct,
    }
}

/// Opens `lapin` connections from `amqp://` urls.
#[derive(Clone, Default)]
pub struct LapinConnector {
    properties: ConnectionProperties,
}

impl LapinConnector {
    pub fn new(properties: ConnectionProperties) -> Self {
        Self { properties }
    }
}

#[async_trait]
impl BrokerConnector for LapinConnector {
    async fn connect(&self, url: &str) -> Result<Arc<dyn BrokerConnection>, BrokerError> {
        let connection = Connection::connect(url, self.properties.clone())
            .await
            .map_err(|err| BrokerError::Connect {
                url: url.to_owned(),
                reason: err.to_string(),
            })?;
        Ok(Arc::new(LapinConnection::new(connection)))
    }
}

/// Wraps a caller-owned `lapin` connection.
pub struct LapinConnection {
    connection: Connection,
}

impl LapinConnection {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl BrokerConnection for LapinConnection {
    async fn create_channel(&self) -> Result<Arc<dyn BrokerChannel>, BrokerError> {
        let channel = self
            .connection
            .create_channel()
            .await
            .map_err(|err| BrokerError::Channel(err.to_string()))?;
        Ok(Arc::new(LapinChannel { channel }))
    }
}

pub struct LapinChannel {
    channel: Channel,
}

#[async_trait]
impl BrokerChannel for LapinChannel {
    async fn declare_exchange(
        &self,
        name: &str,
        kind: ExchangeKind,
        options: ExchangeOptions,
    ) -> Result<(), BrokerError> {
        let declare = ExchangeDeclareOptions {
            durable: options.durable,
            auto_delete: options.auto_delete,
            ..ExchangeDeclareOptions::default()
        };
        self.channel
            .exchange_declare(name, lapin_kind(kind), declare, FieldTable::default())
            .await
            .map_err(|err| BrokerError::Declare {
                exchange: name.to_owned(),
                reason: err.to_string(),
            })
    }

    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: Vec<u8>,
        properties: &PublishProperties,
    ) -> Result<(), BrokerError> {
        let amqp_properties = BasicProperties::default()
            .with_content_type(properties.content_type.as_str().into())
            .with_content_encoding(properties.content_encoding.as_str().into());
        // The returned confirm is dropped: success means the frame was sent.
        self.channel
            .basic_publish(
                exchange,
                routing_key,
                BasicPublishOptions::default(),
                &payload,
                amqp_properties,
            )
            .await
            .map(drop)
            .map_err(|err| BrokerError::Publish {
                exchange: exchange.to_owned(),
                reason: err.to_string(),
            })
    }
}
