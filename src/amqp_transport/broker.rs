//! Broker client seam.
//!
//! The transport only needs four operations from an AMQP client: open a
//! connection, open a channel, declare an exchange, and publish. Each is an
//! async trait method so the adapter can run against `lapin` in production
//! and an in-memory broker in tests.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures surfaced by a broker client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },
    #[error("failed to open channel: {0}")]
    Channel(String),
    #[error("failed to declare exchange '{exchange}': {reason}")]
    Declare { exchange: String, reason: String },
    #[error("failed to publish to '{exchange}': {reason}")]
    Publish { exchange: String, reason: String },
}

/// Exchange routing strategy. Log envelopes only ever go to a direct
/// exchange keyed by the configured routing key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExchangeKind {
    #[default]
    Direct,
}

impl ExchangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
        }
    }
}

impl fmt::Display for ExchangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durability flags passed verbatim to the exchange declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeOptions {
    pub durable: bool,
    pub auto_delete: bool,
}

impl Default for ExchangeOptions {
    fn default() -> Self {
        Self {
            durable: false,
            auto_delete: true,
        }
    }
}

/// Message properties attached to every publish.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishProperties {
    pub content_type: String,
    pub content_encoding: String,
}

/// Opens connections to a broker address.
#[async_trait]
pub trait BrokerConnector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Arc<dyn BrokerConnection>, BrokerError>;
}

/// An open broker connection.
#[async_trait]
pub trait BrokerConnection: Send + Sync {
    async fn create_channel(&self) -> Result<Arc<dyn BrokerChannel>, BrokerError>;
}

/// A channel on which declarations and publishes are issued.
#[async_trait]
pub trait BrokerChannel: Send + Sync {
    async fn declare_exchange(
        &self,
        name: &str,
        kind: ExchangeKind,
        options: ExchangeOptions,
    ) -> Result<(), BrokerError>;

    /// Issue a publish. Resolves once the message has been handed to the
    /// broker client, not once the broker confirms it.
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: Vec<u8>,
        properties: &PublishProperties,
    ) -> Result<(), BrokerError>;
}
