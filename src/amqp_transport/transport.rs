//! Connection establishment.
//!
//! Obtains a connection, opens a channel on it, and declares the target
//! exchange. Each step awaits the previous one and a failure at any step is
//! final: there is no retry.

use std::sync::Arc;

use thiserror::Error;

use super::broker::{BrokerChannel, BrokerError, ExchangeKind, ExchangeOptions};
use super::config::ConnectionSource;

/// The step at which establishment stopped.
#[derive(Debug, Error)]
pub enum EstablishError {
    #[error("connect: {0}")]
    Connect(#[source] BrokerError),
    #[error("open channel: {0}")]
    Channel(#[source] BrokerError),
    #[error("declare exchange: {0}")]
    Declare(#[source] BrokerError),
}

/// Produce a channel on which `exchange` has been declared as a direct
/// exchange with `options`.
///
/// An [`Existing`](ConnectionSource::Existing) connection is used as-is and no
/// connector is consulted.
pub async fn establish(
    source: &ConnectionSource,
    exchange: &str,
    options: ExchangeOptions,
) -> Result<Arc<dyn BrokerChannel>, EstablishError> {
    let connection = match source {
        ConnectionSource::Existing(connection) => Arc::clone(connection),
        ConnectionSource::Url { url, connector } => connector
            .connect(url)
            .await
            .map_err(EstablishError::Connect)?,
    };
    let channel = connection
        .create_channel()
        .await
        .map_err(EstablishError::Channel)?;
    channel
        .declare_exchange(exchange, ExchangeKind::Direct, options)
        .await
        .map_err(EstablishError::Declare)?;
    Ok(channel)
}
