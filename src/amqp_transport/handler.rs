//! Public transport type exported by the crate.

use std::sync::Arc;

use log::{debug, warn};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::{
    runtime::Handle,
    sync::{mpsc, oneshot, watch},
};

use crate::{
    handler::{Ack, LogSink, SinkError},
    level::Level,
    log_record::LogEnvelope,
    rate_limited_warner::RateLimitedWarner,
};

use super::{
    broker::{BrokerChannel, PublishProperties},
    config::AmqpTransportConfig,
    serialise::{publish_properties, serialise_envelope},
    state::{Admission, Outgoing, PublisherState},
    transport::establish,
};

/// Progress of the broker link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkStatus {
    /// Establishment is still running; records are being buffered.
    Connecting,
    /// The channel is ready and the buffered records have been drained.
    Ready,
    /// Establishment failed permanently; records keep buffering.
    Failed(String),
}

impl LinkStatus {
    /// Return `true` once the status can no longer change.
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Connecting)
    }
}

/// Sole owner of the ready channel. Publishes one envelope at a time.
struct Publisher {
    channel: Arc<dyn BrokerChannel>,
    exchange: String,
    routing_key: String,
    properties: PublishProperties,
}

impl Publisher {
    async fn publish(&self, envelope: &LogEnvelope) -> Result<(), SinkError> {
        let payload = serialise_envelope(envelope)?;
        self.channel
            .publish(&self.exchange, &self.routing_key, payload, &self.properties)
            .await
            .map_err(|err| SinkError::Publish(err.to_string()))
    }

    /// Publish forwarded records in outbox order until every sender is gone.
    async fn run(self, mut outbox: mpsc::UnboundedReceiver<Outgoing>) {
        while let Some((envelope, ack)) = outbox.recv().await {
            let result = self.publish(&envelope).await;
            ack(result);
        }
    }
}

struct Shared {
    name: String,
    level: Level,
    exchange: String,
    routing_key: String,
    state: Mutex<PublisherState>,
    status: watch::Sender<LinkStatus>,
    warner: RateLimitedWarner,
}

impl Shared {
    fn publisher(&self, channel: Arc<dyn BrokerChannel>) -> Publisher {
        Publisher {
            channel,
            exchange: self.exchange.clone(),
            routing_key: self.routing_key.clone(),
            properties: publish_properties(),
        }
    }

    /// Flip to `Ready`, returning the captured batch and the outbox reader.
    /// `None` when a channel was already attached.
    fn attach(&self) -> Option<(Vec<LogEnvelope>, mpsc::UnboundedReceiver<Outgoing>)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let drained = self.state.lock().mark_ready(tx)?;
        Some((drained, rx))
    }

    /// Publish the captured batch in arrival order. A failure is counted and
    /// does not stop the rest.
    async fn drain(&self, publisher: &Publisher, drained: Vec<LogEnvelope>) -> usize {
        debug!(
            "AmqpTransport '{}': channel ready, draining {} buffered records",
            self.name,
            drained.len()
        );
        let count = drained.len();
        for envelope in drained {
            if let Err(err) = publisher.publish(&envelope).await {
                self.warner.record_failure();
                self.warner.warn_if_due(|failed| {
                    warn!(
                        "AmqpTransport '{}' failed to publish {failed} buffered records: {err}",
                        self.name
                    );
                });
            }
        }
        self.warner.flush(|failed| {
            warn!(
                "AmqpTransport '{}' failed to publish {failed} buffered records",
                self.name
            );
        });
        count
    }

    async fn run_link(self: Arc<Self>, config: AmqpTransportConfig) {
        let channel =
            match establish(&config.connection, &config.exchange, config.exchange_options).await {
                Ok(channel) => channel,
                Err(err) => {
                    warn!(
                        "AmqpTransport '{}' could not reach exchange '{}'; records will stay buffered: {err}",
                        self.name, config.exchange
                    );
                    self.status.send_replace(LinkStatus::Failed(err.to_string()));
                    return;
                }
            };
        let publisher = self.publisher(channel);
        let Some((drained, outbox)) = self.attach() else {
            self.status.send_replace(LinkStatus::Ready);
            return;
        };
        self.drain(&publisher, drained).await;
        self.status.send_replace(LinkStatus::Ready);
        // The outbox sender lives in `Shared`; releasing it here lets the
        // loop end once the transport is dropped.
        drop(self);
        publisher.run(outbox).await;
    }
}

/// Log sink publishing envelopes to an AMQP exchange.
///
/// Records submitted before the broker channel is ready are buffered and
/// published in arrival order once it is. Afterwards each record joins the
/// same ordered stream, behind any buffered records still being drained.
/// `log` never blocks on the broker and may be called from any thread.
pub struct AmqpTransport {
    shared: Arc<Shared>,
}

impl AmqpTransport {
    /// Construct the transport and start establishing the broker link on
    /// `runtime`.
    pub fn with_config(config: AmqpTransportConfig, runtime: Handle) -> Self {
        let (status, _) = watch::channel(LinkStatus::Connecting);
        let shared = Arc::new(Shared {
            name: config.name.clone(),
            level: config.level,
            exchange: config.exchange.clone(),
            routing_key: config.routing_key.clone(),
            state: Mutex::new(PublisherState::default()),
            status,
            warner: RateLimitedWarner::new(config.warn_interval),
        });
        runtime.spawn(Arc::clone(&shared).run_link(config));
        Self { shared }
    }

    /// Submit a record and wait for its acknowledgement.
    pub async fn submit(
        &self,
        level: Level,
        message: &str,
        meta: Option<Value>,
    ) -> Result<(), SinkError> {
        let (tx, rx) = oneshot::channel();
        self.log(
            level,
            message,
            meta,
            Box::new(move |result| {
                let _ = tx.send(result);
            }),
        );
        rx.await.unwrap_or(Err(SinkError::AckLost))
    }

    /// Snapshot of the records still waiting for a channel.
    pub fn pending(&self) -> Vec<LogEnvelope> {
        self.shared.state.lock().pending().to_vec()
    }

    /// Whether new records bypass the pending queue.
    ///
    /// This turns `true` as soon as the channel is attached, while the
    /// buffered batch may still be draining. [`status`](Self::status) only
    /// reports [`LinkStatus::Ready`] after the drain has finished.
    pub fn is_ready(&self) -> bool {
        self.shared.state.lock().is_ready()
    }

    /// Current progress of the broker link.
    pub fn status(&self) -> LinkStatus {
        self.shared.status.borrow().clone()
    }

    /// Wait until establishment has either drained the buffer or failed.
    pub async fn wait_settled(&self) -> LinkStatus {
        let mut rx = self.shared.status.subscribe();
        match rx.wait_for(LinkStatus::is_settled).await {
            Ok(status) => status.clone(),
            Err(_) => self.status(),
        }
    }

    /// Exchange every envelope is published to.
    pub fn exchange(&self) -> &str {
        &self.shared.exchange
    }

    /// Routing key attached to every publish.
    pub fn routing_key(&self) -> &str {
        &self.shared.routing_key
    }

    /// Attach another channel after establishment. Returns the number of
    /// records drained onto it.
    #[cfg(test)]
    pub(crate) async fn attach_channel(&self, channel: Arc<dyn BrokerChannel>) -> usize {
        let Some((drained, outbox)) = self.shared.attach() else {
            return 0;
        };
        let publisher = self.shared.publisher(channel);
        let count = self.shared.drain(&publisher, drained).await;
        tokio::spawn(publisher.run(outbox));
        count
    }
}

impl LogSink for AmqpTransport {
    fn name(&self) -> &str {
        &self.shared.name
    }

    fn level(&self) -> Level {
        self.shared.level
    }

    fn log(&self, level: Level, message: &str, meta: Option<Value>, ack: Ack) {
        let envelope = LogEnvelope::new(&self.shared.name, level, message, meta);
        let admission = self.shared.state.lock().admit(envelope, ack);
        match admission {
            Admission::Queued(ack) => ack(Ok(())),
            Admission::Forwarded => {}
            Admission::Closed(ack) => ack(Err(SinkError::Closed)),
        }
    }
}

impl std::fmt::Debug for AmqpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AmqpTransport")
            .field("name", &self.shared.name)
            .field("level", &self.shared.level)
            .field("exchange", &self.shared.exchange)
            .field("routing_key", &self.shared.routing_key)
            .field("state", &*self.shared.state.lock())
            .finish()
    }
}
