//! In-memory broker recording every call made by the transport.
//!
//! Channel opening and publishing can be held back to simulate a slow broker,
//! and each step can be made to fail so establishment and publish error paths are
//! reachable without a network.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::amqp_transport::{
    BrokerChannel, BrokerConnection, BrokerConnector, BrokerError, ExchangeKind, ExchangeOptions,
    PublishProperties,
};

/// An exchange declaration observed by the broker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    pub exchange: String,
    pub kind: ExchangeKind,
    pub options: ExchangeOptions,
}

/// A publish observed by the broker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishedMessage {
    pub exchange: String,
    pub routing_key: String,
    pub payload: Vec<u8>,
    pub properties: PublishProperties,
}

#[derive(Debug)]
struct BrokerLog {
    connects: Mutex<Vec<String>>,
    channels_opened: AtomicUsize,
    declarations: Mutex<Vec<Declaration>>,
    published: Mutex<Vec<PublishedMessage>>,
    published_count: watch::Sender<usize>,
    channel_gate: watch::Sender<bool>,
    publish_gate: watch::Sender<bool>,
    fail_connect: AtomicBool,
    fail_channel: AtomicBool,
    fail_declare: AtomicBool,
    publish_fail_marker: Mutex<Option<String>>,
}

/// Cloneable handle to a shared in-memory broker.
#[derive(Clone, Debug)]
pub struct MockBroker {
    log: Arc<BrokerLog>,
}

impl Default for MockBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBroker {
    pub fn new() -> Self {
        let (published_count, _) = watch::channel(0);
        let (channel_gate, _) = watch::channel(true);
        let (publish_gate, _) = watch::channel(true);
        Self {
            log: Arc::new(BrokerLog {
                connects: Mutex::new(Vec::new()),
                channels_opened: AtomicUsize::new(0),
                declarations: Mutex::new(Vec::new()),
                published: Mutex::new(Vec::new()),
                published_count,
                channel_gate,
                publish_gate,
                fail_connect: AtomicBool::new(false),
                fail_channel: AtomicBool::new(false),
                fail_declare: AtomicBool::new(false),
                publish_fail_marker: Mutex::new(None),
            }),
        }
    }

    /// A connection handle as a caller would supply it.
    pub fn connection(&self) -> Arc<dyn BrokerConnection> {
        Arc::new(MockConnection { broker: self.clone() })
    }

    /// A channel that records publishes without going through establishment.
    pub fn channel(&self) -> Arc<dyn BrokerChannel> {
        Arc::new(MockChannel { broker: self.clone() })
    }

    /// The broker as a connector for url-based establishment.
    pub fn connector(&self) -> Arc<dyn BrokerConnector> {
        Arc::new(self.clone())
    }

    /// Block channel opening until [`release_channel`](Self::release_channel).
    pub fn hold_channel(&self) {
        self.log.channel_gate.send_replace(false);
    }

    pub fn release_channel(&self) {
        self.log.channel_gate.send_replace(true);
    }

    /// Block every publish until [`release_publishes`](Self::release_publishes).
    pub fn hold_publishes(&self) {
        self.log.publish_gate.send_replace(false);
    }

    pub fn release_publishes(&self) {
        self.log.publish_gate.send_replace(true);
    }

    pub fn fail_connect(&self) {
        self.log.fail_connect.store(true, Ordering::SeqCst);
    }

    pub fn fail_channel(&self) {
        self.log.fail_channel.store(true, Ordering::SeqCst);
    }

    pub fn fail_declare(&self) {
        self.log.fail_declare.store(true, Ordering::SeqCst);
    }

    /// Reject publishes whose payload contains `marker`.
    pub fn fail_publishes_containing(&self, marker: &str) {
        *self.log.publish_fail_marker.lock() = Some(marker.to_owned());
    }

    pub fn connect_urls(&self) -> Vec<String> {
        self.log.connects.lock().clone()
    }

    pub fn channels_opened(&self) -> usize {
        self.log.channels_opened.load(Ordering::SeqCst)
    }

    pub fn declarations(&self) -> Vec<Declaration> {
        self.log.declarations.lock().clone()
    }

    pub fn published(&self) -> Vec<PublishedMessage> {
        self.log.published.lock().clone()
    }

    /// Wait until at least `count` messages have been accepted.
    pub async fn wait_for_published(&self, count: usize) {
        let mut rx = self.log.published_count.subscribe();
        let _ = rx.wait_for(|seen| *seen >= count).await;
    }
}

#[async_trait]
impl BrokerConnector for MockBroker {
    async fn connect(&self, url: &str) -> Result<Arc<dyn BrokerConnection>, BrokerError> {
        self.log.connects.lock().push(url.to_owned());
        if self.log.fail_connect.load(Ordering::SeqCst) {
            return Err(BrokerError::Connect {
                url: url.to_owned(),
                reason: "connection refused".into(),
            });
        }
        Ok(self.connection())
    }
}

struct MockConnection {
    broker: MockBroker,
}

#[async_trait]
impl BrokerConnection for MockConnection {
    async fn create_channel(&self) -> Result<Arc<dyn BrokerChannel>, BrokerError> {
        let log = &self.broker.log;
        log.channels_opened.fetch_add(1, Ordering::SeqCst);
        let mut gate = log.channel_gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;
        if log.fail_channel.load(Ordering::SeqCst) {
            return Err(BrokerError::Channel("channel limit reached".into()));
        }
        Ok(self.broker.channel())
    }
}

struct MockChannel {
    broker: MockBroker,
}

#[async_trait]
impl BrokerChannel for MockChannel {
    async fn declare_exchange(
        &self,
        name: &str,
        kind: ExchangeKind,
        options: ExchangeOptions,
    ) -> Result<(), BrokerError> {
        let log = &self.broker.log;
        if log.fail_declare.load(Ordering::SeqCst) {
            return Err(BrokerError::Declare {
                exchange: name.to_owned(),
                reason: "precondition failed".into(),
            });
        }
        log.declarations.lock().push(Declaration {
            exchange: name.to_owned(),
            kind,
            options,
        });
        Ok(())
    }

    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: Vec<u8>,
        properties: &PublishProperties,
    ) -> Result<(), BrokerError> {
        let log = &self.broker.log;
        let mut gate = log.publish_gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;
        let rejected = log
            .publish_fail_marker
            .lock()
            .as_deref()
            .is_some_and(|marker| String::from_utf8_lossy(&payload).contains(marker));
        if rejected {
            return Err(BrokerError::Publish {
                exchange: exchange.to_owned(),
                reason: "message rejected".into(),
            });
        }
        let count = {
            let mut published = log.published.lock();
            published.push(PublishedMessage {
                exchange: exchange.to_owned(),
                routing_key: routing_key.to_owned(),
                payload,
                properties: properties.clone(),
            });
            published.len()
        };
        log.published_count.send_replace(count);
        Ok(())
    }
}
